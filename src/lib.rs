//! # Teleop Twist Library
//!
//! Drive a mobile robot from a gamepad.
//!
//! This library turns joystick samples (axes and buttons) into velocity
//! commands, with an enable-button dead-man switch, a turbo scale set and a
//! ramped autorun cruise mode. Configuration can be changed at runtime
//! through typed parameter updates.

pub mod config;
pub mod error;
pub mod joy;
pub mod node;
pub mod params;
pub mod publish;
pub mod teleop;
