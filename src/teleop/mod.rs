//! # Teleop Module
//!
//! Joystick samples to velocity commands.
//!
//! This module handles:
//! - Reading scaled axis values through configurable mappings
//! - Choosing the operating mode (autorun > turbo > normal > disabled)
//! - Ramping the autorun cruise speed and clamping its limits
//! - Building the velocity command and the single stop command
//!
//! Everything here is synchronous and free of I/O.

pub mod autorun;
pub mod axis;
pub mod command;
pub mod controller;
pub mod mode;

pub use command::{Twist, Vector3};
pub use controller::{transition, ControllerState, TeleopController};
pub use mode::Mode;
