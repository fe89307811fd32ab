//! # Teleop Controller
//!
//! Owns the controller state and runs one transition per input sample:
//!
//! 1. Feed the autorun toggle
//! 2. Reset the ramp whenever autorun is off
//! 3. Resolve the mode
//! 4. Build (or withhold) the command
//!
//! The controller does no I/O. It is handed a configuration snapshot for
//! every sample and returns at most one command.
//!
//! ## Usage
//!
//! ```
//! use teleop_twist::config::TeleopConfig;
//! use teleop_twist::joy::JoySample;
//! use teleop_twist::teleop::axis::Axis;
//! use teleop_twist::teleop::controller::TeleopController;
//!
//! let mut config = TeleopConfig::default();
//! config.axis_linear.insert(Axis::X, 1);
//! config.scale_linear.insert(Axis::X, 0.5);
//!
//! let mut controller = TeleopController::new();
//! let sample = JoySample::new(vec![0.0, 0.8], vec![0, 0, 0, 0, 0, 1]);
//!
//! let twist = controller.process(&sample, &config).unwrap();
//! assert_eq!(twist.linear.x, 0.4);
//! ```

use tracing::{debug, trace};

use super::autorun::AutorunRamp;
use super::command::{build_command, Twist};
use super::mode::{resolve_mode, AutorunToggle, Mode};
use crate::config::TeleopConfig;
use crate::joy::JoySample;

/// Everything the controller remembers between samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    /// Autorun toggle and last raw autorun-button value.
    pub autorun: AutorunToggle,
    /// Forward-speed accumulator for autorun.
    pub ramp: AutorunRamp,
    /// Whether the stop command for the current disabled interval went out.
    pub stop_sent: bool,
}

impl ControllerState {
    /// Returns whether autorun is on.
    #[must_use]
    pub fn autorun_active(&self) -> bool {
        self.autorun.is_active()
    }

    /// Returns the last raw autorun-button value.
    #[must_use]
    pub fn autorun_button_prev(&self) -> i32 {
        self.autorun.previous()
    }

    /// Returns the autorun forward-speed target.
    #[must_use]
    pub fn ramp_speed_x(&self) -> f32 {
        self.ramp.speed_x()
    }

    /// Advances the state by one sample and returns the mode and command.
    pub fn advance(&mut self, sample: &JoySample, config: &TeleopConfig) -> (Mode, Option<Twist>) {
        self.autorun.update(sample, config.enable_autorun_button);

        if !self.autorun.is_active() {
            self.ramp.reset();
        }

        let mode = resolve_mode(self.autorun.is_active(), sample, config);
        let command = build_command(sample, config, mode, &mut self.ramp, &mut self.stop_sent);
        (mode, command)
    }
}

/// Pure transition: `(state, sample, config) -> (state, command)`.
///
/// ```
/// use teleop_twist::config::TeleopConfig;
/// use teleop_twist::joy::JoySample;
/// use teleop_twist::teleop::controller::{transition, ControllerState};
///
/// let config = TeleopConfig::default();
/// let released = JoySample::new(vec![], vec![0; 6]);
///
/// let (state, stop) = transition(ControllerState::default(), &released, &config);
/// assert!(stop.unwrap().is_zero());
///
/// let (_, nothing) = transition(state, &released, &config);
/// assert!(nothing.is_none());
/// ```
#[must_use]
pub fn transition(
    mut state: ControllerState,
    sample: &JoySample,
    config: &TeleopConfig,
) -> (ControllerState, Option<Twist>) {
    let (_, command) = state.advance(sample, config);
    (state, command)
}

/// Sample-driven teleop controller.
///
/// # Thread Safety
///
/// `TeleopController` is not shared. Use from a single task only and feed
/// samples in arrival order.
#[derive(Debug, Default)]
pub struct TeleopController {
    state: ControllerState,
    mode: Mode,
}

impl TeleopController {
    /// Creates a controller in the disabled mode with autorun off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Returns the mode chosen for the last sample.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Processes one sample against a configuration snapshot.
    ///
    /// Returns the command to publish, if any.
    pub fn process(&mut self, sample: &JoySample, config: &TeleopConfig) -> Option<Twist> {
        let (mode, command) = self.state.advance(sample, config);

        if mode != self.mode {
            debug!("Mode {} -> {}", self.mode, mode);
            self.mode = mode;
        }
        trace!(
            "buttons={:?} autorun={} ramp={} stop_sent={}",
            sample.buttons,
            self.state.autorun_active(),
            self.state.ramp_speed_x(),
            self.state.stop_sent
        );

        command
    }

    /// Lets the next disabled sample produce the stop command again.
    ///
    /// Used when the stop command could not be delivered.
    pub fn rearm_stop(&mut self) {
        self.state.stop_sent = false;
    }
}
