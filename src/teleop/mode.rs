//! # Mode Selection Module
//!
//! Decides, for every sample, which operating mode drives the command.
//!
//! ## Priority
//!
//! | Priority | Mode | Condition |
//! |----------|------|-----------|
//! | 1 | Autorun | autorun toggled on |
//! | 2 | Turbo | turbo button held |
//! | 3 | Normal | enable button held, or no enable button required |
//! | 4 | Disabled | none of the above |
//!
//! Autorun is the only sticky mode: it flips on each rising edge of its
//! button and stays until the next one. All other modes are re-evaluated
//! from scratch on every sample.

use std::fmt;
use tracing::debug;

use crate::config::TeleopConfig;
use crate::joy::JoySample;

/// Operating mode for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// No command; a single stop is sent on entry.
    #[default]
    Disabled,
    /// Normal scales.
    Normal,
    /// Turbo scales while the turbo button is held.
    Turbo,
    /// Ramped cruise control.
    Autorun,
}

impl Mode {
    /// Modes that can be engaged, highest priority first.
    pub const PRIORITY: [Mode; 3] = [Mode::Autorun, Mode::Turbo, Mode::Normal];

    /// Checks if this mode's engage condition holds for `sample`.
    fn is_engaged(self, autorun_active: bool, sample: &JoySample, config: &TeleopConfig) -> bool {
        match self {
            Mode::Autorun => autorun_active,
            Mode::Turbo => config.enable_turbo_button >= 0 && sample.is_pressed(config.enable_turbo_button),
            Mode::Normal => !config.require_enable_button || sample.is_pressed(config.enable_button),
            Mode::Disabled => false,
        }
    }

    /// Returns `true` for every mode that emits motion commands.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Mode::Disabled
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Disabled => "disabled",
            Mode::Normal => "normal",
            Mode::Turbo => "turbo",
            Mode::Autorun => "autorun",
        };
        f.write_str(name)
    }
}

/// Resolves the mode for one sample by walking [`Mode::PRIORITY`].
///
/// # Examples
///
/// ```
/// use teleop_twist::config::TeleopConfig;
/// use teleop_twist::joy::JoySample;
/// use teleop_twist::teleop::mode::{resolve_mode, Mode};
///
/// let config = TeleopConfig::default(); // enable button 5
/// let held = JoySample::new(vec![], vec![0, 0, 0, 0, 0, 1]);
/// let released = JoySample::new(vec![], vec![0; 6]);
///
/// assert_eq!(resolve_mode(false, &held, &config), Mode::Normal);
/// assert_eq!(resolve_mode(false, &released, &config), Mode::Disabled);
/// assert_eq!(resolve_mode(true, &released, &config), Mode::Autorun);
/// ```
#[must_use]
pub fn resolve_mode(autorun_active: bool, sample: &JoySample, config: &TeleopConfig) -> Mode {
    Mode::PRIORITY
        .into_iter()
        .find(|mode| mode.is_engaged(autorun_active, sample, config))
        .unwrap_or(Mode::Disabled)
}

/// Edge detector for the autorun toggle button.
///
/// Any increase of the raw button value flips the toggle, which also covers
/// analog inputs used as buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutorunToggle {
    active: bool,
    previous: i32,
}

impl AutorunToggle {
    /// Creates an inactive toggle with a released previous value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether autorun is currently on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the last raw button value observed.
    #[must_use]
    pub fn previous(&self) -> i32 {
        self.previous
    }

    /// Feeds one sample. Returns `true` when the toggle flipped.
    ///
    /// Nothing happens when `button` is unused (negative) or missing from
    /// the sample.
    ///
    /// ```
    /// use teleop_twist::joy::JoySample;
    /// use teleop_twist::teleop::mode::AutorunToggle;
    ///
    /// let mut toggle = AutorunToggle::new();
    /// assert!(toggle.update(&JoySample::new(vec![], vec![1]), 0));
    /// assert!(!toggle.update(&JoySample::new(vec![], vec![1]), 0));
    /// assert!(!toggle.update(&JoySample::new(vec![], vec![0]), 0));
    /// assert!(toggle.is_active());
    /// ```
    pub fn update(&mut self, sample: &JoySample, button: i64) -> bool {
        if button < 0 {
            return false;
        }
        let Some(value) = sample.button(button) else {
            return false;
        };

        let rising = i64::from(value) - i64::from(self.previous) > 0;
        if rising {
            self.active = !self.active;
            debug!("Autorun {}", if self.active { "engaged" } else { "released" });
        }
        self.previous = value;
        rising
    }
}
