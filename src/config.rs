//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! The `[teleop]` section holds the controller parameters that can later be
//! changed at runtime through [`crate::params::ParameterStore`]. The other
//! sections configure the process around the controller.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::{Result, TeleopError};
use crate::teleop::axis::{scale_of, Axis, AxisMap, ScaleMap, UNMAPPED};
use crate::teleop::mode::Mode;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub teleop: TeleopConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller parameters: buttons, axis mappings and per-mode scales.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TeleopConfig {
    #[serde(default = "default_require_enable_button")]
    pub require_enable_button: bool,

    #[serde(default = "default_enable_button")]
    pub enable_button: i64,

    #[serde(default = "default_unused_button")]
    pub enable_turbo_button: i64,

    #[serde(default = "default_unused_button")]
    pub enable_autorun_button: i64,

    #[serde(default = "default_axis_linear")]
    pub axis_linear: AxisMap,

    #[serde(default = "default_axis_angular")]
    pub axis_angular: AxisMap,

    #[serde(default = "default_axis_angular_adjustment")]
    pub axis_angular_adjustment: AxisMap,

    #[serde(default = "default_scale_linear")]
    pub scale_linear: ScaleMap,

    #[serde(default = "default_scale_linear_turbo")]
    pub scale_linear_turbo: ScaleMap,

    #[serde(default = "default_scale_linear_autorun")]
    pub scale_linear_autorun: ScaleMap,

    #[serde(default = "default_scale_angular")]
    pub scale_angular: ScaleMap,

    #[serde(default = "default_scale_angular_turbo")]
    pub scale_angular_turbo: ScaleMap,

    #[serde(default = "default_scale_angular_autorun")]
    pub scale_angular_autorun: ScaleMap,
}

/// Where input samples come from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// JSON lines on standard input.
    #[default]
    Stdin,
    /// A Linux evdev gamepad.
    Evdev,
}

/// Input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default)]
    pub source: InputSource,

    /// Empty means auto-detect.
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_axis_min")]
    pub axis_min: i32,

    #[serde(default = "default_axis_max")]
    pub axis_max: i32,

    /// Sample axis indices whose sign is flipped.
    #[serde(default)]
    pub reverse_axes: Vec<usize>,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_stamp")]
    pub stamp: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_require_enable_button() -> bool { true }
fn default_enable_button() -> i64 { 5 }
fn default_unused_button() -> i64 { UNMAPPED }

fn default_axis_linear() -> AxisMap {
    AxisMap::from([(Axis::X, 5), (Axis::Y, UNMAPPED), (Axis::Z, UNMAPPED)])
}
fn default_axis_angular() -> AxisMap {
    AxisMap::from([(Axis::Yaw, 2), (Axis::Pitch, UNMAPPED), (Axis::Roll, UNMAPPED)])
}
fn default_axis_angular_adjustment() -> AxisMap {
    AxisMap::from([(Axis::Yaw, 3), (Axis::Pitch, UNMAPPED), (Axis::Roll, UNMAPPED)])
}

fn default_scale_linear() -> ScaleMap {
    ScaleMap::from([(Axis::X, 0.5), (Axis::Y, 0.0), (Axis::Z, 0.0)])
}
fn default_scale_linear_turbo() -> ScaleMap {
    ScaleMap::from([(Axis::X, 1.0), (Axis::Y, 0.0), (Axis::Z, 0.0)])
}
fn default_scale_linear_autorun() -> ScaleMap {
    ScaleMap::from([(Axis::X, 1.0), (Axis::Y, 0.0), (Axis::Z, 0.0)])
}
fn default_scale_angular() -> ScaleMap {
    ScaleMap::from([(Axis::Yaw, 0.5), (Axis::Pitch, 0.0), (Axis::Roll, 0.0)])
}
fn default_scale_angular_turbo() -> ScaleMap {
    ScaleMap::from([(Axis::Yaw, 1.0), (Axis::Pitch, 0.0), (Axis::Roll, 0.0)])
}
fn default_scale_angular_autorun() -> ScaleMap {
    ScaleMap::from([(Axis::Yaw, 1.0), (Axis::Pitch, 0.0), (Axis::Roll, 0.0)])
}

fn default_axis_min() -> i32 { 0 }
fn default_axis_max() -> i32 { 255 }

fn default_stamp() -> bool { true }

fn default_log_level() -> String { "info".to_string() }

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            require_enable_button: default_require_enable_button(),
            enable_button: default_enable_button(),
            enable_turbo_button: default_unused_button(),
            enable_autorun_button: default_unused_button(),
            axis_linear: default_axis_linear(),
            axis_angular: default_axis_angular(),
            axis_angular_adjustment: default_axis_angular_adjustment(),
            scale_linear: default_scale_linear(),
            scale_linear_turbo: default_scale_linear_turbo(),
            scale_linear_autorun: default_scale_linear_autorun(),
            scale_angular: default_scale_angular(),
            scale_angular_turbo: default_scale_angular_turbo(),
            scale_angular_autorun: default_scale_angular_autorun(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: InputSource::default(),
            device_path: String::new(),
            axis_min: default_axis_min(),
            axis_max: default_axis_max(),
            reverse_axes: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { stamp: default_stamp() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn config_error(msg: impl std::fmt::Display) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(msg))
}

/// Adds every default entry the provided map lacks.
fn fill_missing<V: Copy>(map: &mut std::collections::BTreeMap<Axis, V>, defaults: std::collections::BTreeMap<Axis, V>) {
    for (axis, value) in defaults {
        map.entry(axis).or_insert(value);
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use teleop_twist::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// Keys missing from a provided axis or scale table keep their defaults.
    ///
    /// ```
    /// use teleop_twist::config::Config;
    /// use teleop_twist::teleop::axis::Axis;
    ///
    /// let config = Config::from_toml_str("[teleop.axis_linear]\nx = 1\n")?;
    /// assert_eq!(config.teleop.axis_linear[&Axis::X], 1);
    /// assert_eq!(config.teleop.axis_linear[&Axis::Y], -1);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.teleop.fill_missing_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        self.teleop.validate()?;

        if self.input.axis_min >= self.input.axis_max {
            return Err(config_error("axis_min must be less than axis_max"));
        }

        if self.input.source == InputSource::Stdin && !self.input.device_path.is_empty() {
            return Err(config_error("device_path is only used with source = \"evdev\""));
        }

        if tracing::Level::from_str(&self.logging.level).is_err() {
            return Err(config_error(format!(
                "log level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }
}

impl TeleopConfig {
    /// Adds default entries for every axis the configured maps leave out.
    pub fn fill_missing_defaults(&mut self) {
        fill_missing(&mut self.axis_linear, default_axis_linear());
        fill_missing(&mut self.axis_angular, default_axis_angular());
        fill_missing(&mut self.axis_angular_adjustment, default_axis_angular_adjustment());
        fill_missing(&mut self.scale_linear, default_scale_linear());
        fill_missing(&mut self.scale_linear_turbo, default_scale_linear_turbo());
        fill_missing(&mut self.scale_linear_autorun, default_scale_linear_autorun());
        fill_missing(&mut self.scale_angular, default_scale_angular());
        fill_missing(&mut self.scale_angular_turbo, default_scale_angular_turbo());
        fill_missing(&mut self.scale_angular_autorun, default_scale_angular_autorun());
    }

    /// Returns the (linear, angular) scale tables used in `mode`.
    ///
    /// [`Mode::Disabled`] has no scales.
    #[must_use]
    pub fn scales(&self, mode: Mode) -> Option<(&ScaleMap, &ScaleMap)> {
        match mode {
            Mode::Disabled => None,
            Mode::Normal => Some((&self.scale_linear, &self.scale_angular)),
            Mode::Turbo => Some((&self.scale_linear_turbo, &self.scale_angular_turbo)),
            Mode::Autorun => Some((&self.scale_linear_autorun, &self.scale_angular_autorun)),
        }
    }

    /// Logs which buttons and axes are active.
    pub fn log_summary(&self) {
        if self.require_enable_button {
            info!("Teleop enable button {}.", self.enable_button);
        }
        if self.enable_turbo_button >= 0 {
            info!("Turbo on button {}.", self.enable_turbo_button);
        }
        if self.enable_autorun_button >= 0 {
            info!("Autorun toggled by button {}.", self.enable_autorun_button);
        }

        for (axis, &index) in &self.axis_linear {
            if index == UNMAPPED {
                continue;
            }
            info!("Linear axis {} on {} at scale {}.", axis, index, scale_of(&self.scale_linear, *axis));
            if self.enable_turbo_button >= 0 {
                info!("Turbo for linear axis {} is scale {}.", axis, scale_of(&self.scale_linear_turbo, *axis));
            }
        }

        for (axis, &index) in &self.axis_angular {
            if index == UNMAPPED {
                continue;
            }
            info!("Angular axis {} on {} at scale {}.", axis, index, scale_of(&self.scale_angular, *axis));
            if self.enable_turbo_button >= 0 {
                info!("Turbo for angular axis {} is scale {}.", axis, scale_of(&self.scale_angular_turbo, *axis));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("enable_button", self.enable_button),
            ("enable_turbo_button", self.enable_turbo_button),
            ("enable_autorun_button", self.enable_autorun_button),
        ] {
            if value < UNMAPPED {
                return Err(config_error(format!("{} must be -1 (unused) or a button index", name)));
            }
        }

        if self.require_enable_button && self.enable_button < 0 {
            return Err(config_error("enable_button must be set when require_enable_button is true"));
        }

        for (group, map) in [
            ("axis_linear", &self.axis_linear),
            ("axis_angular", &self.axis_angular),
            ("axis_angular_adjustment", &self.axis_angular_adjustment),
        ] {
            for (axis, &index) in map {
                if index < UNMAPPED {
                    return Err(config_error(format!(
                        "{}.{} must be -1 (unmapped) or an axis index",
                        group, axis
                    )));
                }
            }
        }

        for (group, map) in [
            ("scale_linear", &self.scale_linear),
            ("scale_linear_turbo", &self.scale_linear_turbo),
            ("scale_linear_autorun", &self.scale_linear_autorun),
            ("scale_angular", &self.scale_angular),
            ("scale_angular_turbo", &self.scale_angular_turbo),
            ("scale_angular_autorun", &self.scale_angular_autorun),
        ] {
            for (axis, scale) in map {
                if !scale.is_finite() {
                    return Err(config_error(format!("{}.{} must be a finite number", group, axis)));
                }
            }
        }

        Ok(())
    }
}
