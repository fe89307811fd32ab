//! # Joystick Input Module
//!
//! Input samples and the adapters that produce them.
//!
//! This module handles:
//! - The [`JoySample`] snapshot consumed by the teleop controller
//! - Reading samples and parameter updates from a JSON-lines stream
//! - Reading samples from a Linux evdev gamepad

pub mod evdev_source;
pub mod json;

use serde::{Deserialize, Serialize};

/// One snapshot of the input device.
///
/// Axes are normalized floating-point positions, buttons are raw integer
/// states. Both are index-addressed; indices come from the teleop
/// configuration and may point past the end of a short sample.
///
/// # Examples
///
/// ```
/// use teleop_twist::joy::JoySample;
///
/// let sample = JoySample::new(vec![0.0, 0.8], vec![0, 1]);
/// assert_eq!(sample.axis(1), Some(0.8));
/// assert_eq!(sample.axis(2), None);
/// assert!(sample.is_pressed(1));
/// assert!(!sample.is_pressed(-1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoySample {
    /// Axis positions, usually in -1.0..=1.0.
    #[serde(default)]
    pub axes: Vec<f64>,
    /// Button states, 0 = released.
    #[serde(default)]
    pub buttons: Vec<i32>,
}

impl JoySample {
    /// Creates a sample from axis and button vectors.
    #[must_use]
    pub fn new(axes: Vec<f64>, buttons: Vec<i32>) -> Self {
        Self { axes, buttons }
    }

    /// Returns the axis value at `index`, or `None` when the index is
    /// negative or past the end of the sample.
    #[must_use]
    pub fn axis(&self, index: i64) -> Option<f64> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.axes.get(i))
            .copied()
    }

    /// Returns the raw button value at `index`, or `None` when the index is
    /// negative or past the end of the sample.
    #[must_use]
    pub fn button(&self, index: i64) -> Option<i32> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.buttons.get(i))
            .copied()
    }

    /// Checks if the button at `index` exists and is non-zero.
    #[must_use]
    pub fn is_pressed(&self, index: i64) -> bool {
        self.button(index).is_some_and(|value| value != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sample_is_empty() {
        let sample = JoySample::default();
        assert!(sample.axes.is_empty());
        assert!(sample.buttons.is_empty());
        assert_eq!(sample.axis(0), None);
        assert_eq!(sample.button(0), None);
    }

    #[test]
    fn test_axis_bounds() {
        let sample = JoySample::new(vec![0.25, -0.5], vec![]);
        assert_eq!(sample.axis(0), Some(0.25));
        assert_eq!(sample.axis(1), Some(-0.5));
        assert_eq!(sample.axis(2), None);
        assert_eq!(sample.axis(-1), None);
        assert_eq!(sample.axis(i64::MIN), None);
    }

    #[test]
    fn test_button_pressed_is_non_zero() {
        let sample = JoySample::new(vec![], vec![0, 1, 2, -1]);
        assert!(!sample.is_pressed(0));
        assert!(sample.is_pressed(1));
        assert!(sample.is_pressed(2));
        assert!(sample.is_pressed(3));
        assert!(!sample.is_pressed(4));
        assert!(!sample.is_pressed(-1));
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let sample: JoySample = serde_json::from_str(r#"{"axes":[0.5]}"#).unwrap();
        assert_eq!(sample.axes, vec![0.5]);
        assert!(sample.buttons.is_empty());
    }
}
