//! # Axis Mapping Module
//!
//! Maps logical command axes to input-device axis indices and scale factors.
//!
//! Each mapping group (linear, angular, angular adjustment) is an [`AxisMap`]
//! from logical [`Axis`] to a sample index, with `-1` meaning "not mapped".
//! Each mode (normal, turbo, autorun) has its own [`ScaleMap`] per group.
//!
//! ## Usage
//!
//! ```
//! use teleop_twist::joy::JoySample;
//! use teleop_twist::teleop::axis::{read_axis, Axis, AxisMap, ScaleMap};
//!
//! let axes = AxisMap::from([(Axis::X, 1)]);
//! let scales = ScaleMap::from([(Axis::X, 0.5)]);
//! let sample = JoySample::new(vec![0.0, 0.8], vec![]);
//!
//! assert!((read_axis(&sample, &axes, &scales, Axis::X) - 0.4).abs() < 1e-12);
//! assert_eq!(read_axis(&sample, &axes, &scales, Axis::Yaw), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::joy::JoySample;

/// Index value marking a logical axis or button as not mapped.
pub const UNMAPPED: i64 = -1;

/// Logical command axis.
///
/// Angular axes follow the usual convention: roll about x, pitch about y,
/// yaw about z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Forward/backward.
    X,
    /// Left/right.
    Y,
    /// Up/down.
    Z,
    /// Rotation about z.
    Yaw,
    /// Rotation about y.
    Pitch,
    /// Rotation about x.
    Roll,
}

impl Axis {
    /// Linear axes in field order.
    pub const LINEAR: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Angular axes in the order they are configured.
    pub const ANGULAR: [Axis; 3] = [Axis::Yaw, Axis::Pitch, Axis::Roll];

    /// Returns the configuration key for this axis.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::Yaw => "yaw",
            Axis::Pitch => "pitch",
            Axis::Roll => "roll",
        }
    }

    /// Parses a configuration key.
    ///
    /// ```
    /// use teleop_twist::teleop::axis::Axis;
    ///
    /// assert_eq!(Axis::from_name("yaw"), Some(Axis::Yaw));
    /// assert_eq!(Axis::from_name("w"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            "yaw" => Some(Axis::Yaw),
            "pitch" => Some(Axis::Pitch),
            "roll" => Some(Axis::Roll),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical axis to sample index. Negative indices are unmapped.
pub type AxisMap = BTreeMap<Axis, i64>;

/// Logical axis to scale factor.
pub type ScaleMap = BTreeMap<Axis, f64>;

/// Reads the scaled value of `axis` from `sample`.
///
/// Returns `0.0` when the axis is missing from either map, is unmapped, or
/// the sample is too short to contain the mapped index.
#[must_use]
pub fn read_axis(sample: &JoySample, axes: &AxisMap, scales: &ScaleMap, axis: Axis) -> f64 {
    let Some(&index) = axes.get(&axis) else {
        return 0.0;
    };
    let Some(&scale) = scales.get(&axis) else {
        return 0.0;
    };

    sample.axis(index).map_or(0.0, |value| value * scale)
}

/// Returns the scale for `axis`, or `0.0` when it is not configured.
#[must_use]
pub fn scale_of(scales: &ScaleMap, axis: Axis) -> f64 {
    scales.get(&axis).copied().unwrap_or(0.0)
}
