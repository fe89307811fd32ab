//! # Velocity Command Module
//!
//! Builds the outgoing velocity command for one sample.
//!
//! ## Field Assignments
//!
//! | Field | Source |
//! |-------|--------|
//! | `linear.x` | `axis_linear.x` (autorun: ramp target) |
//! | `linear.y` | `axis_linear.y` |
//! | `linear.z` | `axis_linear.z` |
//! | `angular.x` | `axis_angular.roll` |
//! | `angular.y` | `axis_angular.pitch` |
//! | `angular.z` | `axis_angular.yaw` (autorun: yaw + adjustment yaw, clamped) |
//!
//! Every field is scaled by the active mode's scale table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::autorun::AutorunRamp;
use super::axis::{read_axis, scale_of, Axis};
use super::mode::Mode;
use crate::config::TeleopConfig;
use crate::joy::JoySample;

/// Three-component vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Linear and angular velocity command.
///
/// Angular components are roll (x), pitch (y) and yaw (z).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    /// Checks if every component is zero.
    ///
    /// ```
    /// use teleop_twist::teleop::command::Twist;
    ///
    /// assert!(Twist::default().is_zero());
    /// ```
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Twist::default()
    }
}

/// Builds the command for `mode`, or decides that nothing is sent.
///
/// Enabled modes always produce a command and clear `stop_sent`. Disabled
/// produces the zero command once, sets `stop_sent`, and produces nothing
/// on later disabled samples.
///
/// `ramp` is only advanced in [`Mode::Autorun`].
pub fn build_command(
    sample: &JoySample,
    config: &TeleopConfig,
    mode: Mode,
    ramp: &mut AutorunRamp,
    stop_sent: &mut bool,
) -> Option<Twist> {
    let Some((linear, angular)) = config.scales(mode) else {
        if *stop_sent {
            return None;
        }
        debug!("Sending stop command");
        *stop_sent = true;
        return Some(Twist::default());
    };

    let mut twist = Twist::default();
    let dx = read_axis(sample, &config.axis_linear, linear, Axis::X);
    let yaw = read_axis(sample, &config.axis_angular, angular, Axis::Yaw);

    if mode == Mode::Autorun {
        let yaw_adjust = read_axis(sample, &config.axis_angular_adjustment, angular, Axis::Yaw);
        twist.linear.x = ramp.advance(dx, scale_of(&config.scale_linear_autorun, Axis::X));
        twist.angular.z =
            AutorunRamp::blend_yaw(yaw, yaw_adjust, scale_of(&config.scale_angular_autorun, Axis::Yaw));
    } else {
        twist.linear.x = dx;
        twist.angular.z = yaw;
    }

    twist.linear.y = read_axis(sample, &config.axis_linear, linear, Axis::Y);
    twist.linear.z = read_axis(sample, &config.axis_linear, linear, Axis::Z);
    twist.angular.y = read_axis(sample, &config.axis_angular, angular, Axis::Pitch);
    twist.angular.x = read_axis(sample, &config.axis_angular, angular, Axis::Roll);

    *stop_sent = false;
    Some(twist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teleop::axis::{AxisMap, ScaleMap};

    /// Config with every axis mapped to its own index and distinct scales per mode.
    fn full_config() -> TeleopConfig {
        let mut config = TeleopConfig {
            axis_linear: AxisMap::from([(Axis::X, 0), (Axis::Y, 1), (Axis::Z, 2)]),
            axis_angular: AxisMap::from([(Axis::Yaw, 3), (Axis::Pitch, 4), (Axis::Roll, 5)]),
            axis_angular_adjustment: AxisMap::from([(Axis::Yaw, 6)]),
            ..TeleopConfig::default()
        };
        for (scales, factor) in [
            (&mut config.scale_linear, 1.0),
            (&mut config.scale_linear_turbo, 2.0),
            (&mut config.scale_linear_autorun, 3.0),
        ] {
            *scales = ScaleMap::from([(Axis::X, factor), (Axis::Y, factor), (Axis::Z, factor)]);
        }
        for (scales, factor) in [
            (&mut config.scale_angular, 1.0),
            (&mut config.scale_angular_turbo, 2.0),
            (&mut config.scale_angular_autorun, 3.0),
        ] {
            *scales = ScaleMap::from([(Axis::Yaw, factor), (Axis::Pitch, factor), (Axis::Roll, factor)]);
        }
        config
    }

    fn sample() -> JoySample {
        JoySample::new(vec![0.1, 0.2, 0.3, 0.125, 0.25, 0.5, 0.25], vec![])
    }

    #[test]
    fn test_normal_reads_all_fields() {
        let config = full_config();
        let mut ramp = AutorunRamp::new();
        let mut stop_sent = true;

        let twist = build_command(&sample(), &config, Mode::Normal, &mut ramp, &mut stop_sent).unwrap();

        assert_eq!(twist.linear, Vector3 { x: 0.1, y: 0.2, z: 0.3 });
        assert_eq!(twist.angular, Vector3 { x: 0.5, y: 0.25, z: 0.125 });
        assert!(!stop_sent);
        assert_eq!(ramp.speed_x(), 0.0);
    }

    #[test]
    fn test_turbo_uses_turbo_scales() {
        let config = full_config();
        let mut ramp = AutorunRamp::new();
        let mut stop_sent = false;

        let twist = build_command(&sample(), &config, Mode::Turbo, &mut ramp, &mut stop_sent).unwrap();

        assert_eq!(twist.linear.x, 0.2);
        assert_eq!(twist.angular.z, 0.25);
        assert_eq!(twist.angular.x, 1.0);
    }

    #[test]
    fn test_autorun_ramps_and_blends() {
        let config = full_config();
        let mut ramp = AutorunRamp::new();
        let mut stop_sent = true;

        let twist = build_command(&sample(), &config, Mode::Autorun, &mut ramp, &mut stop_sent).unwrap();

        // 0.1 * 3.0 / 10
        assert!((twist.linear.x - 0.03).abs() < 1e-6);
        // (0.125 + 0.25) * 3.0
        assert!((twist.angular.z - 1.125).abs() < 1e-6);
        assert!((twist.linear.y - 0.6).abs() < 1e-12);
        assert!((twist.angular.x - 1.5).abs() < 1e-12);
        assert!(!stop_sent);
    }

    #[test]
    fn test_autorun_yaw_clamped_to_limit() {
        let config = full_config();
        let mut ramp = AutorunRamp::new();
        let mut stop_sent = false;
        let sample = JoySample::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0], vec![]);

        let twist = build_command(&sample, &config, Mode::Autorun, &mut ramp, &mut stop_sent).unwrap();

        assert_eq!(twist.angular.z, 3.0);
    }

    #[test]
    fn test_disabled_sends_single_stop() {
        let config = full_config();
        let mut ramp = AutorunRamp::new();
        let mut stop_sent = false;

        let first = build_command(&sample(), &config, Mode::Disabled, &mut ramp, &mut stop_sent);
        assert_eq!(first, Some(Twist::default()));
        assert!(stop_sent);

        let second = build_command(&sample(), &config, Mode::Disabled, &mut ramp, &mut stop_sent);
        assert_eq!(second, None);
        assert!(stop_sent);
    }

    #[test]
    fn test_enabled_rearms_stop() {
        let config = full_config();
        let mut ramp = AutorunRamp::new();
        let mut stop_sent = false;

        build_command(&sample(), &config, Mode::Disabled, &mut ramp, &mut stop_sent);
        build_command(&sample(), &config, Mode::Normal, &mut ramp, &mut stop_sent);
        let again = build_command(&sample(), &config, Mode::Disabled, &mut ramp, &mut stop_sent);

        assert!(again.unwrap().is_zero());
    }

    #[test]
    fn test_twist_serializes_as_nested_vectors() {
        let twist = Twist {
            linear: Vector3 { x: 0.5, y: 0.0, z: 0.0 },
            angular: Vector3 { x: 0.0, y: 0.0, z: -1.0 },
        };
        let json = serde_json::to_value(twist).unwrap();
        assert_eq!(json["linear"]["x"], 0.5);
        assert_eq!(json["angular"]["z"], -1.0);
    }
}
