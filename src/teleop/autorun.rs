//! # Autorun Ramp Module
//!
//! Cruise-control style forward speed for autorun mode.
//!
//! While autorun is on, the forward axis does not set the speed directly:
//! each sample adds a tenth of the scaled forward input to a persistent
//! target, which is clamped to the autorun forward limit. Yaw stays
//! instantaneous: the primary and adjustment yaw inputs are summed and
//! clamped to the autorun yaw limit.
//!
//! The accumulator is single precision, so ten increments of `0.1` overshoot
//! `1.0` slightly and land on the limit exactly.

/// Divisor applied to the forward input before it is accumulated.
pub const RAMP_DIVISOR: f32 = 10.0;

/// Clamps `value` to `[-|limit|, +|limit|]` without panicking on NaN.
fn clamp_symmetric(value: f32, limit: f32) -> f32 {
    let limit = limit.abs();
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

/// Integrated forward-speed target.
///
/// # Examples
///
/// ```
/// use teleop_twist::teleop::autorun::AutorunRamp;
///
/// let mut ramp = AutorunRamp::new();
/// for _ in 0..10 {
///     ramp.advance(1.0, 1.0);
/// }
/// assert_eq!(ramp.speed_x(), 1.0);
///
/// ramp.reset();
/// assert_eq!(ramp.speed_x(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutorunRamp {
    speed_x: f32,
}

impl AutorunRamp {
    /// Creates a ramp at rest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current forward-speed target.
    #[must_use]
    pub fn speed_x(&self) -> f32 {
        self.speed_x
    }

    /// Drops the target back to zero.
    pub fn reset(&mut self) {
        self.speed_x = 0.0;
    }

    /// Accumulates `dx / 10` and clamps to `±x_limit`.
    ///
    /// Returns the new forward-speed target.
    pub fn advance(&mut self, dx: f64, x_limit: f64) -> f64 {
        let limit = x_limit as f32;
        self.speed_x += dx as f32 / RAMP_DIVISOR;
        self.speed_x = clamp_symmetric(self.speed_x, limit);
        f64::from(self.speed_x)
    }

    /// Sums the two yaw sources and clamps the result to `±yaw_limit`.
    ///
    /// ```
    /// use teleop_twist::teleop::autorun::AutorunRamp;
    ///
    /// assert_eq!(AutorunRamp::blend_yaw(0.75, 0.5, 1.0), 1.0);
    /// assert_eq!(AutorunRamp::blend_yaw(-0.75, -0.5, 1.0), -1.0);
    /// assert_eq!(AutorunRamp::blend_yaw(0.25, 0.5, 1.0), 0.75);
    /// ```
    #[must_use]
    pub fn blend_yaw(yaw_primary: f64, yaw_adjust: f64, yaw_limit: f64) -> f64 {
        let limit = yaw_limit as f32;
        let sum = yaw_primary as f32 + yaw_adjust as f32;
        f64::from(clamp_symmetric(sum, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_new_ramp_is_at_rest() {
        assert_eq!(AutorunRamp::new().speed_x(), 0.0);
    }

    #[test]
    fn test_advance_integrates_tenth() {
        let mut ramp = AutorunRamp::new();
        assert!(approx_eq(ramp.advance(0.5, 1.0), 0.05));
        assert!(approx_eq(ramp.advance(0.5, 1.0), 0.10));
        assert!(approx_eq(ramp.advance(-1.0, 1.0), 0.0));
    }

    #[test]
    fn test_constant_input_bound() {
        for (d, limit) in [(0.3, 1.0), (1.0, 0.5), (-0.4, 1.0), (-1.0, 0.6), (2.0, 2.0)] {
            let mut ramp = AutorunRamp::new();
            for n in 1..=40 {
                let speed = ramp.advance(d, limit);
                let expected = (n as f64 * d / 10.0).clamp(-limit, limit);
                assert!(
                    (speed - expected).abs() < 1e-5,
                    "d={} limit={} n={} speed={} expected={}",
                    d, limit, n, speed, expected
                );
            }
        }
    }

    #[test]
    fn test_reaches_limit_exactly_on_tenth_sample() {
        let mut ramp = AutorunRamp::new();
        for _ in 0..9 {
            ramp.advance(1.0, 1.0);
        }
        assert!(ramp.speed_x() < 1.0);
        assert_eq!(ramp.advance(1.0, 1.0), 1.0);
        assert_eq!(ramp.advance(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_negative_limit_reached_exactly() {
        let mut ramp = AutorunRamp::new();
        for _ in 0..10 {
            ramp.advance(-1.0, 1.0);
        }
        assert_eq!(ramp.speed_x(), -1.0);
    }

    #[test]
    fn test_shrinking_limit_clamps_existing_target() {
        let mut ramp = AutorunRamp::new();
        for _ in 0..10 {
            ramp.advance(1.0, 1.0);
        }
        assert!(approx_eq(ramp.advance(0.0, 0.25), 0.25));
    }

    #[test]
    fn test_zero_limit_pins_target() {
        let mut ramp = AutorunRamp::new();
        assert_eq!(ramp.advance(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_negative_limit_is_symmetric() {
        let mut ramp = AutorunRamp::new();
        for _ in 0..20 {
            ramp.advance(1.0, -0.5);
        }
        assert_eq!(ramp.speed_x(), 0.5);
    }

    #[test]
    fn test_nan_limit_does_not_panic() {
        let mut ramp = AutorunRamp::new();
        let speed = ramp.advance(1.0, f64::NAN);
        assert!(approx_eq(speed, 0.1));
    }

    #[test]
    fn test_yaw_clamped_both_ways() {
        assert_eq!(AutorunRamp::blend_yaw(0.8, 0.8, 1.0), 1.0);
        assert_eq!(AutorunRamp::blend_yaw(-0.8, -0.8, 1.0), -1.0);
        assert_eq!(AutorunRamp::blend_yaw(2.0, 0.0, 1.5), 1.5);
    }

    #[test]
    fn test_yaw_within_limit_is_sum() {
        assert!(approx_eq(AutorunRamp::blend_yaw(0.3, -0.1, 1.0), 0.2));
        assert!(approx_eq(AutorunRamp::blend_yaw(0.0, 0.4, 1.0), 0.4));
    }

    #[test]
    fn test_reset() {
        let mut ramp = AutorunRamp::new();
        ramp.advance(1.0, 1.0);
        ramp.reset();
        assert_eq!(ramp, AutorunRamp::new());
    }
}
