use std::f64::consts::PI;

use crate::constants::{Degree, Radian, DPI, RADEG};

/// Convert an angle in degrees to radians.
#[inline]
pub fn deg_to_rad(angle: Degree) -> Radian {
    angle * RADEG
}

/// Convert an angle in radians to degrees.
#[inline]
pub fn rad_to_deg(angle: Radian) -> Degree {
    angle / RADEG
}

/// Wrap an angle into `[0, 2π)`.
///
/// Arguments
/// ---------
/// * `angle`: any finite angle in radians
///
/// Return
/// ----------
/// * The equivalent angle in `[0, 2π)`. Non-finite inputs are returned unchanged.
pub fn wrap_to_2pi(angle: Radian) -> Radian {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = angle.rem_euclid(DPI);
    // rem_euclid may round up to exactly 2π for tiny negative inputs
    if wrapped >= DPI {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle into `(-π, π]`.
///
/// Azimuths reported by the reconstruction use this range so that a shower coming
/// from the north does not flip between `0` and `2π`.
pub fn wrap_to_pi(angle: Radian) -> Radian {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = wrap_to_2pi(angle);
    if wrapped > PI {
        wrapped - DPI
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles, in `[0, π]`.
pub fn angular_difference(a: Radian, b: Radian) -> Radian {
    wrap_to_pi(a - b).abs()
}

#[cfg(test)]
mod conversion_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_deg_rad_round_trip() {
        assert_abs_diff_eq!(deg_to_rad(180.0), PI, epsilon = 1e-15);
        assert_abs_diff_eq!(rad_to_deg(deg_to_rad(70.0)), 70.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_to_2pi() {
        assert_abs_diff_eq!(wrap_to_2pi(-PI / 2.0), 1.5 * PI, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_to_2pi(5.0 * PI), PI, epsilon = 1e-12);
        assert_eq!(wrap_to_2pi(0.0), 0.0);
        assert!(wrap_to_2pi(-1e-18) < DPI);
        assert!(wrap_to_2pi(f64::NAN).is_nan());
    }

    #[test]
    fn test_wrap_to_pi() {
        assert_abs_diff_eq!(wrap_to_pi(1.5 * PI), -0.5 * PI, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_to_pi(PI), PI, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_to_pi(-PI), PI, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_to_pi(DPI - 1e-3), -1e-3, epsilon = 1e-12);
    }

    #[test]
    fn test_angular_difference() {
        assert_abs_diff_eq!(angular_difference(0.01, DPI - 0.01), 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(angular_difference(-0.3, 0.2), 0.5, epsilon = 1e-12);
    }
}
