//! Angle helpers for the closed-form orbital updates

use bevy::math::DQuat;
use std::f64::consts::{PI, TAU};

/// Wrap an angle into `[0, 2π)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `2π`, which would
/// break the half-open range; that case folds back to zero.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Smallest absolute difference between two angles on the circle, in `[0, π]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = wrap_angle(a - b);
    if d > PI { TAU - d } else { d }
}

/// Spin about the local +Y axis.
///
/// Spin shares the orbit's handedness: an angle `θ` carries the local +X axis
/// to `(cos θ, 0, sin θ)`, the same direction an orbital angle `θ` places a body.
pub fn spin_rotation(angle: f64) -> DQuat {
    DQuat::from_rotation_y(-angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::DVec3;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_wrap_angle_range() {
        for raw in [-10.0 * TAU, -PI, -1e-18, 0.0, 1e-18, PI, TAU, 7.5 * TAU + 0.25] {
            let w = wrap_angle(raw);
            assert!((0.0..TAU).contains(&w), "{} wrapped to {}", raw, w);
        }
    }

    #[test]
    fn test_wrap_angle_tiny_negative_folds_to_zero() {
        // -1e-18 + 2π rounds to exactly 2π in f64
        assert_eq!(wrap_angle(-1e-18), 0.0);
    }

    #[test]
    fn test_angular_distance_across_zero() {
        assert!((angular_distance(0.1, TAU - 0.1) - 0.2).abs() < EPSILON);
        assert!((angular_distance(PI, 0.0) - PI).abs() < EPSILON);
        assert!(angular_distance(1.0, 1.0 + TAU) < EPSILON);
    }

    #[test]
    fn test_spin_matches_orbit_direction() {
        let angle = 0.7;
        let spun = spin_rotation(angle) * DVec3::X;
        let orbital = DVec3::new(angle.cos(), 0.0, angle.sin());
        assert!((spun - orbital).length() < EPSILON);
    }
}
