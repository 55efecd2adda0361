//! Angle helpers and side-information bucketing for the state encoder.
//!
//! The base station sits at the origin; positions are receiver coordinates
//! in metres and orientations are receiver yaw in radians.

use std::f64::consts::PI;

/// Wrap an angle into `[−π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Convert a global-frame angle into the receiver's local frame.
pub fn local_angle(global: f64, yaw: f64) -> f64 {
    wrap_angle(global - yaw)
}

/// Global direction from the receiver at `position` towards the base station.
pub fn los_angle(position: [f64; 2]) -> f64 {
    (-position[1]).atan2(-position[0])
}

/// Split `[−π, π)` into `buckets` equal sectors and return the yaw's sector.
pub fn discretize_orientation(yaw: f64, buckets: usize) -> usize {
    let fraction = (wrap_angle(yaw) + PI) / (2.0 * PI);
    ((fraction * buckets as f64) as usize).min(buckets.saturating_sub(1))
}

/// Ring index of the receiver's distance to the origin.
///
/// `radius` is the communication radius split into `resolution` rings;
/// anything beyond the radius lands in the outermost ring.
pub fn discretize_distance(position: [f64; 2], radius: f64, resolution: usize) -> usize {
    let distance = position[0].hypot(position[1]);
    let ring = (distance / radius * resolution as f64) as usize;
    ring.min(resolution.saturating_sub(1))
}

/// Sector index of the receiver's polar angle `atan2(y, x)`.
pub fn discretize_polar(position: [f64; 2], resolution: usize) -> usize {
    discretize_orientation(position[1].atan2(position[0]), resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(1.5 * PI) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_angle(2.0 * PI + 0.1) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_local_angle_subtracts_yaw() {
        assert!((local_angle(PI / 2.0, PI / 2.0)).abs() < 1e-12);
        assert!((local_angle(-PI + 0.1, 0.2) - (PI - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_los_points_to_origin() {
        assert!((los_angle([10.0, 0.0]).abs() - PI).abs() < 1e-12);
        assert!((los_angle([0.0, -5.0]) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_buckets() {
        assert_eq!(discretize_orientation(-PI, 8), 0);
        assert_eq!(discretize_orientation(0.0, 8), 4);
        assert_eq!(discretize_orientation(PI - 1e-9, 8), 7);
        assert_eq!(discretize_orientation(PI, 8), 0);
    }

    #[test]
    fn test_distance_rings_clamp() {
        assert_eq!(discretize_distance([0.0, 0.0], 200.0, 4), 0);
        assert_eq!(discretize_distance([60.0, 80.0], 200.0, 4), 2);
        assert_eq!(discretize_distance([500.0, 0.0], 200.0, 4), 3);
    }

    #[test]
    fn test_polar_sectors() {
        assert_eq!(discretize_polar([1.0, 0.0], 4), 2);
        assert_eq!(discretize_polar([0.0, 1.0], 4), 3);
        assert_eq!(discretize_polar([-1.0, -0.1], 4), 0);
    }
}
