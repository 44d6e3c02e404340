/// Rotation about a configurable pivot
use nalgebra::{Point3, Rotation3, Vector3};

use crate::geometry::{Point3D, WireGeometry};

/// Point the model rotates around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pivot {
    /// Centroid of the cuboid
    #[default]
    CubeCenter,
    /// World origin
    Origin,
}

impl Pivot {
    pub fn resolve(&self, geometry: &WireGeometry) -> Point3D {
        match self {
            Pivot::CubeCenter => geometry.center,
            Pivot::Origin => Point3::origin(),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Pivot::CubeCenter => Pivot::Origin,
            Pivot::Origin => Pivot::CubeCenter,
        }
    }
}

/// Rotation angles around the Y and Z axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub angle_y: f64,
    pub angle_z: f64,
}

impl RotationState {
    pub fn new(angle_y: f64, angle_z: f64) -> Self {
        Self { angle_y, angle_z }
    }

    /// Combined rotation: Y first, then Z.
    pub fn rotation(&self) -> Rotation3<f64> {
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.angle_y);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), self.angle_z);
        rz * ry
    }
}

/// Rotate `point` by `rotation` around `center`.
pub fn rotate_about(point: &Point3D, rotation: &Rotation3<f64>, center: &Point3D) -> Point3D {
    center + rotation * (point - center)
}

/// Rotate `point` by Y then Z angles around `center`.
pub fn rotate(point: &Point3D, angles: RotationState, center: &Point3D) -> Point3D {
    rotate_about(point, &angles.rotation(), center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn assert_close(a: &Point3D, b: &Point3D) {
        assert!(nalgebra::distance(a, b) < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_identity_rotation() {
        let p = Point3::new(1.5, -2.0, 3.25);
        let center = Point3::new(0.5, 0.5, 0.5);
        assert_close(&rotate(&p, RotationState::default(), &center), &p);
    }

    #[test]
    fn test_full_turn_returns_point() {
        let p = Point3::new(1.5, -2.0, 3.25);
        let center = Point3::new(-1.0, 4.0, 2.0);
        assert_close(&rotate(&p, RotationState::new(TAU, 0.0), &center), &p);
        assert_close(&rotate(&p, RotationState::new(0.0, TAU), &center), &p);
    }

    #[test]
    fn test_y_rotation_matches_right_handed_formula() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let theta = 0.7_f64;
        let rotated = rotate(&p, RotationState::new(theta, 0.0), &Point3::origin());
        let expected = Point3::new(
            p.x * theta.cos() + p.z * theta.sin(),
            p.y,
            -p.x * theta.sin() + p.z * theta.cos(),
        );
        assert_close(&rotated, &expected);
    }

    #[test]
    fn test_z_rotation_matches_right_handed_formula() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let phi = -1.3_f64;
        let rotated = rotate(&p, RotationState::new(0.0, phi), &Point3::origin());
        let expected = Point3::new(
            p.x * phi.cos() - p.y * phi.sin(),
            p.x * phi.sin() + p.y * phi.cos(),
            p.z,
        );
        assert_close(&rotated, &expected);
    }

    #[test]
    fn test_y_is_applied_before_z() {
        // Y quarter turn takes +x to -z, which a Z turn leaves alone.
        let p = Point3::new(1.0, 0.0, 0.0);
        let rotated = rotate(&p, RotationState::new(FRAC_PI_2, FRAC_PI_2), &Point3::origin());
        assert_close(&rotated, &Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_rotation_preserves_distance_to_pivot() {
        let center = Point3::new(2.0, -3.0, 0.5);
        let p = Point3::new(7.0, 1.0, -4.0);
        let before = nalgebra::distance(&p, &center);
        for i in 0..16 {
            let angles = RotationState::new(i as f64 * 0.37, PI - i as f64 * 0.61);
            let after = nalgebra::distance(&rotate(&p, angles, &center), &center);
            assert!((before - after).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pivot_point_is_fixed() {
        let center = Point3::new(3.0, 3.0, 3.0);
        assert_close(&rotate(&center, RotationState::new(1.0, 2.0), &center), &center);
    }

    #[test]
    fn test_non_finite_input_propagates() {
        let p = Point3::new(f64::NAN, 0.0, 0.0);
        let rotated = rotate(&p, RotationState::new(0.3, 0.2), &Point3::origin());
        assert!(rotated.x.is_nan());
    }

    #[test]
    fn test_pivot_toggle() {
        assert_eq!(Pivot::CubeCenter.toggled(), Pivot::Origin);
        assert_eq!(Pivot::Origin.toggled(), Pivot::CubeCenter);
    }
}
