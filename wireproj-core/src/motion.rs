/// Time-driven rotation and oscillation
use nalgebra::{Rotation3, Vector3};
use std::f64::consts::TAU;

use crate::geometry::Point3D;
use crate::transform::{rotate_about, RotationState};

/// Oscillation frequency shared by all three axes, in Hz
pub const OSCILLATION_HZ: f64 = 0.5;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Configured rotation speeds and oscillation amplitudes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Revolutions per minute around the Y axis (signed)
    pub rpm_y: f64,
    /// Revolutions per minute around the Z axis (signed)
    pub rpm_z: f64,
    /// Oscillation amplitude along each axis
    pub amplitude: Vector3<f64>,
}

impl MotionParams {
    pub fn new(rpm_y: f64, rpm_z: f64, amplitude: Vector3<f64>) -> Self {
        Self { rpm_y, rpm_z, amplitude }
    }

    /// Motion state after `elapsed_ms` milliseconds of animation.
    ///
    /// A pure function of its inputs, so replaying a timestamp reproduces
    /// the frame exactly.
    pub fn state_at(&self, elapsed_ms: f64) -> MotionState {
        let per_ms = TAU / MS_PER_MINUTE;
        let wave = (TAU * OSCILLATION_HZ * (elapsed_ms / 1000.0)).sin();

        MotionState {
            angles: RotationState::new(self.rpm_y * per_ms * elapsed_ms, self.rpm_z * per_ms * elapsed_ms),
            offset: self.amplitude * wave,
        }
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::new(10.0, 0.0, Vector3::zeros())
    }
}

/// Rotation angles and oscillation offset for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub angles: RotationState,
    pub offset: Vector3<f64>,
}

impl MotionState {
    pub fn pose(&self, center: Point3D) -> Pose {
        Pose {
            rotation: self.angles.rotation(),
            offset: self.offset,
            center,
        }
    }
}

/// A frame's motion resolved against a pivot, ready to apply to many points
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    rotation: Rotation3<f64>,
    offset: Vector3<f64>,
    center: Point3D,
}

impl Pose {
    /// Shift by the oscillation offset, then rotate about the pivot.
    pub fn apply(&self, point: &Point3D) -> Point3D {
        rotate_about(&(point + self.offset), &self.rotation, &self.center)
    }
}
