/// Render configuration
use nalgebra::Point3;

use crate::geometry::Point3D;
use crate::motion::MotionParams;
use crate::transform::Pivot;

pub const DEFAULT_FORMULA_X: &str = "\\frac{x}{y}";
pub const DEFAULT_FORMULA_Y: &str = "\\frac{z}{y}";

/// Everything one render invocation reads
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Two opposite corners of the cuboid
    pub corners: (Point3D, Point3D),
    /// Points sampled along each edge, endpoints included
    pub samples: usize,
    /// Field of view in degrees
    pub fov_degrees: f64,
    pub focal_length: f64,
    pub motion: MotionParams,
    pub pivot: Pivot,
    pub formula_x: String,
    pub formula_y: String,
}

impl Default for RenderSettings {
    /// A 2-unit cube centred 4 units along +y, in front of the default
    /// pinhole formulas.
    fn default() -> Self {
        Self {
            corners: (Point3::new(-1.0, 3.0, -1.0), Point3::new(1.0, 5.0, 1.0)),
            samples: 10,
            fov_degrees: 90.0,
            focal_length: 1.0,
            motion: MotionParams::default(),
            pivot: Pivot::CubeCenter,
            formula_x: DEFAULT_FORMULA_X.to_string(),
            formula_y: DEFAULT_FORMULA_Y.to_string(),
        }
    }
}
