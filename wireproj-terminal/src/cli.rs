/// Command line configuration
use clap::{Parser, ValueEnum};
use nalgebra::{Point3, Vector3};
use std::path::PathBuf;
use wireproj_core::settings::{DEFAULT_FORMULA_X, DEFAULT_FORMULA_Y};
use wireproj_core::{MotionParams, Pivot, Point3D, RenderSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PivotArg {
    /// Rotate around the centroid of the cuboid
    CubeCenter,
    /// Rotate around the world origin
    Origin,
}

impl From<PivotArg> for Pivot {
    fn from(arg: PivotArg) -> Self {
        match arg {
            PivotArg::CubeCenter => Pivot::CubeCenter,
            PivotArg::Origin => Pivot::Origin,
        }
    }
}

/// Animated cuboid wireframe projected through user-defined formulas
#[derive(Debug, Parser)]
#[command(name = "wireproj-terminal", version)]
pub struct Cli {
    /// First cuboid corner as x,y,z
    #[arg(long, value_parser = parse_point, default_value = "-1,3,-1", allow_hyphen_values = true)]
    pub from: Point3D,

    /// Opposite cuboid corner as x,y,z
    #[arg(long, value_parser = parse_point, default_value = "1,5,1", allow_hyphen_values = true)]
    pub to: Point3D,

    /// Points sampled along each edge (must be greater than 1)
    #[arg(short = 'n', long, default_value_t = 10)]
    pub samples: usize,

    /// Field of view in degrees
    #[arg(long, default_value_t = 90.0)]
    pub fov: f64,

    /// Distance from the eye to the projection plane
    #[arg(long, default_value_t = 1.0)]
    pub focal_length: f64,

    /// Revolutions per minute around the Y axis
    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    pub rpm_y: f64,

    /// Revolutions per minute around the Z axis
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub rpm_z: f64,

    /// Center of rotation
    #[arg(long, value_enum, default_value_t = PivotArg::CubeCenter)]
    pub pivot: PivotArg,

    /// Oscillation amplitudes along x,y,z
    #[arg(long, value_parser = parse_vector, default_value = "0,0,0", allow_hyphen_values = true)]
    pub osc: Vector3<f64>,

    /// Projection formula for the horizontal axis, over x, y and z
    #[arg(long, default_value = DEFAULT_FORMULA_X, allow_hyphen_values = true)]
    pub proj_x: String,

    /// Projection formula for the vertical axis, over x, y and z
    #[arg(long, default_value = DEFAULT_FORMULA_Y, allow_hyphen_values = true)]
    pub proj_y: String,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            corners: (self.from, self.to),
            samples: self.samples,
            fov_degrees: self.fov,
            focal_length: self.focal_length,
            motion: MotionParams::new(self.rpm_y, self.rpm_z, self.osc),
            pivot: self.pivot.into(),
            formula_x: self.proj_x.clone(),
            formula_y: self.proj_y.clone(),
        }
    }
}

fn parse_triple(s: &str) -> Result<[f64; 3], String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("`{part}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; 3]>::try_from(values).map_err(|v| format!("expected 3 comma-separated numbers, got {}", v.len()))
}

fn parse_point(s: &str) -> Result<Point3D, String> {
    parse_triple(s).map(Point3::from)
}

fn parse_vector(s: &str) -> Result<Vector3<f64>, String> {
    parse_triple(s).map(Vector3::from)
}
