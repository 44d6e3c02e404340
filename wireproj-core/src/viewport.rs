/// Mapping from the projection plane to surface pixels
use nalgebra::Point2;
use thiserror::Error;

/// Pixel dimensions of a drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
    #[error("field of view must be strictly between 0 and 180 degrees (got {0})")]
    FieldOfView(f64),
    #[error("focal length must be a positive number (got {0})")]
    FocalLength(f64),
    #[error("surface has no area ({0}x{1})")]
    EmptySurface(u32, u32),
}

/// Linear scale and centering derived from field of view and focal length.
///
/// Computed once when a render starts and held for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub half_width: f64,
    pub half_height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(fov_degrees: f64, focal_length: f64, size: SurfaceSize) -> Result<Self, ViewportError> {
        if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(ViewportError::FieldOfView(fov_degrees));
        }
        if !(focal_length.is_finite() && focal_length > 0.0) {
            return Err(ViewportError::FocalLength(focal_length));
        }
        if size.width == 0 || size.height == 0 {
            return Err(ViewportError::EmptySurface(size.width, size.height));
        }

        let width = f64::from(size.width);
        let height = f64::from(size.height);

        let half_width = focal_length * (fov_degrees.to_radians() / 2.0).tan();
        // aspect ratio follows the surface
        let half_height = half_width * (height / width);

        Ok(Self {
            half_width,
            half_height,
            scale_x: width / (2.0 * half_width),
            scale_y: height / (2.0 * half_height),
            x_offset: width / 2.0,
            y_offset: height / 2.0,
            height,
        })
    }

    /// Convert a projection-plane point to surface pixels (y down).
    pub fn to_surface(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(
            p.x * self.scale_x + self.x_offset,
            self.height - (p.y * self.scale_y + self.y_offset),
        )
    }
}
