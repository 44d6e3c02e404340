/// User-defined projection onto the image plane
use nalgebra::Point2;
use std::fmt;

use crate::formula::{CompileError, EvalError, Evaluator, Formula};
use crate::geometry::Point3D;

/// Variables a projection formula may reference, in binding order
pub const VARIABLES: [&str; 3] = ["x", "y", "z"];

/// Output coordinate a formula produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    X,
    Y,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::X => write!(f, "x"),
            Channel::Y => write!(f, "y"),
        }
    }
}

/// A compile failure tagged with the channel it came from
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("projection formula for {channel} does not compile: {source}")]
pub struct ProjectionError {
    pub channel: Channel,
    #[source]
    pub source: CompileError,
}

/// Maps a 3D point to the projection plane with two compiled formulas
#[derive(Debug)]
pub struct Projector {
    x: Box<dyn Formula>,
    y: Box<dyn Formula>,
}

impl Projector {
    pub fn compile(evaluator: &dyn Evaluator, formula_x: &str, formula_y: &str) -> Result<Self, ProjectionError> {
        let compile = |channel, text| {
            evaluator
                .compile(text, &VARIABLES)
                .map_err(|source| ProjectionError { channel, source })
        };

        Ok(Self {
            x: compile(Channel::X, formula_x)?,
            y: compile(Channel::Y, formula_y)?,
        })
    }

    pub fn project(&self, point: &Point3D) -> Result<Point2<f64>, EvalError> {
        let bindings = [point.x, point.y, point.z];
        Ok(Point2::new(self.x.evaluate(&bindings)?, self.y.evaluate(&bindings)?))
    }

    pub fn sources(&self) -> (&str, &str) {
        (self.x.source(), self.y.source())
    }
}
