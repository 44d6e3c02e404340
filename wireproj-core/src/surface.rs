/// Drawing surface abstraction
use nalgebra::Point2;

/// A 2D surface the animation draws on, in pixel coordinates (y down)
pub trait DrawSurface {
    /// Erase the whole surface.
    fn clear(&mut self);

    /// Stroke a straight line.
    fn line(&mut self, from: Point2<f64>, to: Point2<f64>);

    /// Fill a circle.
    fn circle(&mut self, center: Point2<f64>, radius: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Line { from: Point2<f64>, to: Point2<f64> },
    Circle { center: Point2<f64>, radius: f64 },
}

/// A surface that records every call, in order
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands issued since the most recent `clear`.
    pub fn last_frame(&self) -> &[DrawCommand] {
        match self.commands.iter().rposition(|c| *c == DrawCommand::Clear) {
            Some(start) => &self.commands[start + 1..],
            None => &self.commands,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        self.last_frame().iter().filter_map(|c| match c {
            DrawCommand::Line { from, to } => Some((*from, *to)),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.last_frame().iter().filter_map(|c| match c {
            DrawCommand::Circle { center, .. } => Some(*center),
            _ => None,
        })
    }
}

impl DrawSurface for DrawList {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>) {
        self.commands.push(DrawCommand::Line { from, to });
    }

    fn circle(&mut self, center: Point2<f64>, radius: f64) {
        self.commands.push(DrawCommand::Circle { center, radius });
    }
}
