/// wireproj core library - cuboid wireframe sampling, motion and projection
///
/// This library provides the host-independent part of the renderer: edge
/// sampling, rotation about a pivot, time-driven motion, user-defined
/// projection formulas, viewport scaling and the animation driver. Hosts
/// supply a drawing surface and a frame scheduler.

pub mod driver;
pub mod formula;
pub mod geometry;
pub mod motion;
pub mod projection;
pub mod scheduler;
pub mod settings;
pub mod surface;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use driver::{AnimationDriver, DriverState, FrameStats, RenderError, RenderSession};
pub use formula::{CompileError, EvalError, Evaluator, Formula, MathEvaluator};
pub use geometry::{Cuboid, GeometryError, Point3D, WireGeometry, EDGES};
pub use motion::{MotionParams, MotionState};
pub use projection::{Channel, ProjectionError, Projector};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler, ScheduleError};
pub use settings::RenderSettings;
pub use surface::{DrawCommand, DrawList, DrawSurface};
pub use transform::{Pivot, RotationState};
pub use viewport::{SurfaceSize, Viewport, ViewportError};
