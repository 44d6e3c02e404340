/// Animation driver: owns the render session and the frame loop
use log::{debug, error, info, warn};
use nalgebra::Point2;
use thiserror::Error;

use crate::formula::{Evaluator, MathEvaluator};
use crate::geometry::{GeometryError, Point3D, WireGeometry};
use crate::motion::MotionParams;
use crate::projection::{ProjectionError, Projector};
use crate::scheduler::{FrameHandle, FrameScheduler, ScheduleError};
use crate::settings::RenderSettings;
use crate::surface::DrawSurface;
use crate::viewport::{SurfaceSize, Viewport, ViewportError};

/// Radius of a sampled point on the surface, in pixels
pub const POINT_RADIUS: f64 = 3.0;

/// Why a render could not start
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("invalid view: {0}")]
    Viewport(#[from] ViewportError),
    #[error(transparent)]
    Formula(#[from] ProjectionError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

/// What one frame drew
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub elapsed_ms: f64,
    pub edges_drawn: usize,
    pub edges_skipped: usize,
    pub points_drawn: usize,
    pub point_failures: usize,
}

/// State built by one successful render and read by every frame after it
#[derive(Debug)]
pub struct RenderSession {
    geometry: WireGeometry,
    pivot: Point3D,
    viewport: Viewport,
    projector: Projector,
    motion: MotionParams,
    origin_ms: Option<f64>,
}

impl RenderSession {
    /// Validate settings and build the session. Nothing outside the
    /// returned value is touched, so a failure leaves the caller as it was.
    pub fn new(settings: &RenderSettings, size: SurfaceSize, evaluator: &dyn Evaluator) -> Result<Self, RenderError> {
        let (a, b) = settings.corners;
        let geometry = WireGeometry::new(a, b, settings.samples)?;
        let viewport = Viewport::new(settings.fov_degrees, settings.focal_length, size)?;
        let projector = Projector::compile(evaluator, &settings.formula_x, &settings.formula_y)?;

        Ok(Self {
            pivot: settings.pivot.resolve(&geometry),
            geometry,
            viewport,
            projector,
            motion: settings.motion,
            origin_ms: None,
        })
    }

    pub fn geometry(&self) -> &WireGeometry {
        &self.geometry
    }

    /// The formulas this session was compiled from, which may differ from
    /// the caller's settings after a failed re-render.
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn motion(&self) -> MotionParams {
        self.motion
    }

    fn draw(&mut self, timestamp_ms: f64, radius: f64, surface: &mut dyn DrawSurface) -> FrameStats {
        let origin = *self.origin_ms.get_or_insert(timestamp_ms);
        let elapsed_ms = timestamp_ms - origin;
        let pose = self.motion.state_at(elapsed_ms).pose(self.pivot);
        let mut stats = FrameStats {
            elapsed_ms,
            ..FrameStats::default()
        };

        surface.clear();

        for (start, end) in self.geometry.edges() {
            let projected = self
                .projector
                .project(&pose.apply(&start))
                .and_then(|a| Ok((a, self.projector.project(&pose.apply(&end))?)));
            match projected {
                Ok((a, b)) => {
                    surface.line(self.viewport.to_surface(a), self.viewport.to_surface(b));
                    stats.edges_drawn += 1;
                }
                Err(e) => {
                    debug!("skipping edge {start} -> {end}: {e}");
                    stats.edges_skipped += 1;
                }
            }
        }

        for point in &self.geometry.points {
            let projected = match self.projector.project(&pose.apply(point)) {
                Ok(p) => p,
                Err(e) => {
                    debug!("point {point} failed to project: {e}");
                    stats.point_failures += 1;
                    Point2::origin()
                }
            };
            surface.circle(self.viewport.to_surface(projected), radius);
            stats.points_drawn += 1;
        }

        if stats.point_failures > 0 || stats.edges_skipped > 0 {
            warn!(
                "frame at {:.0} ms: {} of {} points failed to project, {} edges skipped",
                elapsed_ms, stats.point_failures, stats.points_drawn, stats.edges_skipped
            );
        }

        stats
    }
}

/// Runs the render-start / frame / cancel lifecycle.
///
/// At most one frame request is outstanding at any time. A new render
/// validates everything first and only then cancels the running loop, so a
/// bad formula or bad geometry leaves the previous animation untouched.
pub struct AnimationDriver<S: FrameScheduler, E: Evaluator = MathEvaluator> {
    scheduler: S,
    evaluator: E,
    session: Option<RenderSession>,
    pending: Option<FrameHandle>,
    point_radius: f64,
}

impl<S: FrameScheduler> AnimationDriver<S> {
    pub fn new(scheduler: S) -> Self {
        Self::with_evaluator(scheduler, MathEvaluator)
    }
}

impl<S: FrameScheduler, E: Evaluator> AnimationDriver<S, E> {
    pub fn with_evaluator(scheduler: S, evaluator: E) -> Self {
        Self {
            scheduler,
            evaluator,
            session: None,
            pending: None,
            point_radius: POINT_RADIUS,
        }
    }

    pub fn with_point_radius(mut self, radius: f64) -> Self {
        self.point_radius = radius;
        self
    }

    pub fn state(&self) -> DriverState {
        if self.pending.is_some() {
            DriverState::Running
        } else {
            DriverState::Idle
        }
    }

    pub fn session(&self) -> Option<&RenderSession> {
        self.session.as_ref()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Start a fresh animation from `settings`, replacing any running one.
    pub fn render(&mut self, settings: &RenderSettings, size: SurfaceSize) -> Result<(), RenderError> {
        let session = RenderSession::new(settings, size, &self.evaluator)?;

        self.cancel_pending();
        info!(
            "render started: {} points, {}x{} surface, formulas ({}, {})",
            session.geometry.points.len(),
            size.width,
            size.height,
            settings.formula_x,
            settings.formula_y
        );
        self.session = Some(session);
        self.schedule()?;
        Ok(())
    }

    /// Run one frame. Returns `None` when no frame was requested, which
    /// makes a stale callback a no-op.
    pub fn frame(&mut self, timestamp_ms: f64, surface: &mut dyn DrawSurface) -> Option<FrameStats> {
        self.pending.take()?;
        let radius = self.point_radius;
        let stats = self.session.as_mut()?.draw(timestamp_ms, radius, surface);

        if let Err(e) = self.schedule() {
            error!("animation stopped: {e}");
        }
        Some(stats)
    }

    /// Change rotation speeds and oscillation amplitudes without restarting.
    pub fn set_motion(&mut self, motion: MotionParams) {
        if let Some(session) = self.session.as_mut() {
            session.motion = motion;
        }
    }

    /// Cancel the outstanding frame. The session is kept for `restart`.
    pub fn stop(&mut self) {
        if self.pending.is_some() {
            info!("animation stopped");
        }
        self.cancel_pending();
    }

    /// Replay the current session from time zero.
    pub fn restart(&mut self) -> Result<(), RenderError> {
        self.cancel_pending();
        match self.session.as_mut() {
            Some(session) => session.origin_ms = None,
            None => return Ok(()),
        }
        self.schedule()?;
        Ok(())
    }

    fn schedule(&mut self) -> Result<(), ScheduleError> {
        self.pending = Some(self.scheduler.request_frame()?);
        Ok(())
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            debug!("cancelling frame {handle:?}");
            self.scheduler.cancel_frame(handle);
        }
    }
}

impl<S: FrameScheduler, E: Evaluator> Drop for AnimationDriver<S, E> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use crate::surface::DrawList;
    use test_log::test;

    fn size() -> SurfaceSize {
        SurfaceSize::new(800, 600)
    }

    #[test]
    fn test_render_schedules_one_frame() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        assert_eq!(driver.state(), DriverState::Idle);

        driver.render(&RenderSettings::default(), size()).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert!(driver.scheduler().pending().is_some());
    }

    #[test]
    fn test_frame_reschedules_itself() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let mut surface = DrawList::new();
        driver.render(&RenderSettings::default(), size()).unwrap();

        let first = driver.scheduler().pending();
        let stats = driver.frame(0.0, &mut surface).unwrap();
        assert_eq!(stats.edges_drawn, 12);
        assert_ne!(driver.scheduler().pending(), first);
        assert_eq!(driver.state(), DriverState::Running);
    }

    #[test]
    fn test_first_frame_sets_time_origin() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let mut surface = DrawList::new();
        driver.render(&RenderSettings::default(), size()).unwrap();

        assert_eq!(driver.frame(5_000.0, &mut surface).unwrap().elapsed_ms, 0.0);
        assert_eq!(driver.frame(5_016.0, &mut surface).unwrap().elapsed_ms, 16.0);
    }

    #[test]
    fn test_stop_makes_frames_noops() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let mut surface = DrawList::new();
        driver.render(&RenderSettings::default(), size()).unwrap();
        driver.stop();

        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.scheduler().pending(), None);
        assert!(driver.frame(10.0, &mut surface).is_none());
        assert!(surface.commands.is_empty());
    }

    #[test]
    fn test_restart_resets_clock() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let mut surface = DrawList::new();
        driver.render(&RenderSettings::default(), size()).unwrap();
        driver.frame(100.0, &mut surface);
        driver.frame(400.0, &mut surface);

        driver.stop();
        driver.restart().unwrap();
        assert_eq!(driver.frame(900.0, &mut surface).unwrap().elapsed_ms, 0.0);
    }

    #[test]
    fn test_restart_without_session_stays_idle() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        driver.restart().unwrap();
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[test]
    fn test_set_motion_applies_live() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        driver.render(&RenderSettings::default(), size()).unwrap();

        let faster = MotionParams::new(60.0, 5.0, nalgebra::Vector3::new(0.1, 0.0, 0.0));
        driver.set_motion(faster);
        assert_eq!(driver.session().unwrap().motion(), faster);
        assert_eq!(driver.state(), DriverState::Running);
    }

    #[test]
    fn test_invalid_samples_rejected() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let settings = RenderSettings {
            samples: 1,
            ..RenderSettings::default()
        };
        let err = driver.render(&settings, size()).unwrap_err();
        assert!(matches!(err, RenderError::Geometry(GeometryError::TooFewSamples(1))));
        assert_eq!(driver.state(), DriverState::Idle);
        assert!(driver.session().is_none());
    }

    #[test]
    fn test_degenerate_cuboid_rejected() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let corner = nalgebra::Point3::new(1.0, 1.0, 1.0);
        let settings = RenderSettings {
            corners: (corner, corner),
            ..RenderSettings::default()
        };
        let err = driver.render(&settings, size()).unwrap_err();
        assert!(matches!(err, RenderError::Geometry(GeometryError::Degenerate { .. })));
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.scheduler().pending(), None);
        assert!(driver.session().is_none());
    }

    #[test]
    fn test_session_keeps_running_formulas() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        driver.render(&RenderSettings::default(), size()).unwrap();
        let broken = RenderSettings {
            formula_x: "x +".to_string(),
            ..RenderSettings::default()
        };
        assert!(driver.render(&broken, size()).is_err());
        assert_eq!(
            driver.session().unwrap().projector().sources(),
            ("\\frac{x}{y}", "\\frac{z}{y}")
        );
    }

    #[test]
    fn test_invalid_view_rejected() {
        let mut driver = AnimationDriver::new(ManualScheduler::new());
        let settings = RenderSettings {
            focal_length: 0.0,
            ..RenderSettings::default()
        };
        assert!(matches!(
            driver.render(&settings, size()),
            Err(RenderError::Viewport(ViewportError::FocalLength(_)))
        ));
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        struct Counting<'a>(&'a std::cell::Cell<usize>);

        impl FrameScheduler for Counting<'_> {
            fn request_frame(&mut self) -> Result<FrameHandle, ScheduleError> {
                Ok(FrameHandle(1))
            }

            fn cancel_frame(&mut self, _handle: FrameHandle) {
                self.0.set(self.0.get() + 1);
            }
        }

        let cancels = std::cell::Cell::new(0);
        {
            let mut driver = AnimationDriver::new(Counting(&cancels));
            driver.render(&RenderSettings::default(), size()).unwrap();
        }
        assert_eq!(cancels.get(), 1);
    }

    #[test]
    fn test_schedule_failure_is_reported() {
        struct Refusing;

        impl FrameScheduler for Refusing {
            fn request_frame(&mut self) -> Result<FrameHandle, ScheduleError> {
                Err(ScheduleError("no window".to_string()))
            }

            fn cancel_frame(&mut self, _handle: FrameHandle) {}
        }

        let mut driver = AnimationDriver::new(Refusing);
        let err = driver.render(&RenderSettings::default(), size()).unwrap_err();
        assert!(matches!(err, RenderError::Schedule(_)));
        assert_eq!(driver.state(), DriverState::Idle);
    }
}
