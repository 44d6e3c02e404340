/// wireproj web host
///
/// Draws the animated wireframe on a 2D canvas, driven by
/// `requestAnimationFrame`. Every setter only changes the stored settings;
/// `render()` validates them and restarts the animation. Rotation speed and
/// oscillation also apply to the running animation straight away.
use log::{Level, LevelFilter, Log, Metadata, Record};
use nalgebra::{Point2, Point3, Vector3};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, CanvasRenderingContext2d, HtmlCanvasElement};
use wireproj_core::{
    AnimationDriver, DrawSurface, DriverState, FrameHandle, FrameScheduler, Pivot, RenderSettings, ScheduleError,
    SurfaceSize,
};

const EDGE_COLOR: &str = "red";
const POINT_COLOR: &str = "blue";

/// Canvas 2D context behind the `DrawSurface` trait
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, context })
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.canvas.width(), self.canvas.height())
    }
}

impl DrawSurface for CanvasSurface {
    fn clear(&mut self) {
        self.context
            .clear_rect(0.0, 0.0, f64::from(self.canvas.width()), f64::from(self.canvas.height()));
    }

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>) {
        self.context.begin_path();
        self.context.set_stroke_style_str(EDGE_COLOR);
        self.context.move_to(from.x, from.y);
        self.context.line_to(to.x, to.y);
        self.context.stroke();
    }

    fn circle(&mut self, center: Point2<f64>, radius: f64) {
        self.context.begin_path();
        self.context.set_fill_style_str(POINT_COLOR);
        if self.context.arc(center.x, center.y, radius, 0.0, TAU).is_ok() {
            self.context.fill();
        }
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `FrameScheduler` on top of `window.requestAnimationFrame`.
///
/// The callback is installed once after construction and reused for every
/// request.
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
    callback: FrameCallback,
}

impl AnimationFrameScheduler {
    pub fn new(window: web_sys::Window) -> Self {
        Self {
            window,
            callback: Rc::new(RefCell::new(None)),
        }
    }

    fn install(&self, callback: Closure<dyn FnMut(f64)>) {
        *self.callback.borrow_mut() = Some(callback);
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, ScheduleError> {
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| ScheduleError("frame callback not installed".to_string()))?;
        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| ScheduleError(format!("{e:?}")))?;
        Ok(FrameHandle(id as u64))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0 as i32) {
            log::warn!("cancelAnimationFrame failed: {e:?}");
        }
    }
}

struct Host {
    settings: RenderSettings,
    driver: AnimationDriver<AnimationFrameScheduler>,
    surface: CanvasSurface,
}

impl Host {
    fn on_frame(&mut self, timestamp_ms: f64) {
        let Host { driver, surface, .. } = self;
        driver.frame(timestamp_ms, surface);
    }

    fn set_motion_live(&mut self) {
        self.driver.set_motion(self.settings.motion);
    }
}

#[wasm_bindgen]
pub struct WebRenderer {
    host: Rc<RefCell<Host>>,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Attach to the canvas with id `canvas_id`. Nothing is drawn until
    /// `render()` is called.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebRenderer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let canvas = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id `{canvas_id}`")))?
            .dyn_into::<HtmlCanvasElement>()?;

        let scheduler = AnimationFrameScheduler::new(window);
        let host = Rc::new(RefCell::new(Host {
            settings: RenderSettings::default(),
            driver: AnimationDriver::new(scheduler),
            surface: CanvasSurface::new(canvas)?,
        }));

        let weak: Weak<RefCell<Host>> = Rc::downgrade(&host);
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp_ms: f64| {
            if let Some(host) = weak.upgrade() {
                host.borrow_mut().on_frame(timestamp_ms);
            }
        });
        host.borrow().driver.scheduler().install(callback);

        Ok(WebRenderer { host })
    }

    pub fn set_cuboid(&mut self, x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) {
        self.host.borrow_mut().settings.corners = (Point3::new(x1, y1, z1), Point3::new(x2, y2, z2));
    }

    pub fn set_samples(&mut self, samples: u32) {
        self.host.borrow_mut().settings.samples = samples as usize;
    }

    pub fn set_view(&mut self, fov_degrees: f64, focal_length: f64) {
        let mut host = self.host.borrow_mut();
        host.settings.fov_degrees = fov_degrees;
        host.settings.focal_length = focal_length;
    }

    /// Rotation speeds in revolutions per minute. Applies immediately.
    pub fn set_rotation(&mut self, rpm_y: f64, rpm_z: f64) {
        let mut host = self.host.borrow_mut();
        host.settings.motion.rpm_y = rpm_y;
        host.settings.motion.rpm_z = rpm_z;
        host.set_motion_live();
    }

    /// Oscillation amplitudes per axis. Applies immediately.
    pub fn set_oscillation(&mut self, x: f64, y: f64, z: f64) {
        let mut host = self.host.borrow_mut();
        host.settings.motion.amplitude = Vector3::new(x, y, z);
        host.set_motion_live();
    }

    /// `"cube-center"` or `"origin"`
    pub fn set_pivot(&mut self, pivot: &str) -> Result<(), JsValue> {
        let pivot = parse_pivot(pivot).ok_or_else(|| JsValue::from_str(&format!("unknown pivot `{pivot}`")))?;
        self.host.borrow_mut().settings.pivot = pivot;
        Ok(())
    }

    pub fn set_projection(&mut self, formula_x: &str, formula_y: &str) {
        let mut host = self.host.borrow_mut();
        host.settings.formula_x = formula_x.to_string();
        host.settings.formula_y = formula_y.to_string();
    }

    /// Start the animation from the current settings. On error the running
    /// animation, if any, carries on.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let mut host = self.host.borrow_mut();
        let Host {
            settings,
            driver,
            surface,
        } = &mut *host;
        driver.render(settings, surface.size()).map_err(|e| {
            log::error!("render failed: {e}");
            JsValue::from_str(&e.to_string())
        })
    }

    pub fn stop(&mut self) {
        self.host.borrow_mut().driver.stop();
    }

    pub fn is_running(&self) -> bool {
        self.host.borrow().driver.state() == DriverState::Running
    }
}

fn parse_pivot(name: &str) -> Option<Pivot> {
    match name.trim().to_ascii_lowercase().as_str() {
        "cube-center" | "center" => Some(Pivot::CubeCenter),
        "origin" => Some(Pivot::Origin),
        _ => None,
    }
}

/// `log` backend writing to the browser console
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}: {}", record.level(), record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug | Level::Trace => console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // a second init (e.g. module reload) keeps the first logger
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    Ok(())
}
