/// Terminal host for the wireproj animation
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::{info, warn};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use wireproj_core::{AnimationDriver, DriverState, FrameStats, ManualScheduler, RenderSettings};

pub mod cli;
pub mod renderer;

pub use cli::Cli;
pub use renderer::CellCanvas;

/// Point radius in canvas pixels; one pixel is half a cell
const POINT_RADIUS: f64 = 0.5;

const RPM_STEP: f64 = 1.0;
const AMPLITUDE_STEP: f64 = 0.1;

/// Main application struct for terminal rendering
pub struct TerminalApp {
    settings: RenderSettings,
    driver: AnimationDriver<ManualScheduler>,
    canvas: CellCanvas,
    clock: Instant,
    frame_interval: Duration,
    running: bool,
    last_stats: Option<FrameStats>,
    message: Option<String>,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Validate `settings` against the current terminal and start the
    /// animation. Invalid settings are reported before the screen is taken
    /// over.
    pub fn new(settings: RenderSettings, fps: u32) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let canvas = CellCanvas::new(width as usize, height as usize);

        let mut driver = AnimationDriver::new(ManualScheduler::new()).with_point_radius(POINT_RADIUS);
        driver
            .render(&settings, canvas.size())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        Ok(Self {
            settings,
            driver,
            canvas,
            clock: Instant::now(),
            frame_interval: Duration::from_millis(1000 / u64::from(fps.max(1))),
            running: true,
            last_stats: None,
            message: None,
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            if self.driver.scheduler_mut().take_due().is_some() {
                self.present()?;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => {
                self.canvas.resize(width as usize, height as usize);
                self.rerender();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                return;
            }
            KeyCode::Enter | KeyCode::Char('r') => {
                self.rerender();
                return;
            }
            KeyCode::Char(' ') => {
                self.toggle_pause();
                return;
            }
            KeyCode::Char('p') => {
                self.settings.pivot = self.settings.pivot.toggled();
                self.rerender();
                return;
            }
            KeyCode::Right => self.settings.motion.rpm_y += RPM_STEP,
            KeyCode::Left => self.settings.motion.rpm_y -= RPM_STEP,
            KeyCode::Up => self.settings.motion.rpm_z += RPM_STEP,
            KeyCode::Down => self.settings.motion.rpm_z -= RPM_STEP,
            KeyCode::Char(c @ ('x' | 'y' | 'z' | 'X' | 'Y' | 'Z')) => {
                let axis = match c.to_ascii_lowercase() {
                    'x' => 0,
                    'y' => 1,
                    _ => 2,
                };
                let step = if c.is_ascii_uppercase() { -AMPLITUDE_STEP } else { AMPLITUDE_STEP };
                let amplitude = &mut self.settings.motion.amplitude[axis];
                *amplitude = (*amplitude + step).max(0.0);
            }
            _ => return,
        }
        self.driver.set_motion(self.settings.motion);
    }

    fn toggle_pause(&mut self) {
        match self.driver.state() {
            DriverState::Running => self.driver.stop(),
            DriverState::Idle => {
                if let Err(e) = self.driver.restart() {
                    self.report(e.to_string());
                }
            }
        }
    }

    /// Start a fresh render; on failure the previous animation keeps going.
    fn rerender(&mut self) {
        match self.driver.render(&self.settings, self.canvas.size()) {
            Ok(()) => {
                info!("re-rendered with pivot {:?}", self.settings.pivot);
                self.message = None;
            }
            Err(e) => self.report(e.to_string()),
        }
    }

    fn report(&mut self, message: String) {
        warn!("{message}");
        self.message = Some(message);
    }

    fn present(&mut self) -> io::Result<()> {
        let now_ms = self.clock.elapsed().as_secs_f64() * 1000.0;
        if let Some(stats) = self.driver.frame(now_ms, &mut self.canvas) {
            self.last_stats = Some(stats);
        }

        let mut stdout = stdout();
        self.canvas.draw(&mut stdout)?;
        self.draw_overlay(&mut stdout)?;
        stdout.flush()?;

        // Update FPS counter
        self.frame_count += 1;
        let now = Instant::now();
        if (now - self.last_fps_sample).as_secs() >= 1 {
            self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
            self.frame_count = 0;
            self.last_fps_sample = now;
        }
        Ok(())
    }

    fn draw_overlay<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let motion = &self.settings.motion;
        let failures = self.last_stats.map_or(0, |s| s.point_failures);
        queue!(
            out,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "wireproj | FPS: {:.1} | rpm y {:+.0} z {:+.0} | osc {:.1}/{:.1}/{:.1} | {:?} | failed points {} \
                 | arrows=rpm x/y/z=osc p=pivot space=pause r=render q=quit",
                self.fps,
                motion.rpm_y,
                motion.rpm_z,
                motion.amplitude.x,
                motion.amplitude.y,
                motion.amplitude.z,
                self.settings.pivot,
                failures,
            )),
        )?;
        if let Some(session) = self.driver.session() {
            let (x, y) = session.projector().sources();
            queue!(out, cursor::MoveTo(0, 1), Print(format!("x' = {x} | y' = {y}")))?;
        }
        if let Some(message) = &self.message {
            queue!(
                out,
                cursor::MoveTo(0, 2),
                SetForegroundColor(Color::Red),
                Print(message),
            )?;
        }
        queue!(out, ResetColor)?;
        Ok(())
    }
}
