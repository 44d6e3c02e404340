/// Frame scheduling abstraction
use thiserror::Error;

/// Identifies one outstanding frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not schedule a frame: {0}")]
pub struct ScheduleError(pub String);

/// Requests a single callback before the next repaint.
///
/// Implementations only ever hold the most recent request; the host calls
/// back into the driver when it fires.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, ScheduleError>;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler for hosts that run their own loop and poll for due frames
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Take the waiting request, if any. The host should run a frame when
    /// this returns `Some`.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, ScheduleError> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}
