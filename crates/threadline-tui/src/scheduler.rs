//! Single-flight render scheduling.
//!
//! At most one pass runs at a time. Requests that arrive while one is running
//! collapse into a single trailing pass, started from whatever state is
//! current when the running pass completes.

use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct RenderScheduler {
    rendering: bool,
    dirty: bool,
    passes: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a pass. Returns `true` when the caller should start one now.
    pub fn request(&mut self) -> bool {
        if self.rendering {
            trace!("Render in flight, coalescing request");
            self.dirty = true;
            return false;
        }
        self.start();
        true
    }

    /// Mark the running pass finished. Returns `true` when a trailing pass
    /// should start immediately.
    pub fn complete(&mut self) -> bool {
        self.rendering = false;
        if std::mem::take(&mut self.dirty) {
            self.start();
            return true;
        }
        false
    }

    fn start(&mut self) {
        self.rendering = true;
        self.passes += 1;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Passes started so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}
