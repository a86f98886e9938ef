//! RAII timing guard for expensive operations such as render passes.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Logs the elapsed time of an operation when dropped.
///
/// Short operations log at debug, anything over the info threshold at info,
/// and anything over the warn threshold at warn.
pub struct TimingGuard {
    operation: &'static str,
    label: String,
    start: Instant,
    info_threshold_ms: u64,
    warn_threshold_ms: u64,
}

impl TimingGuard {
    pub fn new(operation: &'static str, label: impl Into<String>) -> Self {
        Self {
            operation,
            label: label.into(),
            start: Instant::now(),
            info_threshold_ms: 50,
            warn_threshold_ms: 500,
        }
    }

    /// Guard for one render pass.
    pub fn render(label: impl Into<String>) -> Self {
        Self::new("render", label)
    }

    pub fn with_info_threshold(mut self, ms: u64) -> Self {
        self.info_threshold_ms = ms;
        self
    }

    pub fn with_warn_threshold(mut self, ms: u64) -> Self {
        self.warn_threshold_ms = ms;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        if duration_ms >= self.warn_threshold_ms {
            warn!(operation = self.operation, label = %self.label, duration_ms, "Slow operation");
        } else if duration_ms >= self.info_threshold_ms {
            info!(operation = self.operation, label = %self.label, duration_ms, "Operation completed");
        } else {
            debug!(operation = self.operation, label = %self.label, duration_ms, "Operation completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_elapsed_advances() {
        let guard = TimingGuard::render("pass");
        sleep(Duration::from_millis(5));
        assert!(guard.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_thresholds_do_not_panic_on_drop() {
        let guard = TimingGuard::new("test", "thresholds")
            .with_info_threshold(0)
            .with_warn_threshold(1);
        sleep(Duration::from_millis(2));
        drop(guard);
    }
}
