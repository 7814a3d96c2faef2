//! Progress reporting for the row-by-row geocoding pass.
//!
//! Resolving a long itinerary against a rate-limited provider takes about a
//! second per uncached place, so callers want feedback. [`ProgressCallback`]
//! decouples that from any rendering backend: the CLI plugs in `indicatif`
//! bars, [`LogProgress`] reports milestones through `log`, and
//! [`NullProgress`] stays silent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for reporting progress from long-running operations.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (one unit per itinerary row).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates. Used by tests and non-interactive runs.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Logs a line every `every` units and on completion.
pub struct LogProgress {
    label: String,
    every: u64,
    total: AtomicU64,
    position: AtomicU64,
}

impl LogProgress {
    #[must_use]
    pub fn new(label: &str, every: u64) -> Arc<dyn ProgressCallback> {
        Arc::new(Self {
            label: label.to_string(),
            every: every.max(1),
            total: AtomicU64::new(0),
            position: AtomicU64::new(0),
        })
    }
}

impl ProgressCallback for LogProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
    }

    fn inc(&self, delta: u64) {
        let before = self.position.fetch_add(delta, Ordering::Relaxed);
        let after = before + delta;
        if before / self.every != after / self.every {
            log::info!(
                "[{}] {after}/{}",
                self.label,
                self.total.load(Ordering::Relaxed)
            );
        }
    }

    fn set_message(&self, msg: String) {
        log::debug!("[{}] {msg}", self.label);
    }

    fn finish(&self, msg: String) {
        log::info!("[{}] {msg}", self.label);
    }
}
