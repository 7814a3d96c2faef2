//! Minimum spacing between live geocoding requests.
//!
//! Uses the `tokio` clock so tests can run with paused time.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a fixed minimum interval between consecutive acquisitions.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// call returned. The first call returns immediately.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last {
            let ready = last + self.min_interval;
            if ready > Instant::now() {
                log::trace!("Rate limiter sleeping until {ready:?}");
                tokio::time::sleep_until(ready).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
