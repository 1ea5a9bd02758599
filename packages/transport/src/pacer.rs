//! Minimum-interval pacing between outbound requests.
//!
//! A [`Pacer`] remembers when its owner last sent a request and makes the
//! next caller sleep until the configured interval has passed. Each client
//! instance owns its own pacer.
//!
//! Concurrent callers each compute their wait from the same timestamp, so
//! two tasks racing on one pacer may both proceed after a single interval.
//! Callers that need strict spacing across tasks must serialize access.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum interval between consecutive calls.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Creates a pacer. A zero interval never waits.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Creates a pacer from an interval in milliseconds.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// The configured minimum interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the interval since the previous call has elapsed, then
    /// records this call. Returns how long the caller waited.
    pub async fn pace(&self) -> Duration {
        let wait = self.remaining();

        if !wait.is_zero() {
            log::trace!("Pacing request, waiting {wait:?}");
            tokio::time::sleep(wait).await;
        }

        *self.lock() = Some(Instant::now());
        wait
    }

    fn remaining(&self) -> Duration {
        let last_call = *self.lock();
        last_call.map_or(Duration::ZERO, |last| {
            self.interval.saturating_sub(last.elapsed())
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
