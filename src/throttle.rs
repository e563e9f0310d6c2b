//! Minimum-interval rate limiting toward the target site.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Spaces out requests so that no two start closer than `interval`.
///
/// Shared by reference across workers; callers queue on the internal lock,
/// so the spacing holds for the whole process, not per worker.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_slot: Mutex::new(None) }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    /// Waits until the next request slot is free, then claims it.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(at) = *next_slot {
            let now = Instant::now();
            if at > now {
                trace!("Throttling for {}ms", (at - now).as_millis());
                tokio::time::sleep_until(at).await;
            }
        }
        *next_slot = Some(Instant::now() + self.interval);
    }
}
