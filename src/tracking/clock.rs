use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Time source for the engine. Injected so tests can drive it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock anchor advanced by tokio's monotonic clock.
///
/// Readings never go backwards even if the system clock is adjusted, and
/// follow tokio's paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor_wall: DateTime<Utc>,
    anchor_instant: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(anchor_wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall,
            anchor_instant: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.anchor_instant.elapsed();
        match chrono::Duration::from_std(elapsed) {
            Ok(delta) => self.anchor_wall + delta,
            Err(_) => self.anchor_wall,
        }
    }
}
