// Clock abstraction for the tick generator
//
// The latency arithmetic in `ticks` only ever talks to this trait, so tests
// can drive time deterministically without tokio's paused clock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Time source and sleeper used by the export pipeline.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Suspend for `duration`. Callers race this against cancellation.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by tokio's timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
