// Tick generation: the clock-driven sequence of minute buckets to poll
//
// One tick per minute in [start, finish), held back until the bucket is at
// least `min_latency` behind the clock so the store has finished writing it.

use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use chrono::{DateTime, Timelike, Utc};
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::ExportError;
use crate::options::ExportOptions;

/// Half-open export window `[start, finish)`.
///
/// `start` is aligned down to the minute; `finish = None` means tail forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    finish: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Bounded window. An inverted window is a configuration error and fails
    /// here, before any I/O.
    pub fn new(start: DateTime<Utc>, finish: DateTime<Utc>) -> Result<Self, ExportError> {
        if start > finish {
            return Err(ExportError::InvalidWindow { start, finish });
        }
        Ok(Self {
            start: align_to_minute(start),
            finish: Some(finish),
        })
    }

    /// Open-ended window: tail from `start` until cancelled.
    pub fn tail(start: DateTime<Utc>) -> Self {
        Self {
            start: align_to_minute(start),
            finish: None,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn finish(&self) -> Option<DateTime<Utc>> {
        self.finish
    }

    fn contains(&self, tick: DateTime<Utc>) -> bool {
        match self.finish {
            Some(finish) => tick < finish,
            None => true,
        }
    }
}

fn align_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Produce the minute-aligned tick sequence for `window`.
///
/// A tick `t` is emitted only once `clock.now() - min_latency >= t`; until
/// then the generator sleeps. Cancellation before or during the wait ends the
/// stream silently; it is never an error.
pub fn export_ticks(
    window: TimeWindow,
    options: &ExportOptions,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<DateTime<Utc>, ExportError>> {
    let min_latency = options.min_latency_chrono();
    let step = chrono::Duration::minutes(1);

    try_stream! {
        let mut tick = window.start();
        while window.contains(tick) {
            if cancel.is_cancelled() {
                return;
            }

            let now = clock.now();
            let eligible_at = tick.checked_add_signed(min_latency);
            if !eligible_at.is_some_and(|eligible| now >= eligible) {
                // Bucket may still be receiving writes; wait until it ages
                // past the latency floor.
                let wait = eligible_at
                    .map(|eligible| (eligible - now).to_std().unwrap_or_default())
                    .unwrap_or(Duration::MAX);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = clock.sleep(wait) => {}
                }
            }

            yield tick;
            tick += step;
        }
    }
}
