// Export tuning knobs
//
// Supplied once per export invocation and never mutated afterwards.

use std::time::Duration;

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default cap on in-flight downloads within one minute bucket.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 8;

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// How far behind "now" a minute bucket must be before it is listed.
    /// Accounts for write-completion lag in the store.
    pub min_latency: Duration,
    /// Maximum entries requested per listing page.
    pub page_size: usize,
    /// Maximum concurrent downloads within one bucket. Results still surface
    /// in listing order.
    pub max_concurrent_downloads: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            min_latency: Duration::ZERO,
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
        }
    }
}

impl ExportOptions {
    /// `min_latency` as a chrono duration for timestamp arithmetic. Values
    /// beyond chrono's range clamp to the maximum representable delay.
    pub(crate) fn min_latency_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.min_latency).unwrap_or(chrono::Duration::MAX)
    }
}
