// Error types for the export pipeline

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can terminate an export stream.
///
/// Only two things are allowed to kill an export: a window that is invalid
/// before any I/O happens, and a bucket listing that cannot be trusted.
/// Per-object failures (download, decode) are substituted with empty values
/// and logged; they never appear here.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export window is inverted. Caught at construction, before any I/O.
    #[error("invalid export window: start {start} is after finish {finish}")]
    InvalidWindow {
        start: DateTime<Utc>,
        finish: DateTime<Utc>,
    },

    /// A listing page for one minute bucket could not be fetched. A broken
    /// page cannot be distinguished from "no objects", so the whole export
    /// stops rather than silently dropping a bucket.
    #[error("failed to list page under prefix '{prefix}': {source}")]
    List {
        prefix: String,
        #[source]
        source: anyhow::Error,
    },
}
