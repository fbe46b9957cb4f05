// blobtail-core - The streaming export pipeline
//
// Turns a remote store of minute-partitioned log blobs into one ordered,
// resumable stream of per-minute batches:
//
//   ticks (which minutes to poll, latency-gated)
//     -> listing (paginated walk of each minute's key prefix)
//     -> fetch (concurrent downloads, fail-soft per object)
//     -> export (tick-ordered flattening + JSON batch decode)
//
// Storage backends live in blobtail-storage; this crate only sees the
// ObjectStore and Clock traits. Callers resume by remembering the last
// consumed timestamp and starting the next window there.

pub mod clock;
pub mod error;
pub mod export;
pub mod fetch;
pub mod listing;
pub mod options;
pub mod record;
pub mod store;
pub mod ticks;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export the types an export invocation touches.
pub use clock::{Clock, SystemClock};
pub use error::ExportError;
pub use export::Exporter;
pub use options::ExportOptions;
pub use record::{DeviceLog, Timestamped};
pub use store::{ListPage, ObjectKind, ObjectRef, ObjectStore, PageCursor, LOG_OBJECT_SUFFIX};
pub use ticks::TimeWindow;
