// blobtail - Tail minute-partitioned log blobs out of an object store
//
// The pipeline lives in blobtail-core, storage backends in blobtail-storage,
// configuration in blobtail-config. This crate wires them together and ships
// the tail-to-stdout binary.

pub mod init;

pub use blobtail_config::RuntimeConfig;
pub use blobtail_core::{
    DeviceLog, Exporter, ExportError, ExportOptions, ObjectStore, TimeWindow, Timestamped,
};
pub use blobtail_storage::OpendalStore;

/// Export options derived from the loaded configuration.
pub fn export_options(config: &RuntimeConfig) -> ExportOptions {
    ExportOptions {
        min_latency: config.export.min_latency(),
        page_size: config.export.page_size,
        max_concurrent_downloads: config.export.max_concurrent_downloads,
    }
}
