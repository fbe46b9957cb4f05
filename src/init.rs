// Initialization utilities
//
// Storage backend and logging/tracing setup from RuntimeConfig.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use blobtail_config::{LogFormat, RuntimeConfig, StorageBackend};
use blobtail_core::ObjectStore;
use blobtail_storage::OpendalStore;

/// Build the object store for the configured backend.
pub fn init_store(config: &RuntimeConfig) -> Result<Arc<dyn ObjectStore>> {
    info!("Initializing storage backend: {}", config.storage.backend);

    let store = match config.storage.backend {
        StorageBackend::Fs => {
            let fs = config.storage.fs.clone().unwrap_or_default();
            info!("Using filesystem storage at: {}", fs.path);
            OpendalStore::new_fs(&fs.path)?
        }
        StorageBackend::S3 => {
            let s3 = config
                .storage
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 config required for S3 backend"))?;
            info!(
                "Using S3 storage: bucket={}, region={}",
                s3.bucket, s3.region
            );
            OpendalStore::new_s3(
                &s3.bucket,
                &s3.region,
                s3.endpoint.as_deref(),
                s3.access_key_id.as_deref(),
                s3.secret_access_key.as_deref(),
            )?
        }
        StorageBackend::R2 => {
            let r2 = config
                .storage
                .r2
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("r2 config required for R2 backend"))?;
            info!(
                "Using R2 storage: account={}, bucket={}",
                r2.account_id, r2.bucket
            );
            OpendalStore::new_r2(
                &r2.bucket,
                &r2.account_id,
                &r2.access_key_id,
                &r2.secret_access_key,
            )?
        }
    };

    Ok(Arc::new(store))
}

/// Initialize tracing/logging from RuntimeConfig.
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.log.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}
