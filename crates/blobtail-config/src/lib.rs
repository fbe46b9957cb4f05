// blobtail-config - Runtime configuration
//
// Supports configuration from multiple sources:
// 1. Environment variables (BLOBTAIL_* prefix, highest priority)
// 2. Config file path from BLOBTAIL_CONFIG
// 3. Config file contents from BLOBTAIL_CONFIG_CONTENT
// 4. Default config file location (./blobtail.toml)
// 5. Built-in defaults (lowest priority)

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "BLOBTAIL_";

/// Main runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Export tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// How far behind "now" a minute bucket must be before it is listed.
    pub min_latency_secs: u64,
    /// Maximum entries per listing page.
    pub page_size: usize,
    /// Maximum concurrent downloads within one bucket.
    pub max_concurrent_downloads: usize,
}

impl ExportConfig {
    pub fn min_latency(&self) -> Duration {
        Duration::from_secs(self.min_latency_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            min_latency_secs: 300,
            page_size: 100,
            max_concurrent_downloads: 8,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default)]
    pub fs: Option<FsConfig>,

    #[serde(default)]
    pub s3: Option<S3Config>,

    #[serde(default)]
    pub r2: Option<R2Config>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Fs,
    S3,
    R2,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::R2 => write!(f, "r2"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            "r2" | "cloudflare" => Ok(StorageBackend::R2),
            _ => bail!("Unsupported storage backend: {}. Supported: fs, s3, r2", s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct R2Config {
    pub bucket: String,
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Environment lookup seam so override logic is testable without touching
/// process state.
pub trait EnvSource {
    /// Fetch `BLOBTAIL_<key>`.
    fn get(&self, key: &str) -> Option<String>;
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority.
    pub fn load() -> Result<Self> {
        let mut config = match load_from_file()? {
            Some(file_config) => file_config,
            None => RuntimeConfig::default(),
        };
        apply_env_overrides(&mut config, &StdEnvSource)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path (for a --config flag).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: RuntimeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        apply_env_overrides(&mut config, &StdEnvSource)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.export.page_size == 0 {
            bail!("export.page_size must be at least 1");
        }
        if self.export.max_concurrent_downloads == 0 {
            bail!("export.max_concurrent_downloads must be at least 1");
        }

        match self.storage.backend {
            StorageBackend::Fs => {
                // fs falls back to its default root when unset
            }
            StorageBackend::S3 => {
                let Some(s3) = self.storage.s3.as_ref() else {
                    bail!("storage.s3 section required for the s3 backend");
                };
                if s3.bucket.is_empty() {
                    bail!("storage.s3.bucket must not be empty");
                }
                if s3.region.is_empty() {
                    bail!("storage.s3.region must not be empty");
                }
            }
            StorageBackend::R2 => {
                let Some(r2) = self.storage.r2.as_ref() else {
                    bail!("storage.r2 section required for the r2 backend");
                };
                if r2.bucket.is_empty() {
                    bail!("storage.r2.bucket must not be empty");
                }
                if r2.account_id.is_empty() {
                    bail!("storage.r2.account_id must not be empty");
                }
            }
        }

        Ok(())
    }
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = std::env::var("BLOBTAIL_CONFIG") {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: RuntimeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    if let Ok(content) = std::env::var("BLOBTAIL_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from BLOBTAIL_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    if Path::new("./blobtail.toml").exists() {
        let content = std::fs::read_to_string("./blobtail.toml")
            .context("Failed to read config file: ./blobtail.toml")?;
        let config: RuntimeConfig =
            toml::from_str(&content).context("Failed to parse config file: ./blobtail.toml")?;
        return Ok(Some(config));
    }

    Ok(None)
}

/// Apply `BLOBTAIL_*` environment overrides on top of `config`.
pub fn apply_env_overrides(config: &mut RuntimeConfig, env: &dyn EnvSource) -> Result<()> {
    fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        raw.parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}{}: {}", ENV_PREFIX, key, e))
    }

    if let Some(raw) = env.get("MIN_LATENCY_SECS") {
        config.export.min_latency_secs = parse("MIN_LATENCY_SECS", &raw)?;
    }
    if let Some(raw) = env.get("PAGE_SIZE") {
        config.export.page_size = parse("PAGE_SIZE", &raw)?;
    }
    if let Some(raw) = env.get("MAX_CONCURRENT_DOWNLOADS") {
        config.export.max_concurrent_downloads = parse("MAX_CONCURRENT_DOWNLOADS", &raw)?;
    }

    if let Some(raw) = env.get("STORAGE_BACKEND") {
        config.storage.backend = parse("STORAGE_BACKEND", &raw)?;
    }
    if let Some(path) = env.get("FS_PATH") {
        config.storage.fs = Some(FsConfig { path });
    }
    if let Some(bucket) = env.get("S3_BUCKET") {
        let s3 = config.storage.s3.get_or_insert_with(|| S3Config {
            bucket: String::new(),
            region: String::new(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        });
        s3.bucket = bucket;
    }
    if let Some(region) = env.get("S3_REGION") {
        if let Some(s3) = config.storage.s3.as_mut() {
            s3.region = region;
        }
    }
    if let Some(endpoint) = env.get("S3_ENDPOINT") {
        if let Some(s3) = config.storage.s3.as_mut() {
            s3.endpoint = Some(endpoint);
        }
    }

    if let Some(raw) = env.get("LOG_LEVEL") {
        config.log.level = raw;
    }
    if let Some(raw) = env.get("LOG_FORMAT") {
        config.log.format = parse("LOG_FORMAT", &raw)?;
    }

    Ok(())
}
