use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use super::error::Result;

/// Prefix of environment variables that override configuration keys,
/// e.g. `S3SYNC_SYNC__CONCURRENCY=8` overrides `sync.concurrency`.
pub const ENV_PREFIX: &str = "S3SYNC";

// Layered sources shared by every AppConfig call; built on demand.
lazy_static! {
    static ref BUILDER: RwLock<ConfigBuilder<DefaultState>> = RwLock::new(Config::builder());
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
    /// Directory of the log file. Empty means `logs/` next to the executable.
    #[serde(default)]
    pub dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Maximum number of uploads in flight, 0 for no limit.
    pub concurrency: usize,
    /// Number of keys requested per listing call while pruning.
    pub page_size: usize,
}

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct S3Config {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log: LogConfig,
    pub sync: SyncConfig,
    #[serde(default)]
    pub s3: S3Config,
}

impl AppConfig {
    /// Initialize AppConfig.
    pub fn init(default_config: Option<&str>) -> Result<()> {
        let mut builder = Config::builder();

        // Embed file into executable
        // This macro will embed the configuration file into the
        // executable. Check include_str! for more info.
        if let Some(config_contents) = default_config {
            builder = builder.add_source(File::from_str(config_contents, FileFormat::Toml));
        }

        *BUILDER.write()? = builder;

        Ok(())
    }

    /// Layer a user supplied TOML file on top of the built-in defaults.
    pub fn merge_config(config_file: Option<&Path>) -> Result<()> {
        if let Some(config_file_path) = config_file {
            let mut builder = BUILDER.write()?;
            *builder = builder.clone().add_source(File::from(config_file_path));
        }

        Ok(())
    }

    /// Set CONFIG.
    pub fn set(key: &str, value: &str) -> Result<()> {
        let mut builder = BUILDER.write()?;
        *builder = builder.clone().set_override(key, value)?;

        Ok(())
    }

    /// Get a single value.
    pub fn get<'de, T>(key: &str) -> Result<T>
    where
        T: serde::Deserialize<'de>,
    {
        Ok(Self::build()?.get::<T>(key)?)
    }

    /// Deserialize the whole configuration.
    pub fn fetch() -> Result<AppConfig> {
        Ok(Self::build()?.try_deserialize::<AppConfig>()?)
    }

    // Environment variables always win over files; explicit overrides win over both.
    fn build() -> Result<Config> {
        let builder = BUILDER.read()?.clone();
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config)
    }
}
