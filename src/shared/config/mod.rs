//! Application configuration module
//!
//! Provides the server configuration, built either programmatically through
//! `AppConfigBuilder`, from environment variables, or from a TOML file.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 7071;
const DEFAULT_TOMBSTONE_TTL_SECS: u64 = 1;
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 30;
const DEFAULT_CONNECTION_IDLE_SECS: u64 = 300;
const DEFAULT_BROADCAST_CAPACITY: usize = 256;
const DEFAULT_LOG_FILTER: &str = "info";

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Port the HTTP server binds to
    pub port: u16,
    /// SQLite URL of the document store; in-memory store when `None`
    pub database_url: Option<String>,
    /// Externally visible base URL used in negotiate responses
    pub public_url: Option<String>,
    /// How long a tombstoned document stays before the purge removes it
    pub tombstone_ttl: Duration,
    /// Interval of the tombstone purge task
    pub purge_interval: Duration,
    /// Connections without a live event stream are dropped after this long
    pub connection_idle_timeout: Duration,
    /// Per-connection event buffer
    pub broadcast_capacity: usize,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            public_url: None,
            tombstone_ttl: Duration::from_secs(DEFAULT_TOMBSTONE_TTL_SECS),
            purge_interval: Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS),
            connection_idle_timeout: Duration::from_secs(DEFAULT_CONNECTION_IDLE_SECS),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port",
                message: "must be non-zero".to_string(),
            });
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "broadcast_capacity",
                message: "must be non-zero".to_string(),
            });
        }
        if self.purge_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "purge_interval",
                message: "must be non-zero".to_string(),
            });
        }
        if let Some(url) = &self.database_url {
            if !url.starts_with("sqlite:") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }

    /// Load configuration from the environment
    ///
    /// If `PLANSYNC_CONFIG` names a TOML file it is read first; individual
    /// environment variables then override its values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = match std::env::var("PLANSYNC_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::Io(format!("{}: {}", path, e)))?;
                AppConfigBuilder::from_file(FileConfig::parse(&text)?)
            }
            Err(_) => AppConfig::builder(),
        };

        if let Some(port) = env_parse::<u16>("SERVER_PORT")? {
            builder = builder.port(port);
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Ok(url) = std::env::var("PUBLIC_URL") {
            builder = builder.public_url(url);
        }
        if let Some(secs) = env_parse::<u64>("TOMBSTONE_TTL_SECS")? {
            builder = builder.tombstone_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("PURGE_INTERVAL_SECS")? {
            builder = builder.purge_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("CONNECTION_IDLE_SECS")? {
            builder = builder.connection_idle_timeout(Duration::from_secs(secs));
        }
        if let Some(capacity) = env_parse::<usize>("BROADCAST_CAPACITY")? {
            builder = builder.broadcast_capacity(capacity);
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            builder = builder.log_filter(filter);
        }
        builder.build()
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                message: format!("'{}': {}", raw, e),
            }),
        Err(_) => Ok(None),
    }
}

/// On-disk TOML layout
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub public_url: Option<String>,
    pub tombstone_ttl_secs: Option<u64>,
    pub purge_interval_secs: Option<u64>,
    pub connection_idle_secs: Option<u64>,
    pub broadcast_capacity: Option<usize>,
    pub log_filter: Option<String>,
}

impl FileConfig {
    /// Parse a TOML document
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    public_url: Option<String>,
    tombstone_ttl: Option<Duration>,
    purge_interval: Option<Duration>,
    connection_idle_timeout: Option<Duration>,
    broadcast_capacity: Option<usize>,
    log_filter: Option<String>,
}

impl AppConfigBuilder {
    /// Start from values read out of a config file
    pub fn from_file(file: FileConfig) -> Self {
        Self {
            port: file.port,
            database_url: file.database_url,
            public_url: file.public_url,
            tombstone_ttl: file.tombstone_ttl_secs.map(Duration::from_secs),
            purge_interval: file.purge_interval_secs.map(Duration::from_secs),
            connection_idle_timeout: file.connection_idle_secs.map(Duration::from_secs),
            broadcast_capacity: file.broadcast_capacity,
            log_filter: file.log_filter,
        }
    }

    /// Set the listening port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the SQLite database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set the public base URL
    pub fn public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn tombstone_ttl(mut self, ttl: Duration) -> Self {
        self.tombstone_ttl = Some(ttl);
        self
    }

    pub fn purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = Some(interval);
        self
    }

    pub fn connection_idle_timeout(mut self, timeout: Duration) -> Self {
        self.connection_idle_timeout = Some(timeout);
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = Some(capacity);
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            port: self.port.unwrap_or(defaults.port),
            database_url: self.database_url.filter(|u| !u.trim().is_empty()),
            public_url: self.public_url.filter(|u| !u.trim().is_empty()),
            tombstone_ttl: self.tombstone_ttl.unwrap_or(defaults.tombstone_ttl),
            purge_interval: self.purge_interval.unwrap_or(defaults.purge_interval),
            connection_idle_timeout: self
                .connection_idle_timeout
                .unwrap_or(defaults.connection_idle_timeout),
            broadcast_capacity: self.broadcast_capacity.unwrap_or(defaults.broadcast_capacity),
            log_filter: self.log_filter.unwrap_or(defaults.log_filter),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("failed to parse config file: {0}")]
    Parse(String),
    #[error("failed to read config file: {0}")]
    Io(String),
}
