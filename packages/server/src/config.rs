//! Process configuration.
//!
//! Sources, later ones winning: built-in defaults, `config/server.toml`, then
//! `TASKS_`-prefixed environment variables with `__` between nested keys
//! (`TASKS_HTTP__PORT=9000`, `TASKS_DB__ENDPOINT=ws://db:8000`).

use std::time::Duration;

use db::DbConfig;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use queue_core::DEFAULT_QUEUE_NAME;
use serde::Deserialize;
use thiserror::Error;

/// Default config file, relative to the working directory.
pub const CONFIG_FILE: &str = "config/server.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TASKS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Top-level configuration shared by the server and worker binaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db: DbConfig,
    pub queue: QueueConfig,
    pub http: HttpConfig,
    pub worker: WorkerConfig,
    pub log: LogConfig,
    /// Reported at startup.
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            queue: QueueConfig::default(),
            http: HttpConfig::default(),
            worker: WorkerConfig::default(),
            log: LogConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Workers the API server runs in-process. The standalone worker binary
    /// treats zero as one.
    pub embedded: usize,
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            embedded: 1,
            poll_interval_ms: 200,
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Figment(Box::new(e)))
    }
}
