//! Runtime configuration.
//!
//! Values are layered from an optional TOML file and `SIGHTINGS_*` environment variables
//! (nested keys use `__`, e.g. `SIGHTINGS_DATABASE__HOST=db.internal`).

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

/// Environment variable that points at the configuration file.
pub const CONFIG_PATH_ENV: &str = "SIGHTINGS_CONFIG";
/// Configuration file used when [`CONFIG_PATH_ENV`] is unset. It may be absent.
pub const DEFAULT_CONFIG_PATH: &str = "sightings.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Destination database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Mysql,
    Sqlite,
}

/// Connection parameters of the destination database.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Database (schema) name on the server.
    pub name: Option<String>,
    /// SQLite database file; `:memory:` keeps it in memory for the connection's lifetime.
    #[serde(default = "default_sqlite_path")]
    pub path: String,
    /// Rows per multi-row `INSERT`.
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_sqlite_path() -> String {
    ":memory:".to_string()
}

fn default_insert_batch_size() -> usize {
    500
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            name: None,
            path: default_sqlite_path(),
            insert_batch_size: default_insert_batch_size(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory SQLite database.
    pub fn sqlite_in_memory() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            ..Self::default()
        }
    }

    /// SQLite database stored at `path`; the file is created if missing.
    pub fn sqlite_file(path: impl Into<String>) -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            path: path.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("path", &self.path)
            .field("insert_batch_size", &self.insert_batch_size)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file and the environment.
    pub fn load(path: Option<PathBuf>) -> PipelineResult<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => builder = builder.add_source(config::File::from(path).required(true)),
            None => {
                builder = builder.add_source(config::File::with_name(DEFAULT_CONFIG_PATH).required(false))
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SIGHTINGS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load using the file named by [`CONFIG_PATH_ENV`], if set.
    pub fn from_env() -> PipelineResult<Self> {
        Self::load(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Validate configuration.
    pub fn validate(&self) -> PipelineResult<()> {
        let db = &self.database;
        if db.insert_batch_size == 0 {
            return Err(invalid_config("database.insert_batch_size must be > 0"));
        }
        if db.backend == DatabaseBackend::Mysql {
            if db.user.is_none() {
                return Err(invalid_config("MySQL backend requires 'database.user'"));
            }
            if db.name.is_none() {
                return Err(invalid_config("MySQL backend requires 'database.name'"));
            }
        }
        Ok(())
    }
}

pub(crate) fn invalid_config(message: &str) -> PipelineError {
    PipelineError::Config(config::ConfigError::Message(message.to_string()))
}
