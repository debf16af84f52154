//! Application configuration, deserialized from `config.toml`.
//!
//! Sections mirror the collaborators: `[fetcher]` for the pipeline,
//! `[email]` for SMTP delivery, and an optional `[redis]` section that
//! switches the user/email store from the in-process map to Redis.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable consulted when `[email].password` is absent.
pub const SMTP_PASSWORD_ENV: &str = "PAPERBOY_SMTP_PASSWORD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// No SMTP password in the config file or the environment.
    ///
    /// Secrets are supplied up front or startup fails; there is no
    /// interactive prompt in a server context.
    #[error("No SMTP password configured: set [email].password or the {SMTP_PASSWORD_ENV} environment variable")]
    MissingCredential,
}

/// Top-level application config.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetcher: FetcherConfig,

    pub email: EmailConfig,

    /// When present, user emails live in Redis instead of process memory.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

/// `[fetcher]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Cache directory for intermediate and output files. Defaults to the
    /// platform cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Markdown-to-EPUB converter program.
    #[serde(default = "default_converter")]
    pub converter: PathBuf,

    #[serde(default = "default_convert_timeout_seconds")]
    pub convert_timeout_seconds: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            cache_dir: None,
            converter: default_converter(),
            convert_timeout_seconds: default_convert_timeout_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}
fn default_converter() -> PathBuf {
    PathBuf::from("pandoc")
}
fn default_convert_timeout_seconds() -> u64 {
    120
}

/// `[email]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub hostname: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Sender address, also used as the SMTP login.
    pub username: String,

    /// SMTP password. Usually left out of the file in favor of
    /// [`SMTP_PASSWORD_ENV`].
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    465
}

impl EmailConfig {
    /// Resolves the SMTP password, failing fast when none is configured.
    pub fn resolve_password(&self) -> Result<String, ConfigError> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }

        std::env::var(SMTP_PASSWORD_ENV).map_err(|_| ConfigError::MissingCredential)
    }
}

/// `[redis]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    #[serde(default)]
    pub db: u32,
}

fn default_redis_port() -> u16 {
    6379
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl AppConfig {
    /// Loads and parses the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

        Ok(toml::from_str(&raw)?)
    }
}
