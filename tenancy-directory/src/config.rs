//! Directory configuration.
//!
//! Loaded once at startup and injected into the directory. Values come from
//! environment variables with defaults suitable for local development; the
//! signing secret has no default.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tenancy_auth::{PasswordConfig, TokenConfig};
use thiserror::Error;

/// Default bound on a single storage call, in milliseconds.
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },

    /// Logging could not be initialized.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `tenancy_directory=debug,info`.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Configuration for the directory and the services it owns.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Token signing and expiry.
    pub token: TokenConfig,

    /// Password hashing cost.
    pub password: PasswordConfig,

    /// Bound on each storage call.
    pub storage_timeout: Duration,

    /// Logging.
    pub log: LogConfig,
}

impl DirectoryConfig {
    /// Create a configuration with the given signing secret and defaults
    /// for everything else.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: TokenConfig::new(secret),
            password: PasswordConfig::default(),
            storage_timeout: Duration::from_millis(DEFAULT_STORAGE_TIMEOUT_MS),
            log: LogConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JWT_SECRET`: Token signing secret (required)
    /// - `JWT_EXPIRY`: Token lifetime in hours (default: 24)
    /// - `JWT_ISSUER`: Token issuer (default: tenancy)
    /// - `STORAGE_TIMEOUT_MS`: Bound on each storage call (default: 5000)
    /// - `LOG_LEVEL`: Log filter directive (default: info)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        let mut token = TokenConfig::new(secret);
        if let Some(hours) = parse_var::<_, u32>(&lookup, "JWT_EXPIRY")? {
            if hours > TokenConfig::MAX_EXPIRY_HOURS {
                return Err(ConfigError::InvalidValue {
                    key: "JWT_EXPIRY".to_string(),
                    message: format!("at most {} hours", TokenConfig::MAX_EXPIRY_HOURS),
                });
            }
            token = token.with_expiry_hours(hours);
        }
        if let Some(issuer) = lookup("JWT_ISSUER").filter(|s| !s.is_empty()) {
            token = token.with_issuer(issuer);
        }

        let storage_timeout_ms =
            parse_var(&lookup, "STORAGE_TIMEOUT_MS")?.unwrap_or(DEFAULT_STORAGE_TIMEOUT_MS);
        if storage_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "STORAGE_TIMEOUT_MS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let default_log = LogConfig::default();
        let format = match lookup("LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                message: format!("expected 'pretty' or 'json', got '{}'", value),
            })?,
            None => default_log.format,
        };

        Ok(Self {
            token,
            password: PasswordConfig::default(),
            storage_timeout: Duration::from_millis(storage_timeout_ms),
            log: LogConfig {
                level: lookup("LOG_LEVEL").unwrap_or(default_log.level),
                format,
            },
        })
    }

    /// Set the bound on each storage call.
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Set the password hashing cost.
    pub fn with_password(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    /// Get the storage timeout.
    pub fn storage_timeout(&self) -> Duration {
        self.storage_timeout
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}
