//! Configuration module
//!
//! - `cache` - Redis connection configuration
//! - `environment` - Environment detection and logging configuration
//! - `otp` - Code lifetime and consume strategy

pub mod cache;
pub mod environment;
pub mod otp;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::CacheConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::{ConsumeStrategy, OtpConfig};

/// Configuration loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Redis configuration
    pub cache: CacheConfig,

    /// OTP lifecycle configuration
    pub otp: OtpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            cache: CacheConfig::default(),
            otp: OtpConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_lookup(&lookup);
        let logging = LoggingConfig::for_environment(environment)
            .with_overrides(&lookup)
            .map_err(|e| ConfigError::invalid("LOG_LEVEL/LOG_FORMAT", e))?;

        Ok(Self {
            environment,
            cache: CacheConfig::from_lookup(&lookup)?,
            otp: OtpConfig::from_lookup(&lookup)?,
            logging,
        })
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }
}
