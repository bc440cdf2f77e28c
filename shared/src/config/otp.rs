//! OTP lifecycle configuration

use serde::{Deserialize, Serialize};

use super::cache::parse_or;
use super::ConfigError;

/// Longest accepted code lifetime (one day)
pub const MAX_TTL_SECONDS: u64 = 86_400;

/// How the store performs the atomic compare-and-delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumeStrategy {
    /// Server-side Lua script, one round trip
    Script,
    /// Optimistic WATCH/MULTI/EXEC loop with bounded attempts
    Watch,
}

impl std::str::FromStr for ConsumeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "script" | "lua" => Ok(ConsumeStrategy::Script),
            "watch" | "cas" => Ok(ConsumeStrategy::Watch),
            _ => Err(format!("Invalid consume strategy: {}", s)),
        }
    }
}

/// OTP issuance and consumption settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Lifetime of an issued code in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Atomic consume implementation
    #[serde(default = "default_consume_strategy")]
    pub consume_strategy: ConsumeStrategy,

    /// Attempt bound for the optimistic strategy
    #[serde(default = "default_consume_max_attempts")]
    pub consume_max_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            consume_strategy: default_consume_strategy(),
            consume_max_attempts: default_consume_max_attempts(),
        }
    }
}

impl OtpConfig {
    /// Create from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let consume_strategy = match lookup("OTP_CONSUME_STRATEGY") {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| ConfigError::invalid("OTP_CONSUME_STRATEGY", e))?,
            None => defaults.consume_strategy,
        };
        let config = Self {
            ttl_seconds: parse_or("OTP_TTL_SECONDS", &lookup, defaults.ttl_seconds)?,
            consume_strategy,
            consume_max_attempts: parse_or("OTP_CONSUME_MAX_ATTEMPTS", &lookup, defaults.consume_max_attempts)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Code lifetime as a duration
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_seconds == 0 {
            return Err(ConfigError::invalid("OTP_TTL_SECONDS", "must be positive"));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::invalid(
                "OTP_TTL_SECONDS",
                format!("must not exceed {}", MAX_TTL_SECONDS),
            ));
        }
        if self.consume_max_attempts == 0 {
            return Err(ConfigError::invalid("OTP_CONSUME_MAX_ATTEMPTS", "must be at least 1"));
        }
        Ok(())
    }
}

fn default_ttl_seconds() -> u64 {
    300 // 5 minutes
}

fn default_consume_strategy() -> ConsumeStrategy {
    ConsumeStrategy::Script
}

fn default_consume_max_attempts() -> u32 {
    5
}
