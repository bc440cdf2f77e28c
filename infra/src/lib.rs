//! # Infrastructure Layer
//!
//! Concrete implementations behind the OTP core's seams:
//!
//! - **Cache**: Redis client with deadlines and retry, and the Redis-backed
//!   `OtpRepository` with its atomic consume
//! - **SMS**: delivery adapters implementing `OtpSender`
//! - **Telemetry**: `tracing` subscriber bootstrap
//!
//! `initialize` wires all of it together from an `AppConfig`.

use std::sync::Arc;

use otp_core::{CodeTtl, OtpAppService, OtpDomainService, OtpError};
use otp_shared::config::{AppConfig, ConfigError};

/// Cache module - Redis client and OTP store
pub mod cache;

/// SMS module - delivery adapters
pub mod sms;

/// Telemetry module - tracing subscriber setup
pub mod telemetry;

use cache::{RedisClient, RedisOtpRepository};
use sms::LogOtpSender;

/// Application service as wired by `initialize`
pub type OtpService = OtpAppService<RedisOtpRepository, LogOtpSender>;

/// Infrastructure service container
#[derive(Clone)]
pub struct InfrastructureServices {
    pub redis: RedisClient,
    pub otp_repository: Arc<RedisOtpRepository>,
    pub otp_service: Arc<OtpService>,
}

/// Connect to Redis and build the OTP store and services.
///
/// Configuration is taken as given; use [`load_config`] to read it from the
/// environment.
pub async fn initialize(config: &AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!(
        environment = ?config.environment,
        consume_strategy = ?config.otp.consume_strategy,
        ttl_seconds = config.otp.ttl_seconds,
        "Initializing infrastructure services..."
    );

    config.otp.validate()?;
    let ttl = CodeTtl::from_std(config.otp.ttl())
        .map_err(|e| InfrastructureError::Config(format!("OTP_TTL_SECONDS: {}", e)))?;

    let redis = RedisClient::new(config.cache.clone()).await?;
    let otp_repository = Arc::new(RedisOtpRepository::new(redis.clone(), &config.otp));
    let sender = Arc::new(LogOtpSender::new());
    let domain = OtpDomainService::new(ttl);
    let otp_service = Arc::new(OtpAppService::new(otp_repository.clone(), sender, domain));

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        redis,
        otp_repository,
        otp_service,
    })
}

/// Load configuration from the environment, reading `.env` first if present
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::from_env()?)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// A cache command did not answer within its deadline
    #[error("Cache operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Logging setup error
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl From<ConfigError> for InfrastructureError {
    fn from(err: ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}

impl From<InfrastructureError> for OtpError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Timeout {
                operation,
                timeout_ms,
            } => OtpError::DeadlineExceeded {
                operation,
                timeout_ms,
            },
            InfrastructureError::Serialization(e) => OtpError::Serialization {
                message: e.to_string(),
            },
            other => OtpError::StoreUnavailable {
                message: other.to_string(),
            },
        }
    }
}
