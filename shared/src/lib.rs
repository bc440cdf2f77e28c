//! Shared utilities and common types for the OTP service
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error response structures
//! - Utility functions (phone masking)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, ConsumeStrategy, Environment, LogFormat, LoggingConfig,
    OtpConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use utils::phone;
