//! Shared error types and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error payload handed to the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status the transport should use
    #[serde(skip)]
    pub status: u16,

    /// Whether the client may retry the same request
    #[serde(default)]
    pub retryable: bool,

    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status,
            retryable: false,
            timestamp: Utc::now(),
        }
    }

    /// Mark the error as transient
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

/// Error codes exposed to clients
pub mod error_codes {
    pub const PHONE_INVALID: &str = "PHONE_INVALID";
    pub const TTL_INVALID: &str = "TTL_INVALID";
    pub const CODE_INVALID: &str = "CODE_INVALID";
    pub const BUSINESS_INVALID: &str = "BUSINESS_INVALID";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CODE_GENERATION_FAILED: &str = "CODE_GENERATION_FAILED";
    pub const DELIVERY_FAILED: &str = "DELIVERY_FAILED";
    pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
    pub const STORE_TIMEOUT: &str = "STORE_TIMEOUT";
    pub const STORE_CONTENTION: &str = "STORE_CONTENTION";
    pub const STORE_OUTCOME_UNKNOWN: &str = "STORE_OUTCOME_UNKNOWN";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Trait for converting errors to ErrorResponse
pub trait IntoErrorResponse {
    fn to_error_response(&self) -> ErrorResponse;
}
