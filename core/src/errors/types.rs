//! OTP error taxonomy
//!
//! Errors fall into four groups that callers treat differently:
//! validation errors are terminal and never retried, `NotFound` is a normal
//! "verification failed" outcome, most store faults are transient, and
//! generation/delivery failures end the issuance request.
//!
//! `ConsumeOutcomeUnknown` is a store fault that is not transient: the
//! delete may already have happened, so repeating the consume could turn a
//! correct code into a `false`.

use otp_shared::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("otp: invalid phone number")]
    InvalidPhone,

    #[error("otp: invalid ttl")]
    InvalidTtl,

    #[error("otp: invalid code")]
    InvalidCode,

    #[error("otp: invalid business id")]
    InvalidBusiness,

    #[error("otp: not found")]
    NotFound,

    #[error("otp: code generation failed: {message}")]
    CodeGeneration { message: String },

    #[error("otp: delivery failed: {message}")]
    Delivery { message: String },

    #[error("otp: store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("otp: {operation} exceeded its {timeout_ms}ms deadline")]
    DeadlineExceeded { operation: String, timeout_ms: u64 },

    #[error("otp: consume aborted after {attempts} conflicting attempts")]
    ConsumeContention { attempts: u32 },

    #[error("otp: outcome of {operation} unknown: {message}")]
    ConsumeOutcomeUnknown { operation: String, message: String },

    #[error("otp: stored record is malformed: {message}")]
    Serialization { message: String },
}

pub type OtpResult<T> = Result<T, OtpError>;

impl OtpError {
    /// Input rejected before touching any state
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OtpError::InvalidPhone
                | OtpError::InvalidTtl
                | OtpError::InvalidCode
                | OtpError::InvalidBusiness
        )
    }

    /// Transient backing-store condition; the request may be repeated
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OtpError::StoreUnavailable { .. }
                | OtpError::DeadlineExceeded { .. }
                | OtpError::ConsumeContention { .. }
        )
    }

    /// Stable client-facing error code
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidPhone => error_codes::PHONE_INVALID,
            OtpError::InvalidTtl => error_codes::TTL_INVALID,
            OtpError::InvalidCode => error_codes::CODE_INVALID,
            OtpError::InvalidBusiness => error_codes::BUSINESS_INVALID,
            OtpError::NotFound => error_codes::NOT_FOUND,
            OtpError::CodeGeneration { .. } => error_codes::CODE_GENERATION_FAILED,
            OtpError::Delivery { .. } => error_codes::DELIVERY_FAILED,
            OtpError::StoreUnavailable { .. } => error_codes::STORE_UNAVAILABLE,
            OtpError::DeadlineExceeded { .. } => error_codes::STORE_TIMEOUT,
            OtpError::ConsumeContention { .. } => error_codes::STORE_CONTENTION,
            OtpError::ConsumeOutcomeUnknown { .. } => error_codes::STORE_OUTCOME_UNKNOWN,
            OtpError::Serialization { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    fn status(&self) -> u16 {
        match self {
            e if e.is_validation() => 400,
            OtpError::NotFound => 404,
            OtpError::Delivery { .. } => 502,
            e if e.is_retryable() => 503,
            _ => 500,
        }
    }
}

impl IntoErrorResponse for OtpError {
    fn to_error_response(&self) -> ErrorResponse {
        // Internal details of store faults stay in the logs.
        let message = match self {
            OtpError::StoreUnavailable { .. } => "OTP store is temporarily unavailable".to_string(),
            OtpError::Serialization { .. } => "Stored code could not be read".to_string(),
            OtpError::ConsumeOutcomeUnknown { .. } => {
                "Verification result is unknown, request a new code".to_string()
            }
            OtpError::CodeGeneration { .. } => "Unable to issue a code right now".to_string(),
            other => other.to_string(),
        };
        ErrorResponse::new(self.code(), message, self.status()).retryable(self.is_retryable())
    }
}
