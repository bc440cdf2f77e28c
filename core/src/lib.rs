//! # OTP Core
//!
//! Domain layer of the OTP service: validated value types, the OTP entity,
//! issuance and verification services, the store contract with its atomic
//! `consume` primitive, and the error taxonomy shared by every layer above.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{validate_code, Code, CodeTtl, Otp, PhoneNumber, CODE_LENGTH};
pub use errors::{OtpError, OtpResult};
pub use repositories::{otp_key, InMemoryOtpRepository, OtpRepository};
pub use services::{
    Clock, CodeGenerator, OtpAppService, OtpDomainService, OtpSender, SecureCodeGenerator,
    SystemClock,
};
