//! Error types for the OTP lifecycle.

mod types;


pub use types::{OtpError, OtpResult};
