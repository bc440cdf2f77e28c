pub mod otp;

pub use otp::{otp_key, InMemoryOtpRepository, OtpRepository};
