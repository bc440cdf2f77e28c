//! Domain entities representing core business objects.

pub mod otp;

pub use otp::Otp;
