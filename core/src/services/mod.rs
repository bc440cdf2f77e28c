//! Business services containing domain logic and use cases.

pub mod otp;

pub use otp::{
    Clock, CodeGenerator, OtpAppService, OtpDomainService, OtpSender, SecureCodeGenerator,
    SystemClock,
};
