//! OTP service module
//!
//! - `OtpDomainService`: pure issuance and verification rules
//! - `OtpAppService`: store-then-send issuance and atomic verification
//! - `Clock` / `CodeGenerator`: injectable strategies for time and codes
//! - `OtpSender`: delivery collaborator

mod app_service;
mod clock;
mod domain_service;
mod generator;
mod traits;

#[cfg(test)]
mod tests;

pub use app_service::OtpAppService;
pub use clock::{Clock, SystemClock};
pub use domain_service::OtpDomainService;
pub use generator::{CodeGenerator, SecureCodeGenerator};
pub use traits::OtpSender;
