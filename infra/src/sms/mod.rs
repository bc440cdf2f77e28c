//! SMS Module
//!
//! Delivery adapters implementing the core `OtpSender` capability.
//!
//! - **Log sender**: records deliveries through `tracing` for development
//! - **Security**: phone numbers are masked and codes are never written out

mod log_sender;

pub use log_sender::LogOtpSender;
