//! Collaborator traits for the OTP application service

use async_trait::async_trait;

use crate::domain::value_objects::{Code, PhoneNumber};

/// Delivery channel for issued codes (SMS gateway, log sink, ...).
#[async_trait]
pub trait OtpSender: Send + Sync {
    /// Deliver `code` to `phone`.
    ///
    /// # Returns
    ///
    /// * `Ok(message_id)` - Provider reference for the delivery
    /// * `Err(String)` - Provider error description
    async fn send(&self, phone: &PhoneNumber, code: &Code) -> Result<String, String>;
}
