//! Development sender that records deliveries in the log.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use otp_core::{Code, OtpSender, PhoneNumber};

/// `OtpSender` that only logs the (masked) destination.
///
/// The code itself is never written out.
#[derive(Clone)]
pub struct LogOtpSender {
    /// Counter for tracking number of messages sent
    message_count: Arc<AtomicU64>,
    /// Whether to simulate failures (for testing)
    simulate_failure: bool,
}

impl LogOtpSender {
    pub fn new() -> Self {
        Self {
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: false,
        }
    }

    /// A sender whose every delivery fails
    pub fn failing() -> Self {
        Self {
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: true,
        }
    }

    /// Get the total number of messages sent
    pub fn get_message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }
}

impl Default for LogOtpSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, phone: &PhoneNumber, code: &Code) -> Result<String, String> {
        if self.simulate_failure {
            warn!(
                target: "sms_service",
                provider = "log",
                phone = %phone.masked(),
                "Log sender simulating failure"
            );
            return Err("Simulated SMS sending failure".to_string());
        }

        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        let message_id = format!("log_{}", count);

        info!(
            target: "sms_service",
            provider = "log",
            phone = %phone.masked(),
            message_id = %message_id,
            code_length = code.expose().len(),
            "OTP delivered (log)"
        );

        Ok(message_id)
    }
}
