//! OTP application service orchestrating issuance, delivery and consumption

use std::sync::Arc;

use crate::domain::entities::Otp;
use crate::domain::value_objects::{Code, PhoneNumber};
use crate::errors::{OtpError, OtpResult};
use crate::repositories::OtpRepository;

use super::domain_service::OtpDomainService;
use super::traits::OtpSender;

/// Entry point for the transport layer.
///
/// Issuance is store-then-send: the record is persisted before delivery is
/// attempted, and a delivery failure leaves it in place until it expires or
/// is replaced. Verification goes through the store's atomic `consume` so a
/// code can succeed at most once.
pub struct OtpAppService<R: OtpRepository, S: OtpSender> {
    repository: Arc<R>,
    sender: Arc<S>,
    domain: OtpDomainService,
}

impl<R: OtpRepository, S: OtpSender> OtpAppService<R, S> {
    pub fn new(repository: Arc<R>, sender: Arc<S>, domain: OtpDomainService) -> Self {
        Self {
            repository,
            sender,
            domain,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn domain(&self) -> &OtpDomainService {
        &self.domain
    }

    /// Issue a code for `(tenant_id, raw_phone)`, store it and deliver it.
    ///
    /// # Errors
    ///
    /// * `InvalidPhone` / `InvalidBusiness` for malformed input
    /// * `CodeGeneration` when no code could be drawn
    /// * store faults from `save`, in which case nothing was sent
    /// * `Delivery` when the sender fails; the stored record is kept
    pub async fn issue_otp(&self, tenant_id: &str, raw_phone: &str) -> OtpResult<Otp> {
        let phone = PhoneNumber::new(raw_phone)?;
        let otp = self.domain.new_otp(tenant_id, &phone)?;

        self.repository.save(&otp).await.map_err(|e| {
            tracing::error!(
                tenant_id = tenant_id,
                phone = %phone.masked(),
                error = %e,
                event = "otp_storage_failed",
                "Failed to store OTP"
            );
            e
        })?;

        tracing::info!(
            tenant_id = tenant_id,
            phone = %phone.masked(),
            expires_at = %otp.expires_at,
            event = "otp_issued",
            "Issued OTP"
        );

        match self.sender.send(&phone, &otp.code).await {
            Ok(message_id) => {
                tracing::debug!(
                    tenant_id = tenant_id,
                    phone = %phone.masked(),
                    message_id = %message_id,
                    event = "otp_sent",
                    "Delivered OTP"
                );
                Ok(otp)
            }
            Err(message) => {
                tracing::error!(
                    tenant_id = tenant_id,
                    phone = %phone.masked(),
                    error = %message,
                    event = "otp_delivery_failed",
                    "Failed to deliver OTP"
                );
                Err(OtpError::Delivery { message })
            }
        }
    }

    /// Atomically check and consume a candidate code.
    ///
    /// Returns `Ok(false)` for an absent, expired or mismatched code. Store
    /// faults are returned as errors, never folded into `false`.
    pub async fn verify_otp(
        &self,
        tenant_id: &str,
        raw_phone: &str,
        raw_code: &str,
    ) -> OtpResult<bool> {
        let phone = PhoneNumber::new(raw_phone)?;
        let code = Code::parse(raw_code)?;
        if tenant_id.trim().is_empty() {
            return Err(OtpError::InvalidBusiness);
        }

        let consumed = match self.repository.consume(tenant_id, &phone, &code).await {
            Ok(consumed) => consumed,
            Err(OtpError::NotFound) => false,
            Err(e) => {
                tracing::error!(
                    tenant_id = tenant_id,
                    phone = %phone.masked(),
                    error = %e,
                    retryable = e.is_retryable(),
                    event = "otp_consume_failed",
                    "Failed to consume OTP"
                );
                return Err(e);
            }
        };

        if consumed {
            tracing::info!(
                tenant_id = tenant_id,
                phone = %phone.masked(),
                event = "otp_verified",
                "OTP verified and consumed"
            );
        } else {
            tracing::warn!(
                tenant_id = tenant_id,
                phone = %phone.masked(),
                event = "otp_verification_failed",
                "OTP verification failed"
            );
        }

        Ok(consumed)
    }

    /// Drop any live code for `(tenant_id, raw_phone)`.
    pub async fn revoke_otp(&self, tenant_id: &str, raw_phone: &str) -> OtpResult<()> {
        let phone = PhoneNumber::new(raw_phone)?;
        if tenant_id.trim().is_empty() {
            return Err(OtpError::InvalidBusiness);
        }

        self.repository.delete(tenant_id, &phone).await?;
        tracing::info!(
            tenant_id = tenant_id,
            phone = %phone.masked(),
            event = "otp_revoked",
            "Revoked OTP"
        );
        Ok(())
    }
}
