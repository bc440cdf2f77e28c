//! Store contract for issued OTPs.

use async_trait::async_trait;

use crate::domain::entities::Otp;
use crate::domain::value_objects::{Code, PhoneNumber};
use crate::errors::OtpResult;

/// TTL-bound storage of OTPs keyed by `(tenant_id, phone)`.
///
/// `save`, `get` and `delete` are single-key, last-write-wins operations.
/// `consume` is the only operation with a cross-call atomicity requirement.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Persist `otp` with an expiry of `otp.expires_at - now`.
    ///
    /// A record that is already expired at call time is silently not stored.
    /// Saving over an existing key replaces it.
    async fn save(&self, otp: &Otp) -> OtpResult<()>;

    /// Fetch the live record for a key.
    ///
    /// # Returns
    /// * `Err(OtpError::NotFound)` when nothing is stored or it has expired
    async fn get(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<Otp>;

    /// Remove a record. Deleting an absent key succeeds.
    async fn delete(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<()>;

    /// Atomically compare the stored code with `code` and delete the record on match.
    ///
    /// Read, compare and delete form one indivisible step with respect to every
    /// other operation on the same key: of N concurrent calls with the right
    /// code, exactly one returns `Ok(true)`. An absent or expired record, or a
    /// different code, yields `Ok(false)` and leaves the store untouched.
    async fn consume(&self, tenant_id: &str, phone: &PhoneNumber, code: &Code) -> OtpResult<bool>;
}
