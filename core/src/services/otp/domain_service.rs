//! Pure OTP issuance and verification rules

use std::sync::Arc;

use crate::domain::entities::Otp;
use crate::domain::value_objects::{Code, CodeTtl, PhoneNumber};
use crate::errors::{OtpError, OtpResult};

use super::clock::{Clock, SystemClock};
use super::generator::{CodeGenerator, SecureCodeGenerator};

/// Issues new OTPs and checks candidates against a stored record.
///
/// Holds no mutable state; it is safe to share behind an `Arc` and call from
/// many tasks at once.
#[derive(Clone)]
pub struct OtpDomainService {
    ttl: CodeTtl,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn CodeGenerator>,
}

impl OtpDomainService {
    /// Create a service using the system clock and the secure generator.
    pub fn new(ttl: CodeTtl) -> Self {
        Self {
            ttl,
            clock: Arc::new(SystemClock),
            generator: Arc::new(SecureCodeGenerator),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the code source
    pub fn with_generator(mut self, generator: impl CodeGenerator + 'static) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn ttl(&self) -> CodeTtl {
        self.ttl
    }

    /// Current instant according to the injected clock
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Issue a fresh OTP expiring one TTL from now.
    ///
    /// # Errors
    ///
    /// * `InvalidBusiness` when `tenant_id` is empty or whitespace
    /// * `InvalidTtl` when the expiry is not representable
    /// * the generator's own error, or `InvalidCode` when it yields a
    ///   value that is not six digits
    pub fn new_otp(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<Otp> {
        if tenant_id.trim().is_empty() {
            return Err(OtpError::InvalidBusiness);
        }

        let raw = self.generator.generate()?;
        let code = Code::parse(&raw)?;

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl.as_duration())
            .ok_or(OtpError::InvalidTtl)?;
        Ok(Otp::new(tenant_id, phone.clone(), code, expires_at))
    }

    /// Check `candidate` against `stored` for the given tenant and phone.
    ///
    /// Returns `Ok(false)` when the record belongs to another key, has
    /// expired, or holds a different code. Malformed input is an error and
    /// is checked before anything else, code first.
    pub fn verify(
        &self,
        stored: &Otp,
        tenant_id: &str,
        phone: &PhoneNumber,
        candidate: &str,
    ) -> OtpResult<bool> {
        let candidate = Code::parse(candidate)?;
        if tenant_id.trim().is_empty() {
            return Err(OtpError::InvalidBusiness);
        }

        if !stored.belongs_to(tenant_id, phone) {
            return Ok(false);
        }
        if stored.expired(self.clock.now()) {
            return Ok(false);
        }

        Ok(stored.code.matches(&candidate))
    }
}

impl std::fmt::Debug for OtpDomainService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpDomainService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
