//! OTP entity issued to a (tenant, phone) pair.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_objects::{Code, PhoneNumber};

/// A one-time password bound to a tenant and phone number.
///
/// Identity for storage is `(tenant_id, phone)`. Instances are never mutated:
/// issuing a new code for the same pair replaces the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    /// Tenant ("business") the code was issued under
    pub tenant_id: String,

    /// Destination phone number
    pub phone: PhoneNumber,

    /// The 6-digit code
    pub code: Code,

    /// Instant from which the code is no longer valid
    pub expires_at: DateTime<Utc>,
}

impl Otp {
    pub fn new(
        tenant_id: impl Into<String>,
        phone: PhoneNumber,
        code: Code,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            phone,
            code,
            expires_at,
        }
    }

    /// True iff `now >= expires_at`; the instant of expiry is already expired.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero or negative once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Whether this record is stored under the given key
    pub fn belongs_to(&self, tenant_id: &str, phone: &PhoneNumber) -> bool {
        self.tenant_id == tenant_id && &self.phone == phone
    }
}
