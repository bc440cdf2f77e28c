//! In-process implementation of OtpRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entities::Otp;
use crate::domain::value_objects::{Code, PhoneNumber};
use crate::errors::{OtpError, OtpResult};
use crate::services::otp::{Clock, SystemClock};

use super::{otp_key, OtpRepository};

/// Mutex-guarded map honouring the same contract as the Redis store.
///
/// Expiry is driven by the injected clock: an entry whose deadline has passed
/// is treated as absent and dropped on the next access to its key, and every
/// `save` sweeps all expired entries. `consume` holds the lock across read,
/// compare and delete, which makes it atomic.
pub struct InMemoryOtpRepository {
    entries: Mutex<HashMap<String, Otp>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock: Arc::new(clock),
        }
    }

    /// Number of live records
    pub fn len(&self) -> OtpResult<usize> {
        let now = self.clock.now();
        Ok(self.lock()?.values().filter(|otp| !otp.expired(now)).count())
    }

    pub fn is_empty(&self) -> OtpResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Entries held in the map, expired or not
    #[cfg(test)]
    pub(crate) fn stored_entries(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn raw_lock(&self) -> std::sync::LockResult<MutexGuard<'_, HashMap<String, Otp>>> {
        self.entries.lock()
    }

    fn lock(&self) -> OtpResult<MutexGuard<'_, HashMap<String, Otp>>> {
        self.entries.lock().map_err(|_| OtpError::StoreUnavailable {
            message: "in-memory store lock poisoned".to_string(),
        })
    }

    /// Remove `key` if its deadline has passed, returning the live entry otherwise.
    fn live<'a>(
        entries: &'a mut HashMap<String, Otp>,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<&'a Otp> {
        let expired = entries.get(key).map(|otp| otp.expired(now))?;
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key)
    }
}

impl Default for InMemoryOtpRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn save(&self, otp: &Otp) -> OtpResult<()> {
        let now = self.clock.now();
        if otp.remaining(now) <= chrono::Duration::zero() {
            tracing::debug!(
                tenant_id = %otp.tenant_id,
                phone = %otp.phone.masked(),
                "Skipping save of an already expired OTP"
            );
            return Ok(());
        }

        let key = otp_key(&otp.tenant_id, &otp.phone);
        let mut entries = self.lock()?;
        entries.retain(|_, stored| !stored.expired(now));
        entries.insert(key, otp.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<Otp> {
        let now = self.clock.now();
        let key = otp_key(tenant_id, phone);
        let mut entries = self.lock()?;
        Self::live(&mut entries, &key, now)
            .cloned()
            .ok_or(OtpError::NotFound)
    }

    async fn delete(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<()> {
        let key = otp_key(tenant_id, phone);
        self.lock()?.remove(&key);
        Ok(())
    }

    async fn consume(&self, tenant_id: &str, phone: &PhoneNumber, code: &Code) -> OtpResult<bool> {
        let now = self.clock.now();
        let key = otp_key(tenant_id, phone);
        let mut entries = self.lock()?;

        let matched = match Self::live(&mut entries, &key, now) {
            Some(stored) => stored.code.matches(code),
            None => return Ok(false),
        };
        if matched {
            entries.remove(&key);
        }
        Ok(matched)
    }
}
