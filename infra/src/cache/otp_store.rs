//! Redis-backed OTP store
//!
//! Records live under `otp:<tenant_id>:<phone>` (behind the configured key
//! prefix) as JSON `{"code": "...", "expires_at": "<RFC3339>"}` with a
//! millisecond `PX` expiry, so Redis itself removes expired codes.
//!
//! `consume` is atomic in one of two ways, chosen by `ConsumeStrategy`:
//! - `Script`: a Lua script compares and deletes in a single server step
//! - `Watch`: `WATCH`/`GET`/`MULTI DEL EXEC` on a dedicated connection,
//!   retried a bounded number of times when another client touches the key

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use otp_core::repositories::otp_key;
use otp_core::services::otp::{Clock, SystemClock};
use otp_core::{Code, Otp, OtpError, OtpRepository, OtpResult, PhoneNumber};
use otp_shared::config::{ConsumeStrategy, OtpConfig};

use crate::cache::redis_client::mask_key;
use crate::cache::RedisClient;
use crate::InfrastructureError;

/// Reply of the consume script when the stored payload cannot be decoded
const MALFORMED: i64 = -1;

/// Compare-and-delete executed atomically by Redis.
///
/// Returns 1 when the code matched and the key was deleted, 0 when the key is
/// absent or holds another code, -1 when the payload is not a valid record.
static CONSUME_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
    return 0
end
local ok, record = pcall(cjson.decode, raw)
if not ok or type(record) ~= 'table' or type(record['code']) ~= 'string' then
    return -1
end
if record['code'] ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
return 1
"#,
    )
});

/// Stored payload
#[derive(Debug, Serialize, Deserialize)]
struct StoredOtp {
    code: String,
    expires_at: DateTime<Utc>,
}

/// `OtpRepository` on top of Redis
#[derive(Clone)]
pub struct RedisOtpRepository {
    redis_client: RedisClient,
    clock: Arc<dyn Clock>,
    strategy: ConsumeStrategy,
    max_attempts: u32,
}

impl RedisOtpRepository {
    pub fn new(redis_client: RedisClient, config: &OtpConfig) -> Self {
        Self {
            redis_client,
            clock: Arc::new(SystemClock),
            strategy: config.consume_strategy,
            max_attempts: config.consume_max_attempts.max(1),
        }
    }

    /// Replace the clock used to compute the `PX` expiry on save
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn strategy(&self) -> ConsumeStrategy {
        self.strategy
    }

    /// Full Redis key for a `(tenant_id, phone)` pair
    pub fn key_for(&self, tenant_id: &str, phone: &PhoneNumber) -> String {
        self.redis_client.make_key(&otp_key(tenant_id, phone))
    }

    /// Time left before Redis expires the record, `None` when absent
    pub async fn remaining_ttl(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<Option<Duration>> {
        let key = self.key_for(tenant_id, phone);
        let ttl = self.redis_client.ttl_ms(&key).await?;
        Ok(ttl.map(Duration::milliseconds))
    }

    /// Script strategy: one server-side compare-and-delete
    async fn consume_with_script(&self, key: &str, code: &Code) -> OtpResult<bool> {
        let reply: i64 = self
            .redis_client
            .invoke_script(&CONSUME_SCRIPT, key, &[code.expose()])
            .await
            .map_err(|e| outcome_unknown("EVALSHA", e))?;

        match reply {
            1 => Ok(true),
            MALFORMED => Err(malformed()),
            _ => Ok(false),
        }
    }

    /// Watch strategy: optimistic transaction on a dedicated connection
    async fn consume_with_watch(&self, key: &str, code: &Code) -> OtpResult<bool> {
        let client = &self.redis_client;
        let mut conn = client.dedicated_connection().await?;

        for attempt in 1..=self.max_attempts {
            client
                .with_deadline(
                    "WATCH",
                    redis::cmd("WATCH").arg(key).query_async::<_, ()>(&mut conn),
                )
                .await?;

            let raw: Option<String> = client
                .with_deadline("GET", redis::cmd("GET").arg(key).query_async(&mut conn))
                .await?;

            let matched = match raw {
                Some(raw) => decode(&raw)?.0.matches(code),
                None => false,
            };
            if !matched {
                client
                    .with_deadline(
                        "UNWATCH",
                        redis::cmd("UNWATCH").query_async::<_, ()>(&mut conn),
                    )
                    .await?;
                return Ok(false);
            }

            // Nil reply: the key changed after WATCH and EXEC discarded the DEL.
            let committed: Option<(i64,)> = client
                .with_deadline(
                    "EXEC",
                    redis::pipe().atomic().del(key).query_async(&mut conn),
                )
                .await
                .map_err(|e| outcome_unknown("EXEC", e))?;

            match committed {
                Some((deleted,)) => return Ok(deleted > 0),
                None => debug!(
                    key = %mask_key(key),
                    attempt = attempt,
                    "Consume transaction aborted by a concurrent write"
                ),
            }
        }

        warn!(
            key = %mask_key(key),
            attempts = self.max_attempts,
            event = "otp_consume_contention",
            "Consume gave up after repeated conflicts"
        );
        Err(OtpError::ConsumeContention {
            attempts: self.max_attempts,
        })
    }
}

/// Decode a stored payload into a validated code and expiry
fn decode(raw: &str) -> OtpResult<(Code, DateTime<Utc>)> {
    let stored: StoredOtp = serde_json::from_str(raw)
        .map_err(|e| OtpError::from(InfrastructureError::Serialization(e)))?;
    let code = Code::parse(&stored.code).map_err(|_| malformed())?;
    Ok((code, stored.expires_at))
}

/// A failed or timed-out mutating command may still have been applied.
fn outcome_unknown(operation: &str, err: InfrastructureError) -> OtpError {
    warn!(
        operation = operation,
        error = %err,
        event = "otp_consume_outcome_unknown",
        "Consume failed after the delete may have been applied"
    );
    OtpError::ConsumeOutcomeUnknown {
        operation: operation.to_string(),
        message: err.to_string(),
    }
}

fn malformed() -> OtpError {
    OtpError::Serialization {
        message: "stored record is not a valid OTP".to_string(),
    }
}

#[async_trait]
impl OtpRepository for RedisOtpRepository {
    async fn save(&self, otp: &Otp) -> OtpResult<()> {
        let remaining_ms = otp.remaining(self.clock.now()).num_milliseconds();
        if remaining_ms <= 0 {
            debug!(
                tenant_id = %otp.tenant_id,
                phone = %otp.phone.masked(),
                "Skipping save of an already expired OTP"
            );
            return Ok(());
        }

        let payload = serde_json::to_string(&StoredOtp {
            code: otp.code.expose().to_string(),
            expires_at: otp.expires_at,
        })
        .map_err(InfrastructureError::from)?;

        let key = self.key_for(&otp.tenant_id, &otp.phone);
        self.redis_client
            .set_px(&key, &payload, remaining_ms as u64)
            .await?;

        debug!(
            tenant_id = %otp.tenant_id,
            phone = %otp.phone.masked(),
            ttl_ms = remaining_ms,
            "Stored OTP in Redis"
        );
        Ok(())
    }

    async fn get(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<Otp> {
        let key = self.key_for(tenant_id, phone);
        let raw = self
            .redis_client
            .get(&key)
            .await?
            .ok_or(OtpError::NotFound)?;

        let (code, expires_at) = decode(&raw)?;
        Ok(Otp::new(tenant_id, phone.clone(), code, expires_at))
    }

    async fn delete(&self, tenant_id: &str, phone: &PhoneNumber) -> OtpResult<()> {
        let key = self.key_for(tenant_id, phone);
        self.redis_client.delete(&key).await?;
        Ok(())
    }

    async fn consume(&self, tenant_id: &str, phone: &PhoneNumber, code: &Code) -> OtpResult<bool> {
        let key = self.key_for(tenant_id, phone);
        let consumed = match self.strategy {
            ConsumeStrategy::Script => self.consume_with_script(&key, code).await?,
            ConsumeStrategy::Watch => self.consume_with_watch(&key, code).await?,
        };

        debug!(
            tenant_id = tenant_id,
            phone = %phone.masked(),
            strategy = ?self.strategy,
            consumed = consumed,
            "Consume finished"
        );
        Ok(consumed)
    }
}
