//! Redis cache client implementation
//!
//! This module provides a Redis client with deadline-bounded commands, retry
//! logic for idempotent operations, and the primitives the OTP store builds
//! on: `SET .. PX`, `GET`, `DEL`, `PTTL`, server-side scripts, and dedicated
//! connections for `WATCH`-based transactions.

use redis::{
    aio::MultiplexedConnection, AsyncCommands, Client, FromRedisValue, RedisError, RedisResult,
    Script,
};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use otp_shared::config::CacheConfig;
use otp_shared::phone::mask_phone_number;

use crate::InfrastructureError;

/// Upper bound for the retry backoff
const MAX_RETRY_DELAY_MS: u64 = 5000;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Redis cache client with a shared multiplexed connection
///
/// Every command is bounded by `response_timeout_ms`. Only idempotent commands
/// go through the retry loop; scripts and transactions are issued once.
#[derive(Clone)]
pub struct RedisClient {
    /// Handle used to open dedicated connections
    client: Client,
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
}

impl RedisClient {
    /// Create a new Redis client
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    ///
    /// # Example
    /// ```no_run
    /// use otp_shared::config::CacheConfig;
    /// use otp_infra::cache::RedisClient;
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("redis://localhost:6379");
    ///     let client = RedisClient::new(config).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        config.validate()?;
        let url = config.connection_url();

        info!(
            url = %mask_url(&url),
            max_retries = config.max_retries,
            response_timeout_ms = config.response_timeout_ms,
            "Creating Redis client"
        );

        let client = Client::open(url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(&client, &config).await?;

        info!("Redis client created successfully");

        Ok(Self {
            client,
            connection,
            config,
        })
    }

    /// Create multiplexed connection with retry logic
    async fn create_connection_with_retry(
        client: &Client,
        config: &CacheConfig,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let max_attempts = config.max_retries.max(1);
        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        let mut attempts = 0;
        let mut delay = config.retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let outcome = timeout(connect_timeout, client.get_multiplexed_async_connection()).await;
            let err = match outcome {
                Ok(Ok(connection)) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Ok(Err(e)) => InfrastructureError::Cache(e),
                Err(_) => InfrastructureError::Timeout {
                    operation: "CONNECT".to_string(),
                    timeout_ms: config.connection_timeout_ms,
                },
            };

            if attempts >= max_attempts {
                error!(
                    "Failed to connect to Redis after {} attempts: {}",
                    attempts, err
                );
                return Err(err);
            }

            warn!(
                "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                attempts, max_attempts, err, delay
            );
            sleep(Duration::from_millis(delay)).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Apply the configured key prefix
    pub fn make_key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    /// Per-command deadline
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.config.response_timeout_ms)
    }

    /// Set a value that expires after `ttl_ms` milliseconds
    pub async fn set_px(&self, key: &str, value: &str, ttl_ms: u64) -> Result<(), InfrastructureError> {
        debug!("Setting key '{}' with expiry {}ms", mask_key(key), ttl_ms);

        self.execute_with_retry("SET", |mut conn| {
            let key = key.to_string();
            let value = value.to_string();
            let expiry = ttl_ms;

            Box::pin(async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("PX")
                    .arg(expiry)
                    .query_async::<_, ()>(&mut conn)
                    .await
            })
        })
        .await
        .map_err(|e| {
            error!("Failed to set key '{}': {}", mask_key(key), e);
            e
        })
    }

    /// Get a value from cache
    ///
    /// # Returns
    /// * `Result<Option<String>, InfrastructureError>` - Cached value or None if not found
    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        debug!("Getting key '{}'", mask_key(key));

        let value = self
            .execute_with_retry("GET", |mut conn| {
                let key = key.to_string();

                Box::pin(async move { conn.get::<_, Option<String>>(key).await })
            })
            .await
            .map_err(|e| {
                error!("Failed to get key '{}': {}", mask_key(key), e);
                e
            })?;

        if value.is_some() {
            debug!("Successfully retrieved key '{}'", mask_key(key));
        } else {
            debug!("Key '{}' not found", mask_key(key));
        }
        Ok(value)
    }

    /// Delete a key from cache
    ///
    /// # Returns
    /// * `Result<bool, InfrastructureError>` - True if key was deleted, false if not found
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        debug!("Deleting key '{}'", mask_key(key));

        let deleted_count = self
            .execute_with_retry("DEL", |mut conn| {
                let key = key.to_string();

                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await
            .map_err(|e| {
                error!("Failed to delete key '{}': {}", mask_key(key), e);
                e
            })?;

        Ok(deleted_count > 0)
    }

    /// Remaining time-to-live of a key in milliseconds
    ///
    /// # Returns
    /// * `None` if the key does not exist or has no expiry
    pub async fn ttl_ms(&self, key: &str) -> Result<Option<i64>, InfrastructureError> {
        debug!("Getting TTL for key '{}'", mask_key(key));

        let ttl = self
            .execute_with_retry("PTTL", |mut conn| {
                let key = key.to_string();

                Box::pin(async move { conn.pttl::<_, i64>(key).await })
            })
            .await?;

        match ttl {
            ttl if ttl >= 0 => Ok(Some(ttl)),
            -1 => {
                debug!("Key '{}' exists but has no expiry", mask_key(key));
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Run a server-side script against a single key.
    ///
    /// Issued exactly once: a script may have been applied even when its
    /// reply is lost, so it is never retried here.
    pub async fn invoke_script<T>(
        &self,
        script: &Script,
        key: &str,
        args: &[&str],
    ) -> Result<T, InfrastructureError>
    where
        T: FromRedisValue + Send,
    {
        let mut invocation = script.key(key);
        for arg in args {
            invocation.arg(*arg);
        }

        let mut conn = self.connection.clone();
        self.with_deadline("EVALSHA", invocation.invoke_async::<_, T>(&mut conn))
            .await
    }

    /// Open a connection that no other caller shares.
    ///
    /// Needed for `WATCH`, whose state is per connection.
    pub async fn dedicated_connection(&self) -> Result<MultiplexedConnection, InfrastructureError> {
        self.with_deadline("CONNECT", self.client.get_multiplexed_async_connection())
            .await
    }

    /// Bound `fut` by the response deadline.
    pub async fn with_deadline<T, F>(&self, operation: &str, fut: F) -> Result<T, InfrastructureError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.response_timeout(), fut).await {
            Ok(result) => result.map_err(InfrastructureError::Cache),
            Err(_) => {
                warn!(
                    operation = operation,
                    timeout_ms = self.config.response_timeout_ms,
                    "Redis command exceeded its deadline"
                );
                Err(InfrastructureError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms: self.config.response_timeout_ms,
                })
            }
        }
    }

    /// Execute an idempotent Redis operation with automatic retry logic
    ///
    /// Each attempt is bounded by the response deadline. Timeouts and
    /// transient connection errors are retried with exponential backoff.
    async fn execute_with_retry<F, T>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, InfrastructureError>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempts = 0;
        let mut delay = self.config.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            let err = match self.with_deadline(operation_name, operation(conn)).await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            let retriable = match &err {
                InfrastructureError::Cache(e) => is_retriable_error(e),
                InfrastructureError::Timeout { .. } => true,
                _ => false,
            };
            if !retriable || attempts >= max_attempts {
                error!(
                    "Redis operation {} failed after {} attempts: {}",
                    operation_name, attempts, err
                );
                return Err(err);
            }

            warn!(
                "Redis operation {} failed (attempt {}/{}): {}. Retrying in {}ms...",
                operation_name, attempts, max_attempts, err, delay
            );
            sleep(Duration::from_millis(delay)).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
        }
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a PING command to verify connectivity.
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        debug!("Performing Redis health check");

        let response = self
            .execute_with_retry("PING", |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await?;

        if response == "PONG" {
            debug!("Redis health check passed");
            Ok(true)
        } else {
            warn!("Redis health check returned unexpected response: {}", response);
            Ok(false)
        }
    }
}

/// Check if a Redis error is retriable
///
/// Determines if an error is transient and the operation should be retried.
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_connection_dropped()
        || matches!(
            error.kind(),
            redis::ErrorKind::BusyLoadingError | redis::ErrorKind::TryAgain
        )
}

/// Mask the trailing phone segment of a key for logging
pub(crate) fn mask_key(key: &str) -> String {
    match key.rsplit_once(':') {
        Some((scope, phone)) => format!("{}:{}", scope, mask_phone_number(phone)),
        None => mask_phone_number(key),
    }
}

/// Mask credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
