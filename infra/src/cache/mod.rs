//! Cache module for Redis-based OTP storage
//!
//! This module provides the Redis client (deadlines, retry logic, scripts)
//! and the Redis implementation of the core `OtpRepository`.

pub mod otp_store;
pub mod redis_client;


pub use otp_store::RedisOtpRepository;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use otp_shared::config::CacheConfig;
