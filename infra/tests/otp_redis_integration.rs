//! Integration tests for the Redis OTP store
//!
//! Run with a local Redis: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rand::Rng;

    use otp_core::{Code, Otp, OtpError, OtpRepository, PhoneNumber};
    use otp_infra::cache::{RedisClient, RedisOtpRepository};
    use otp_shared::config::{AppConfig, CacheConfig, ConsumeStrategy, OtpConfig};

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    /// Random tenant so parallel runs never share keys
    fn tenant() -> String {
        format!("it-{}", rand::thread_rng().gen::<u64>())
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+989123456789").unwrap()
    }

    fn code(raw: &str) -> Code {
        Code::parse(raw).unwrap()
    }

    async fn repository(strategy: ConsumeStrategy) -> RedisOtpRepository {
        let client = RedisClient::new(CacheConfig::new(redis_url()).with_prefix("otp-it"))
            .await
            .expect("Failed to create Redis client");
        let config = OtpConfig {
            consume_strategy: strategy,
            ..OtpConfig::default()
        };
        RedisOtpRepository::new(client, &config)
    }

    fn live_otp(tenant_id: &str, raw_code: &str) -> Otp {
        Otp::new(tenant_id, phone(), code(raw_code), Utc::now() + Duration::minutes(5))
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_save_get_round_trip() {
        let repo = repository(ConsumeStrategy::Script).await;
        let tenant_id = tenant();
        let otp = live_otp(&tenant_id, "123456");

        repo.save(&otp).await.unwrap();
        let stored = repo.get(&tenant_id, &phone()).await.unwrap();

        assert_eq!(stored.code, otp.code);
        assert_eq!(stored.expires_at, otp.expires_at);

        let ttl = repo.remaining_ttl(&tenant_id, &phone()).await.unwrap().unwrap();
        assert!(ttl > Duration::minutes(4) && ttl <= Duration::minutes(5));

        repo.delete(&tenant_id, &phone()).await.unwrap();
        repo.delete(&tenant_id, &phone()).await.unwrap();
        assert_eq!(repo.get(&tenant_id, &phone()).await, Err(OtpError::NotFound));
        assert_eq!(repo.remaining_ttl(&tenant_id, &phone()).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_expired_save_is_never_retrievable() {
        let repo = repository(ConsumeStrategy::Script).await;
        let tenant_id = tenant();
        let otp = Otp::new(&tenant_id, phone(), code("123456"), Utc::now() - Duration::seconds(1));

        repo.save(&otp).await.unwrap();
        assert_eq!(repo.get(&tenant_id, &phone()).await, Err(OtpError::NotFound));
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_record_expires_with_store_ttl() {
        let repo = repository(ConsumeStrategy::Script).await;
        let tenant_id = tenant();
        let otp = Otp::new(
            &tenant_id,
            phone(),
            code("123456"),
            Utc::now() + Duration::milliseconds(300),
        );

        repo.save(&otp).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(600)).await;

        assert_eq!(repo.get(&tenant_id, &phone()).await, Err(OtpError::NotFound));
        assert!(!repo.consume(&tenant_id, &phone(), &code("123456")).await.unwrap());
    }

    async fn assert_consume_once(strategy: ConsumeStrategy) {
        let repo = repository(strategy).await;
        let tenant_id = tenant();
        repo.save(&live_otp(&tenant_id, "123456")).await.unwrap();

        assert!(!repo.consume(&tenant_id, &phone(), &code("654321")).await.unwrap());
        assert!(repo.get(&tenant_id, &phone()).await.is_ok());

        assert!(repo.consume(&tenant_id, &phone(), &code("123456")).await.unwrap());
        assert!(!repo.consume(&tenant_id, &phone(), &code("123456")).await.unwrap());
        assert_eq!(repo.get(&tenant_id, &phone()).await, Err(OtpError::NotFound));
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_consume_once_with_script() {
        assert_consume_once(ConsumeStrategy::Script).await;
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_consume_once_with_watch() {
        assert_consume_once(ConsumeStrategy::Watch).await;
    }

    async fn assert_concurrent_consume(strategy: ConsumeStrategy) {
        let repo = Arc::new(repository(strategy).await);
        let tenant_id = tenant();
        repo.save(&live_otp(&tenant_id, "123456")).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                let tenant_id = tenant_id.clone();
                tokio::spawn(async move { repo.consume(&tenant_id, &phone(), &code("123456")).await })
            })
            .collect();

        let mut consumed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(true) => consumed += 1,
                Ok(false) => {}
                // Exhausted optimistic retries are a transient error, never a success
                Err(OtpError::ConsumeContention { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(consumed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore] // Requires Redis to be running
    async fn test_concurrent_consume_with_script() {
        assert_concurrent_consume(ConsumeStrategy::Script).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore] // Requires Redis to be running
    async fn test_concurrent_consume_with_watch() {
        assert_concurrent_consume(ConsumeStrategy::Watch).await;
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_malformed_record_is_serialization_error() {
        let client = RedisClient::new(CacheConfig::new(redis_url()).with_prefix("otp-it"))
            .await
            .unwrap();
        let repo = RedisOtpRepository::new(client.clone(), &OtpConfig::default());
        let tenant_id = tenant();
        let key = repo.key_for(&tenant_id, &phone());

        client.set_px(&key, "not-json", 60_000).await.unwrap();

        assert!(matches!(
            repo.get(&tenant_id, &phone()).await,
            Err(OtpError::Serialization { .. })
        ));
        assert!(matches!(
            repo.consume(&tenant_id, &phone(), &code("123456")).await,
            Err(OtpError::Serialization { .. })
        ));

        client.delete(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_initialize_issue_and_verify() {
        let mut config = AppConfig::default();
        config.cache = CacheConfig::new(redis_url()).with_prefix("otp-it");

        let services = otp_infra::initialize(&config).await.unwrap();
        assert!(services.redis.health_check().await.unwrap());

        let tenant_id = tenant();
        let otp = services
            .otp_service
            .issue_otp(&tenant_id, "09123456789")
            .await
            .unwrap();

        let service = &services.otp_service;
        assert!(service
            .verify_otp(&tenant_id, "09123456789", otp.code.expose())
            .await
            .unwrap());
        assert!(!service
            .verify_otp(&tenant_id, "09123456789", otp.code.expose())
            .await
            .unwrap());
    }
}
