//! Example demonstrating the OTP lifecycle against Redis
//!
//! This example shows how to:
//! - Load configuration and initialize tracing
//! - Issue an OTP (store-then-send)
//! - Verify it once, and see the second attempt fail
//! - Run concurrent verifications where exactly one wins
//!
//! Run with: `REDIS_URL=redis://127.0.0.1:6379 cargo run -p otp_infra --example otp_lifecycle_demo`

use std::sync::Arc;

use anyhow::Context;
use otp_shared::IntoErrorResponse;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = otp_infra::load_config().context("loading configuration")?;
    otp_infra::telemetry::init_tracing(&config.logging).context("initializing tracing")?;

    println!("OTP Lifecycle Demo");
    println!("==================\n");

    // 1. Wire Redis, the store and the services
    let services = otp_infra::initialize(&config)
        .await
        .context("connecting to Redis")?;
    println!(
        "✓ Connected to Redis (consume strategy: {:?})\n",
        services.otp_repository.strategy()
    );

    let service = services.otp_service.clone();
    let tenant_id = "demo-shop";
    let phone = "09123456789";

    // 2. Issue a code
    let otp = service.issue_otp(tenant_id, phone).await?;
    println!("✓ Issued OTP for {} expiring at {}", otp.phone.masked(), otp.expires_at);

    if let Some(ttl) = services
        .otp_repository
        .remaining_ttl(tenant_id, &otp.phone)
        .await?
    {
        println!("  Redis TTL: {}ms\n", ttl.num_milliseconds());
    }

    // 3. Wrong code first, then the right one twice
    let wrong = if otp.code.expose() == "000000" { "111111" } else { "000000" };
    println!("Verify with wrong code: {}", service.verify_otp(tenant_id, phone, wrong).await?);
    println!(
        "Verify with issued code: {}",
        service.verify_otp(tenant_id, phone, otp.code.expose()).await?
    );
    println!(
        "Verify again (already consumed): {}\n",
        service.verify_otp(tenant_id, phone, otp.code.expose()).await?
    );

    // 4. Concurrent verification of a fresh code
    let otp = service.issue_otp(tenant_id, phone).await?;
    let code = Arc::new(otp.code.expose().to_string());
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move { service.verify_otp(tenant_id, phone, &code).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await?? {
            winners += 1;
        }
    }
    println!("✓ {} of 10 concurrent verifications succeeded\n", winners);

    // 5. Validation errors map to client-facing responses
    let err = service
        .verify_otp(tenant_id, "8123456789", "123456")
        .await
        .unwrap_err();
    let response = err.to_error_response();
    println!(
        "Invalid phone -> {} {} ({})",
        response.status, response.error, response.message
    );

    Ok(())
}
