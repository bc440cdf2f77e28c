//! Unit tests for the OTP application service

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::Otp;
use crate::domain::value_objects::{Code, CodeTtl, PhoneNumber};
use crate::errors::{OtpError, OtpResult};
use crate::repositories::{InMemoryOtpRepository, OtpRepository};
use crate::services::otp::{OtpAppService, OtpDomainService};

use super::mocks::MockOtpSender;

const PHONE: &str = "09123456789";

fn service(
    should_fail: bool,
) -> (
    OtpAppService<InMemoryOtpRepository, MockOtpSender>,
    Arc<InMemoryOtpRepository>,
    Arc<MockOtpSender>,
) {
    let repository = Arc::new(InMemoryOtpRepository::new());
    let sender = Arc::new(MockOtpSender::new(should_fail));
    let domain = OtpDomainService::new(CodeTtl::from_secs(300).unwrap());
    let service = OtpAppService::new(repository.clone(), sender.clone(), domain);
    (service, repository, sender)
}

/// Store whose every operation fails with a transient fault
struct UnavailableRepository;

#[async_trait]
impl OtpRepository for UnavailableRepository {
    async fn save(&self, _otp: &Otp) -> OtpResult<()> {
        Err(unavailable())
    }

    async fn get(&self, _tenant_id: &str, _phone: &PhoneNumber) -> OtpResult<Otp> {
        Err(unavailable())
    }

    async fn delete(&self, _tenant_id: &str, _phone: &PhoneNumber) -> OtpResult<()> {
        Err(unavailable())
    }

    async fn consume(&self, _tenant_id: &str, _phone: &PhoneNumber, _code: &Code) -> OtpResult<bool> {
        Err(unavailable())
    }
}

fn unavailable() -> OtpError {
    OtpError::StoreUnavailable {
        message: "connection refused".to_string(),
    }
}

#[tokio::test]
async fn test_issue_otp_stores_and_sends() {
    let (service, repository, sender) = service(false);

    let otp = service.issue_otp("b1", PHONE).await.unwrap();

    assert_eq!(sender.get_sent_code(PHONE), Some(otp.code.expose().to_string()));
    let stored = repository
        .get("b1", &PhoneNumber::new(PHONE).unwrap())
        .await
        .unwrap();
    assert_eq!(stored.code, otp.code);
}

#[tokio::test]
async fn test_issue_otp_invalid_input() {
    let (service, repository, sender) = service(false);

    assert_eq!(service.issue_otp("b1", "8123456789").await, Err(OtpError::InvalidPhone));
    assert_eq!(service.issue_otp(" ", PHONE).await, Err(OtpError::InvalidBusiness));
    assert!(repository.is_empty().unwrap());
    assert_eq!(sender.sent_count(), 0);
}

#[tokio::test]
async fn test_issue_otp_delivery_failure_keeps_record() {
    let (service, repository, _) = service(true);

    let err = service.issue_otp("b1", PHONE).await.unwrap_err();
    assert!(matches!(err, OtpError::Delivery { .. }));
    assert_eq!(repository.len().unwrap(), 1);
}

#[tokio::test]
async fn test_issue_otp_store_failure_sends_nothing() {
    let sender = Arc::new(MockOtpSender::new(false));
    let service = OtpAppService::new(
        Arc::new(UnavailableRepository),
        sender.clone(),
        OtpDomainService::new(CodeTtl::from_secs(300).unwrap()),
    );

    let err = service.issue_otp("b1", PHONE).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(sender.sent_count(), 0);
}

#[tokio::test]
async fn test_verify_otp_consumes_once() {
    let (service, _, sender) = service(false);
    service.issue_otp("b1", PHONE).await.unwrap();
    let code = sender.get_sent_code(PHONE).unwrap();

    assert!(service.verify_otp("b1", PHONE, &code).await.unwrap());
    assert!(!service.verify_otp("b1", PHONE, &code).await.unwrap());
}

#[tokio::test]
async fn test_verify_otp_wrong_code_then_right_code() {
    let (service, _, sender) = service(false);
    service.issue_otp("b1", PHONE).await.unwrap();
    let code = sender.get_sent_code(PHONE).unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    assert!(!service.verify_otp("b1", PHONE, wrong).await.unwrap());
    assert!(service.verify_otp("b1", PHONE, &code).await.unwrap());
}

#[tokio::test]
async fn test_verify_otp_reissue_invalidates_previous_code() {
    let (service, _, sender) = service(false);
    service.issue_otp("b1", PHONE).await.unwrap();
    let first = sender.get_sent_code(PHONE).unwrap();
    service.issue_otp("b1", PHONE).await.unwrap();
    let second = sender.get_sent_code(PHONE).unwrap();

    if first != second {
        assert!(!service.verify_otp("b1", PHONE, &first).await.unwrap());
    }
    assert!(service.verify_otp("b1", PHONE, &second).await.unwrap());
}

#[tokio::test]
async fn test_verify_otp_without_issue_is_false() {
    let (service, _, _) = service(false);
    assert_eq!(service.verify_otp("b1", PHONE, "123456").await, Ok(false));
}

#[tokio::test]
async fn test_verify_otp_validation_errors() {
    let (service, _, _) = service(false);

    assert_eq!(service.verify_otp("b1", "12", "123456").await, Err(OtpError::InvalidPhone));
    assert_eq!(service.verify_otp("b1", PHONE, "12345").await, Err(OtpError::InvalidCode));
    assert_eq!(service.verify_otp("", PHONE, "123456").await, Err(OtpError::InvalidBusiness));
}

#[tokio::test]
async fn test_verify_otp_store_fault_is_not_false() {
    let service = OtpAppService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MockOtpSender::new(false)),
        OtpDomainService::new(CodeTtl::from_secs(300).unwrap()),
    );

    let err = service.verify_otp("b1", PHONE, "123456").await.unwrap_err();
    assert_eq!(err, unavailable());
}

#[tokio::test]
async fn test_revoke_otp() {
    let (service, repository, sender) = service(false);
    service.issue_otp("b1", PHONE).await.unwrap();
    let code = sender.get_sent_code(PHONE).unwrap();

    service.revoke_otp("b1", PHONE).await.unwrap();
    assert!(repository.is_empty().unwrap());
    assert!(!service.verify_otp("b1", PHONE, &code).await.unwrap());
    // Revoking again is fine
    service.revoke_otp("b1", PHONE).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verify_succeeds_once() {
    let (service, _, sender) = service(false);
    let service = Arc::new(service);
    service.issue_otp("b1", PHONE).await.unwrap();
    let code = sender.get_sent_code(PHONE).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move { service.verify_otp("b1", PHONE, &code).await })
        })
        .collect();

    let mut verified = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            verified += 1;
        }
    }
    assert_eq!(verified, 1);
}
