//! OTP store module.

mod r#trait;
pub use r#trait::OtpRepository;

mod memory;
pub use memory::InMemoryOtpRepository;


use crate::domain::value_objects::PhoneNumber;

/// Storage key for a `(tenant_id, phone)` pair: `otp:<tenant_id>:<phone>`.
///
/// Phone numbers never contain `:`, so keys of different tenants cannot collide.
pub fn otp_key(tenant_id: &str, phone: &PhoneNumber) -> String {
    format!("otp:{}:{}", tenant_id, phone.as_str())
}
