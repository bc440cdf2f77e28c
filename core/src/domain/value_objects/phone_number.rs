//! Iranian mobile phone number value object.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use otp_shared::phone::mask_phone_number;

use crate::errors::{OtpError, OtpResult};

/// Accepts `9XXXXXXXXX`, `09XXXXXXXXX` and `+989XXXXXXXXX`.
static IRAN_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+98|0)?9[0-9]{9}$").unwrap()
});

/// A validated mobile number.
///
/// The three accepted textual forms are kept verbatim: `09123456789` and
/// `+989123456789` are different values and therefore different store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate `raw` as a full match of the accepted formats.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidPhone` when the pattern does not match.
    pub fn new(raw: impl Into<String>) -> OtpResult<Self> {
        let raw = raw.into();
        if !IRAN_MOBILE_REGEX.is_match(&raw) {
            return Err(OtpError::InvalidPhone);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering
    pub fn masked(&self) -> String {
        mask_phone_number(&self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
