//! Six-digit verification code value object.

use constant_time_eq::constant_time_eq;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{OtpError, OtpResult};

/// Length of a verification code
pub const CODE_LENGTH: usize = 6;

static CODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").unwrap());

/// Check that `code` is exactly six decimal digits once surrounding
/// whitespace is trimmed.
pub fn validate_code(code: &str) -> OtpResult<()> {
    if !CODE_REGEX.is_match(code.trim()) {
        return Err(OtpError::InvalidCode);
    }
    Ok(())
}

/// A validated verification code.
///
/// `Debug` output is redacted so the value never reaches logs by accident;
/// use [`Code::expose`] where the digits are genuinely needed (store payload,
/// delivery).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Parse and trim a candidate code.
    pub fn parse(raw: &str) -> OtpResult<Self> {
        validate_code(raw)?;
        Ok(Self(raw.trim().to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Constant-time equality against another code
    pub fn matches(&self, other: &Code) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Code(******)")
    }
}

impl TryFrom<String> for Code {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}
