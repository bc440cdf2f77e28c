//! Code lifetime value object.

use chrono::Duration;

use crate::errors::{OtpError, OtpResult};

/// Strictly positive lifetime of an issued code, at most one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CodeTtl(Duration);

impl CodeTtl {
    pub const MAX_SECONDS: i64 = 86_400;

    /// # Errors
    ///
    /// Returns `OtpError::InvalidTtl` for zero, negative or over-long durations.
    pub fn new(ttl: Duration) -> OtpResult<Self> {
        if ttl <= Duration::zero() || ttl > Duration::seconds(Self::MAX_SECONDS) {
            return Err(OtpError::InvalidTtl);
        }
        Ok(Self(ttl))
    }

    pub fn from_secs(seconds: i64) -> OtpResult<Self> {
        Self::new(Duration::seconds(seconds))
    }

    /// Convert a configuration duration; values beyond chrono's range are rejected.
    pub fn from_std(ttl: std::time::Duration) -> OtpResult<Self> {
        let ttl = Duration::from_std(ttl).map_err(|_| OtpError::InvalidTtl)?;
        Self::new(ttl)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_ttl() {
        let ttl = CodeTtl::new(Duration::minutes(5)).unwrap();
        assert_eq!(ttl.as_duration(), Duration::minutes(5));
    }

    #[test]
    fn test_new_invalid_ttl() {
        assert_eq!(CodeTtl::new(Duration::minutes(-5)), Err(OtpError::InvalidTtl));
        assert_eq!(CodeTtl::new(Duration::zero()), Err(OtpError::InvalidTtl));
        assert_eq!(CodeTtl::from_secs(0), Err(OtpError::InvalidTtl));
    }

    #[test]
    fn test_rejects_ttl_beyond_one_day() {
        assert!(CodeTtl::from_secs(CodeTtl::MAX_SECONDS).is_ok());
        assert_eq!(CodeTtl::from_secs(CodeTtl::MAX_SECONDS + 1), Err(OtpError::InvalidTtl));
        assert_eq!(
            CodeTtl::from_std(std::time::Duration::from_secs(10_000_000_000_000)),
            Err(OtpError::InvalidTtl)
        );
    }

    #[test]
    fn test_from_std() {
        let ttl = CodeTtl::from_std(std::time::Duration::from_secs(120)).unwrap();
        assert_eq!(ttl.as_duration(), Duration::seconds(120));
        assert_eq!(
            CodeTtl::from_std(std::time::Duration::ZERO),
            Err(OtpError::InvalidTtl)
        );
    }
}
