//! Code generation strategies.

use rand::{rngs::OsRng, RngCore};

use crate::errors::{OtpError, OtpResult};

/// Number of distinct codes
const CODE_SPACE: u32 = 1_000_000;

/// Largest multiple of `CODE_SPACE` representable in a `u32`; samples at or
/// above it are redrawn so every code is equally likely.
const ACCEPT_BELOW: u32 = (u32::MAX / CODE_SPACE) * CODE_SPACE;

/// Produces candidate codes for new OTPs.
///
/// Any `Fn() -> OtpResult<String>` closure is a generator.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> OtpResult<String>;
}

/// Uniform 6-digit codes drawn from the operating system entropy source.
///
/// An entropy failure is returned as `OtpError::CodeGeneration`; there is no
/// fallback to a weaker generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self) -> OtpResult<String> {
        loop {
            let mut buf = [0u8; 4];
            OsRng
                .try_fill_bytes(&mut buf)
                .map_err(|e| OtpError::CodeGeneration {
                    message: e.to_string(),
                })?;

            let sample = u32::from_le_bytes(buf);
            if sample < ACCEPT_BELOW {
                return Ok(format!("{:06}", sample % CODE_SPACE));
            }
        }
    }
}

impl<F> CodeGenerator for F
where
    F: Fn() -> OtpResult<String> + Send + Sync,
{
    fn generate(&self) -> OtpResult<String> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{validate_code, CODE_LENGTH};
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_format() {
        let generator = SecureCodeGenerator;
        for _ in 0..200 {
            let code = generator.generate().unwrap();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(validate_code(&code).is_ok());
        }
    }

    #[test]
    fn test_codes_vary() {
        let generator = SecureCodeGenerator;
        let codes: HashSet<String> = (0..100).map(|_| generator.generate().unwrap()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_rejection_zone() {
        assert_eq!(ACCEPT_BELOW, 4_294_000_000);
        assert_eq!(ACCEPT_BELOW % CODE_SPACE, 0);
    }

    #[test]
    fn test_closure_generator() {
        let generator = || Ok::<_, OtpError>("000042".to_string());
        assert_eq!(generator.generate().unwrap(), "000042");
    }
}
