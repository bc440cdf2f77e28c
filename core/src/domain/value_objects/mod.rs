//! Value objects representing immutable domain concepts.

pub mod code;
pub mod code_ttl;
pub mod phone_number;


// Re-export commonly used types
pub use code::{validate_code, Code, CODE_LENGTH};
pub use code_ttl::CodeTtl;
pub use phone_number::PhoneNumber;
