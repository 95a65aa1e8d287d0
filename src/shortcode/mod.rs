//! Short code generation and validation.
//!
//! Generated codes are fixed-length alphanumeric. Custom codes additionally
//! allow `-` and `_`, are capped at 50 characters, and must not shadow a
//! named route.

use rand::{distr::Alphanumeric, Rng};
use thiserror::Error;

use crate::storage::LinkStore;

/// Length of generated codes.
pub const CODE_LENGTH: usize = 7;

/// Upper bound for custom codes.
pub const MAX_CODE_LENGTH: usize = 50;

/// Attempts before unique generation gives up.
const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Names taken by the routing surface; never valid as codes.
const RESERVED_CODES: &[&str] = &[
    "api",
    "login",
    "signup",
    "dashboard",
    "admin",
    "health",
    "healthz",
    "static",
    "assets",
    "favicon.ico",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeViolation {
    #[error("short code cannot be empty")]
    Empty,
    #[error("short code must be at most {MAX_CODE_LENGTH} characters")]
    TooLong,
    #[error("short code may only contain letters, digits, '-' and '_'")]
    InvalidCharacter,
    #[error("'{0}' is a reserved name")]
    Reserved(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("could not find an unused short code after {0} attempts")]
    Exhausted(usize),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Produce a random fixed-length code. No uniqueness guarantee.
pub fn generate_random_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// Check a candidate code against format rules and the reserved list.
pub fn validate_code(code: &str) -> Result<(), CodeViolation> {
    if code.is_empty() {
        return Err(CodeViolation::Empty);
    }
    if code.len() > MAX_CODE_LENGTH {
        return Err(CodeViolation::TooLong);
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CodeViolation::InvalidCharacter);
    }
    if RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
    {
        return Err(CodeViolation::Reserved(code.to_string()));
    }
    Ok(())
}

/// Generate a code confirmed absent from storage, retrying on collision up
/// to [`MAX_GENERATION_ATTEMPTS`] times.
pub async fn generate_unique_code(store: &dyn LinkStore) -> Result<String, GenerationError> {
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let candidate = generate_random_code();
        if !store.exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(GenerationError::Exhausted(MAX_GENERATION_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_fixed_length_alphanumeric() {
        for _ in 0..100 {
            let code = generate_random_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(validate_code(&code).is_ok(), "generated code {code:?} must validate");
        }
    }

    #[test]
    fn sequential_codes_differ() {
        let first = generate_random_code();
        let second = generate_random_code();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_empty_and_oversized_codes() {
        assert_eq!(validate_code(""), Err(CodeViolation::Empty));
        let oversized = "a".repeat(MAX_CODE_LENGTH + 1);
        assert_eq!(validate_code(&oversized), Err(CodeViolation::TooLong));
        assert!(validate_code(&"a".repeat(MAX_CODE_LENGTH)).is_ok());
    }

    #[test]
    fn rejects_invalid_characters() {
        for code in ["with space", "user@host", "semi;colon", "slash/code", "ünïcode"] {
            assert_eq!(validate_code(code), Err(CodeViolation::InvalidCharacter));
        }
        assert!(validate_code("ok-code_123").is_ok());
    }

    #[test]
    fn rejects_reserved_names_case_insensitively() {
        assert!(matches!(validate_code("admin"), Err(CodeViolation::Reserved(_))));
        assert!(matches!(validate_code("LOGIN"), Err(CodeViolation::Reserved(_))));
        assert!(matches!(validate_code("Dashboard"), Err(CodeViolation::Reserved(_))));
        assert!(validate_code("administrator").is_ok());
    }
}
