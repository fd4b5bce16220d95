//! Hashed password value object

use serde::{Deserialize, Serialize};

use crate::domain::entity::ValueObject;
use crate::domain::DomainResult;
use crate::shared::DomainError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt only looks at the first 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt hash of a user password. The plain text is never stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password {
    hash: String,
}

impl ValueObject for Password {}

impl Password {
    /// Validate and hash a plain-text password with the default bcrypt cost.
    pub fn from_plain(plain: &str) -> DomainResult<Self> {
        Self::from_plain_with_cost(plain, bcrypt::DEFAULT_COST)
    }

    pub fn from_plain_with_cost(plain: &str, cost: u32) -> DomainResult<Self> {
        validate_strength(plain)?;
        let hash = bcrypt::hash(plain, cost)
            .map_err(|e| DomainError::validation(format!("password could not be hashed: {}", e)))?;
        Ok(Self { hash })
    }

    /// Trusted reconstruction from a stored hash.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn verify(&self, plain: &str) -> bool {
        bcrypt::verify(plain, &self.hash).unwrap_or(false)
    }

    pub fn as_hash(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

fn validate_strength(plain: &str) -> DomainResult<()> {
    if plain.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(DomainError::validation(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    if !plain.chars().any(|c| c.is_alphabetic()) || !plain.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation(
            "password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}
