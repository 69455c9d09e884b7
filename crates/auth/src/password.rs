//! Credential hashing (Argon2id, PHC string format).

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;

static CONTEXT: LazyLock<Argon2<'static>> = LazyLock::new(|| {
    Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::DEFAULT,
    )
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("failed to generate password hash: {0}")]
    Hash(String),

    #[error("stored password hash could not be parsed: {0}")]
    InvalidHash(String),
}

/// A plaintext credential. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Hash for storage. CPU-heavy: call from a blocking context.
    pub fn hash(&self) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        CONTEXT
            .hash_password(self.0.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check against a stored PHC hash. CPU-heavy: call from a blocking context.
    pub fn verify(&self, hash: &str) -> Result<bool, PasswordError> {
        let hash = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match CONTEXT.verify_password(self.0.as_bytes(), &hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
        }
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}
