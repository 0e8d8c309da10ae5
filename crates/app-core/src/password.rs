//! Credential hashing for accounts that never use password login.
//!
//! Social accounts still need a credential row in the store; a random
//! placeholder secret is generated at registration, hashed with Argon2id,
//! and never read again.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as Argon2Error, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum HashingError {
    #[error("Failed to hash or verify credential: {0}")]
    Hash(Argon2Error),
}

#[cfg_attr(feature = "testing", mockall::automock)]
pub trait Hasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashingError>;

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashingError>;
}

/// Generates an unguessable one-off secret for a social account's credential
/// placeholder. The fixed prefix guarantees the mixed-case/digit/symbol
/// classes a typical identity store's complexity policy demands.
pub fn generate_placeholder_secret() -> String {
    format!("Pass!1{}", Uuid::new_v4())
}

pub struct Argon2Hasher<'a> {
    argon2: Argon2<'a>,
}

impl<'a> Argon2Hasher<'a> {
    pub fn new() -> Self {
        Self { argon2: Argon2::default() }
    }
}

impl Default for Argon2Hasher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Argon2Hasher<'_> {
    fn hash(&self, plain: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self.argon2.hash_password(plain.as_bytes(), &salt)?.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashingError> {
        let parsed_hash = PasswordHash::new(hash)?;

        Ok(self.argon2.verify_password(plain.as_bytes(), &parsed_hash).is_ok())
    }
}

impl From<Argon2Error> for HashingError {
    fn from(err: Argon2Error) -> Self {
        HashingError::Hash(err)
    }
}
