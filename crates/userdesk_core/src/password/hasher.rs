//! Password hasher contract and Argon2id implementation.
//!
//! # Responsibility
//! - Produce salted PHC strings from plaintext passwords.
//! - Verify plaintext passwords against stored PHC strings.
//!
//! # Invariants
//! - Every `hash` call uses a fresh random salt.
//! - `verify` reads cost parameters from the stored hash, so hashes made
//!   under older parameters keep verifying after a config change.

use argon2::password_hash::{self, PasswordHash, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HashResult<T> = Result<T, HashError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Stored value is not a parseable PHC hash string.
    MalformedHash(String),
    /// Cost parameters rejected by the hashing backend.
    InvalidParams(String),
    /// Backend failure while hashing or verifying.
    Hashing(String),
}

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedHash(message) => write!(f, "malformed password hash: {message}"),
            Self::InvalidParams(message) => write!(f, "invalid hasher parameters: {message}"),
            Self::Hashing(message) => write!(f, "password hashing failed: {message}"),
        }
    }
}

impl Error for HashError {}

/// One-way salted hash with a verify operation.
pub trait PasswordHasher {
    /// Hashes `plaintext` into an opaque string suitable for storage.
    fn hash(&self, plaintext: &str) -> HashResult<String>;

    /// Returns `Ok(false)` on mismatch and `Err` when `password_hash` cannot
    /// be interpreted at all.
    fn verify(&self, password_hash: &str, plaintext: &str) -> HashResult<bool>;
}

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Builds a hasher from explicit Argon2 cost parameters.
    ///
    /// # Errors
    /// - Returns `HashError::InvalidParams` when the backend rejects the
    ///   combination (e.g. memory below `8 * parallelism` KiB).
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> HashResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| HashError::InvalidParams(err.to_string()))?;
        Ok(Self::with_params(params))
    }

    fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> HashResult<String> {
        use argon2::password_hash::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| HashError::Hashing(err.to_string()))
    }

    fn verify(&self, password_hash: &str, plaintext: &str) -> HashResult<bool> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|err| HashError::MalformedHash(err.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(HashError::Hashing(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2PasswordHasher, HashError, PasswordHasher};

    fn cheap_hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(8, 1, 1).expect("minimal params should be accepted")
    }

    #[test]
    fn hash_then_verify_accepts_only_the_original_password() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
        assert!(hasher.verify(&hash, "secret1").unwrap());
        assert!(!hasher.verify(&hash, "secret2").unwrap());
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let hasher = cheap_hasher();
        assert_ne!(hasher.hash("secret1").unwrap(), hasher.hash("secret1").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        let err = cheap_hasher().verify("not-a-phc-string", "secret1").unwrap_err();
        assert!(matches!(err, HashError::MalformedHash(_)));
    }

    #[test]
    fn verify_uses_parameters_embedded_in_the_hash() {
        let hash = cheap_hasher().hash("secret1").unwrap();
        let other = Argon2PasswordHasher::new(16, 2, 1).unwrap();
        assert!(other.verify(&hash, "secret1").unwrap());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let err = Argon2PasswordHasher::new(1, 1, 1).err().unwrap();
        assert!(matches!(err, HashError::InvalidParams(_)));
    }
}
