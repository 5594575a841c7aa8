//! Account domain model.
//!
//! # Responsibility
//! - Define the persisted account record.
//! - Provide registration input rules for caller layers.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused.
//! - `username` and `email` are stored exactly as provided; no case folding.
//! - `password_hash` is an opaque PHC string and never leaves core in
//!   serialized form.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 64;
pub const EMAIL_MAX_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Store-assigned account identifier (`users.id`).
pub type AccountId = i64;

/// Persisted account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    /// Output of the password hasher. Skipped on serialization.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email: String,
}

/// Input validation failure for registration requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    /// Username has surrounding whitespace or control characters.
    UsernameInvalid,
    EmailInvalid,
    EmptyPassword,
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameTooShort { min } => {
                write!(f, "username must have at least {min} characters")
            }
            Self::UsernameTooLong { max } => {
                write!(f, "username must have at most {max} characters")
            }
            Self::UsernameInvalid => write!(
                f,
                "username must not contain control characters or surrounding whitespace"
            ),
            Self::EmailInvalid => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl Error for AccountValidationError {}

/// Checks a username against registration rules.
pub fn validate_username(username: &str) -> Result<(), AccountValidationError> {
    let chars = username.chars().count();
    if chars < USERNAME_MIN_CHARS {
        return Err(AccountValidationError::UsernameTooShort {
            min: USERNAME_MIN_CHARS,
        });
    }
    if chars > USERNAME_MAX_CHARS {
        return Err(AccountValidationError::UsernameTooLong {
            max: USERNAME_MAX_CHARS,
        });
    }
    if username.trim() != username || username.chars().any(char::is_control) {
        return Err(AccountValidationError::UsernameInvalid);
    }
    Ok(())
}

/// Checks an email address for a minimal `local@domain` shape.
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.chars().count() > EMAIL_MAX_CHARS || !EMAIL_RE.is_match(email) {
        return Err(AccountValidationError::EmailInvalid);
    }
    Ok(())
}

/// Rejects empty passwords. Strength policy is left to callers.
pub fn validate_password(password: &str) -> Result<(), AccountValidationError> {
    if password.is_empty() {
        return Err(AccountValidationError::EmptyPassword);
    }
    Ok(())
}

/// Applies all registration input rules in form order: username, email,
/// then password.
///
/// `AccountStore::register` does not call this; caller layers (forms, CLI)
/// decide whether to enforce it.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), AccountValidationError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)
}
