//! Account registration and authentication service.
//!
//! # Responsibility
//! - Hash passwords and persist accounts with unique username and email.
//! - Input shape rules (length, email form) belong to callers; see
//!   `model::account::validate_registration`.
//! - Adjudicate username/password pairs without issuing sessions.
//!
//! # Invariants
//! - Plaintext passwords are hashed here; callers never handle hashes.
//! - Duplicate username/email are outcomes, not errors.
//! - Any verification failure, including a malformed stored hash, is
//!   reported as `AuthOutcome::BadPassword`.
//! - `authenticate` never mutates state.

use crate::logging::mask_identifier;
use crate::model::account::{Account, AccountId};
use crate::password::hasher::{HashError, PasswordHasher};
use crate::repo::account_repo::{AccountRepository, RepoError, UniqueField};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(AccountId),
    DuplicateUsername,
    DuplicateEmail,
}

impl RegisterOutcome {
    /// Boolean view: `true` only when a row was inserted.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }
}

/// Result of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    NoSuchUser,
    Success,
    BadPassword,
}

/// Failures that are not registration/authentication outcomes.
#[derive(Debug)]
pub enum AccountError {
    Repo(RepoError),
    Hash(HashError),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Hash(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Hash(err) => Some(err),
        }
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<HashError> for AccountError {
    fn from(value: HashError) -> Self {
        Self::Hash(value)
    }
}

pub type AccountResult<T> = Result<T, AccountError>;

/// Account use-case service over a repository and a password hasher.
pub struct AccountStore<R: AccountRepository, H: PasswordHasher> {
    repo: R,
    hasher: H,
}

impl<R: AccountRepository, H: PasswordHasher> AccountStore<R, H> {
    pub fn new(repo: R, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Registers a new account.
    ///
    /// # Contract
    /// - `password` is plaintext; it is hashed before persistence.
    /// - Any username/email pair not already present is registered; no
    ///   shape rules are applied here.
    /// - Returns `DuplicateUsername` or `DuplicateEmail` without mutation
    ///   when either value is already taken.
    ///
    /// # Errors
    /// - `Repo`/`Hash` for store or hasher failures.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> AccountResult<RegisterOutcome> {
        let password_hash = self.hasher.hash(password)?;
        let user = mask_identifier(username);

        let outcome = match self.repo.create_account(username, &password_hash, email) {
            Ok(id) => RegisterOutcome::Registered(id),
            Err(RepoError::Duplicate(UniqueField::Username)) => {
                RegisterOutcome::DuplicateUsername
            }
            Err(RepoError::Duplicate(UniqueField::Email)) => RegisterOutcome::DuplicateEmail,
            Err(err) => {
                error!(
                    "event=account_register module=account status=error user={user} error={err}"
                );
                return Err(err.into());
            }
        };

        match outcome {
            RegisterOutcome::Registered(id) => {
                info!(
                    "event=account_register module=account status=ok user={user} account_id={id}"
                );
            }
            RegisterOutcome::DuplicateUsername => {
                info!(
                    "event=account_register module=account status=rejected user={user} reason=duplicate_username"
                );
            }
            RegisterOutcome::DuplicateEmail => {
                info!(
                    "event=account_register module=account status=rejected user={user} reason=duplicate_email"
                );
            }
        }

        Ok(outcome)
    }

    /// Checks a username/plaintext password pair.
    ///
    /// # Errors
    /// - `Repo` when the lookup itself fails; hasher errors are folded into
    ///   `BadPassword`.
    pub fn authenticate(&self, username: &str, password: &str) -> AccountResult<AuthOutcome> {
        let user = mask_identifier(username);

        let Some(account) = self.repo.find_by_username(username)? else {
            info!(
                "event=account_auth module=account status=rejected user={user} reason=no_such_user"
            );
            return Ok(AuthOutcome::NoSuchUser);
        };

        let outcome = match self.hasher.verify(&account.password_hash, password) {
            Ok(true) => AuthOutcome::Success,
            Ok(false) => AuthOutcome::BadPassword,
            Err(err) => {
                warn!(
                    "event=account_auth module=account status=error user={user} account_id={} error_code=verify_failed error={err}",
                    account.id
                );
                AuthOutcome::BadPassword
            }
        };

        match outcome {
            AuthOutcome::Success => {
                info!(
                    "event=account_auth module=account status=ok user={user} account_id={}",
                    account.id
                );
            }
            _ => {
                info!(
                    "event=account_auth module=account status=rejected user={user} reason=bad_password"
                );
            }
        }

        Ok(outcome)
    }

    /// Gets one account by exact username, hash included.
    pub fn find_account(&self, username: &str) -> AccountResult<Option<Account>> {
        Ok(self.repo.find_by_username(username)?)
    }

    /// Returns the number of persisted accounts.
    pub fn account_count(&self) -> AccountResult<u64> {
        Ok(self.repo.count_accounts()?)
    }
}
