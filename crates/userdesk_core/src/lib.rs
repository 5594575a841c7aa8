//! Account registration and login core for userdesk.
//! This crate is the single source of truth for account invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod password;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{validate_registration, Account, AccountId, AccountValidationError};
pub use password::hasher::{Argon2PasswordHasher, HashError, PasswordHasher};
pub use repo::account_repo::{
    AccountRepository, RepoError, RepoResult, SqliteAccountRepository, UniqueField,
};
pub use service::account_store::{
    AccountError, AccountResult, AccountStore, AuthOutcome, RegisterOutcome,
};

/// Minimal health-check API for caller wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
