//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for accounts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Uniqueness violations surface as semantic `RepoError::Duplicate`
//!   errors, never as raw SQLite errors.

pub mod account_repo;
