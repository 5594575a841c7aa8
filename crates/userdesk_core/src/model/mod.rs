//! Domain model for registered accounts.
//!
//! # Responsibility
//! - Define the canonical account record shared by repository and service.
//! - Own input validation rules applied before persistence.
//!
//! # Invariants
//! - Every account is identified by a store-assigned integer `AccountId`.
//! - Accounts are never updated or deleted by core.

pub mod account;
