//! Password hashing primitives.
//!
//! # Responsibility
//! - Define the one-way hash/verify contract consumed by the account store.
//! - Provide the Argon2id implementation.
//!
//! # Invariants
//! - Plaintext passwords never leave this module in any persisted form.

pub mod hasher;
