//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and hasher calls into use-case level APIs.
//! - Keep caller layers (CLI, web) decoupled from storage details.

pub mod account_store;
