//! Recipe Book Core - Shared domain types.
//!
//! This crate provides the types shared by the Recipe Book components:
//! - `api` - The multi-tenant recipe HTTP API
//! - `cli` - Command-line tools for migrations and user provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP handling. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, cooking times and attribute names

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
