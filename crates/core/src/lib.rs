//! Volunteer Board Core - Shared types library.
//!
//! This crate provides common types used across the volunteer board
//! components:
//! - `server` - The REST backend for posts and volunteer requests
//! - `integration-tests` - Black-box HTTP tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and verified identities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
