//! Aba Market Core - Shared types library.
//!
//! This crate provides common types used across the Aba Market client
//! components:
//! - `client` - The storefront API SDK (session, cart, catalog, orders)
//! - `cli` - Command-line storefront client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
