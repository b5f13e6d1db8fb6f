//! Zard Shop Core - Shared types library.
//!
//! This crate provides the domain records used across all Zard Shop components:
//! - `storefront` - Server-rendered shop (catalog, cart, wishlist, checkout)
//! - `cli` - Command-line tools for inspecting and validating the catalog
//!
//! # Architecture
//!
//! The core crate contains only types and pricing rules - no I/O, no sessions,
//! no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, products, cart lines, orders and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

#[doc(hidden)]
pub use uuid as __uuid;
