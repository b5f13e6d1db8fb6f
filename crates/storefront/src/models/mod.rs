//! Session-scoped models for the storefront.

pub mod session;

pub use session::{Notice, NoticeLevel, keys as session_keys};
