//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product catalog and the faceted listing query
//! - `storage` - Visitor-scoped key/value storage
//! - `cart` - Cart store
//! - `pricing` - Promo code and shipping selection
//! - `wishlist` - Wishlist store and bulk selection
//! - `checkout` - Checkout validation, order placement and the order cache

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod pricing;
pub mod storage;
pub mod wishlist;
