//! Core types for Zard Shop.
//!
//! This module provides the catalog, cart, wishlist and order records shared
//! by the storefront and the CLI.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{CartItem, WishlistItem};
pub use id::*;
pub use order::{
    DELIVERY_ESTIMATE_DAYS, FREE_SHIPPING_THRESHOLD_CENTS, Order, OrderSummary, PricingError,
    PromoCode, ShippingMethod, ShippingOption, TAX_RATE_PERCENT,
};
pub use price::Price;
pub use product::{Product, Review, Specification};
pub use status::*;
