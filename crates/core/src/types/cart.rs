//! Cart line items and wishlist entries.
//!
//! These are the records persisted to visitor storage, so their serialized
//! field names follow the storage format (`productId`, `inStock`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId, WishlistItemId};
use super::price::Price;
use super::product::Product;

/// A line in the cart.
///
/// At most one line exists per `(product_id, color, size)` combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    pub image: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub in_stock: bool,
}

impl CartItem {
    /// Largest quantity a single line can hold.
    pub const MAX_QUANTITY: u32 = 99;

    /// Snapshot a product into a new cart line.
    ///
    /// The quantity is clamped to `1..=MAX_QUANTITY`.
    #[must_use]
    pub fn from_product(
        product: &Product,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Self {
        Self {
            id: CartItemId::generate(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            original_price: product.original_price,
            image: product.primary_image().to_owned(),
            quantity: quantity.clamp(1, Self::MAX_QUANTITY),
            color,
            size,
            in_stock: product.in_stock,
        }
    }

    /// Price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Whether this line holds the given product variant.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, color: Option<&str>, size: Option<&str>) -> bool {
        &self.product_id == product_id
            && self.color.as_deref() == color
            && self.size.as_deref() == size
    }
}

/// A product saved for later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    /// Product snapshot; replaced with live catalog data on load.
    pub product: Product,
    pub added_date: DateTime<Utc>,
}

impl WishlistItem {
    /// Create a wishlist entry for a product, added now.
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self {
            id: WishlistItemId::generate(),
            product_id: product.id.clone(),
            product,
            added_date: Utc::now(),
        }
    }
}
