//! Catalog product and review records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, ReviewId};
use super::price::Price;

/// A named product specification (e.g. "Battery Life" / "30 hours").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

/// A catalog product.
///
/// Products are immutable reference data seeded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Price before the sale, shown struck through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    /// Average rating on a 0-5 scale.
    pub rating: f64,
    pub review_count: u32,
    pub category: String,
    pub brand: String,
    pub images: Vec<String>,
    pub in_stock: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Vec<Specification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl Product {
    /// The first image, used for thumbnails and cart snapshots.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    /// Percentage saved against the original price, rounded to a whole number.
    ///
    /// Returns 0 when there is no original price.
    #[must_use]
    pub fn discount_percentage(&self) -> u32 {
        let Some(original) = self.original_price else {
            return 0;
        };
        if original.amount() <= Decimal::ZERO {
            return 0;
        }
        let saved = (original.amount() - self.price.amount()) / original.amount()
            * Decimal::ONE_HUNDRED;
        saved
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }

    /// Whether the product is offered in the given color.
    #[must_use]
    pub fn has_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c == color)
    }

    /// Whether the product is offered in the given size.
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }

    /// Specifications in display order (empty when the product has none).
    #[must_use]
    pub fn specification_list(&self) -> &[Specification] {
        self.specifications.as_deref().unwrap_or_default()
    }

    /// Features in display order (empty when the product has none).
    #[must_use]
    pub fn feature_list(&self) -> &[String] {
        self.features.as_deref().unwrap_or_default()
    }
}

/// A customer review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_name: String,
    /// Star rating, 1-5.
    pub rating: u8,
    pub comment: String,
    pub date: NaiveDate,
    pub verified: bool,
}

impl Review {
    /// Upper-cased first letter of each word of the reviewer's name.
    #[must_use]
    pub fn initials(&self) -> String {
        self.user_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}
