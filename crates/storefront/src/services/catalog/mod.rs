//! Product catalog.
//!
//! The catalog is immutable reference data loaded once at startup from a JSON
//! seed: either the built-in seed compiled into the binary or a file named by
//! `STOREFRONT_CATALOG_PATH`.

mod query;

pub use query::{
    ALL_CATEGORIES, DEFAULT_MAX_PRICE, PRODUCTS_PER_PAGE, Page, ProductQuery, ProductQueryParams,
    SortKey,
};

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zard_shop_core::{Product, ProductId, Review};

/// Built-in catalog seed.
const BUILTIN_SEED: &str = include_str!("../../../data/catalog.json");

/// Number of products shown in the featured strip.
pub const FEATURED_LIMIT: usize = 6;

/// Default number of related products.
pub const RELATED_LIMIT: usize = 4;

/// Errors that can occur while loading a catalog seed.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The seed file could not be read.
    #[error("failed to read catalog seed {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The seed is not valid JSON for the catalog format.
    #[error("invalid catalog seed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The seed parsed but violates catalog rules.
    #[error("catalog seed failed validation: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// On-disk catalog seed format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub products: Vec<Product>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// The in-memory product catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    reviews: Vec<Review>,
}

impl Catalog {
    /// Load the built-in seed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the compiled-in seed is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_SEED)
    }

    /// Load a seed file from disk.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read, parsed or validated.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON seed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the seed cannot be parsed or validated.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let seed: CatalogSeed = serde_json::from_str(raw)?;
        Self::from_seed(seed)
    }

    /// Build a catalog from an already parsed seed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` listing every rule the seed breaks.
    pub fn from_seed(seed: CatalogSeed) -> Result<Self, CatalogError> {
        let problems = validate(&seed);
        if !problems.is_empty() {
            return Err(CatalogError::Invalid(problems));
        }
        Ok(Self {
            products: seed.products,
            reviews: seed.reviews,
        })
    }

    /// Every product in catalog order.
    #[must_use]
    pub fn all_products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get_product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Distinct categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|p| p.category.as_str()))
    }

    /// Distinct brands in first-seen order.
    #[must_use]
    pub fn brands(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|p| p.brand.as_str()))
    }

    /// Distinct colors across all products in first-seen order.
    #[must_use]
    pub fn available_colors(&self) -> Vec<&str> {
        distinct(
            self.products
                .iter()
                .flat_map(|p| p.colors.iter().map(String::as_str)),
        )
    }

    /// Distinct sizes across all products in first-seen order.
    #[must_use]
    pub fn available_sizes(&self) -> Vec<&str> {
        distinct(
            self.products
                .iter()
                .flat_map(|p| p.sizes.iter().map(String::as_str)),
        )
    }

    /// Products in a category.
    #[must_use]
    pub fn products_by_category(&self, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Products of a brand.
    #[must_use]
    pub fn products_by_brand(&self, brand: &str) -> Vec<&Product> {
        self.products.iter().filter(|p| p.brand == brand).collect()
    }

    /// Case-insensitive search across name, description, brand and tags.
    #[must_use]
    pub fn search_products(&self, query: &str) -> Vec<&Product> {
        let term = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&term)
                    || p.description.to_lowercase().contains(&term)
                    || p.brand.to_lowercase().contains(&term)
                    || p.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Reviews shown for a product.
    ///
    /// The demo catalog shares one review list across all products.
    #[must_use]
    pub fn product_reviews(&self, _product_id: &ProductId) -> &[Review] {
        &self.reviews
    }

    /// New or on-sale products, at most [`FEATURED_LIMIT`].
    #[must_use]
    pub fn featured_products(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.is_new || p.is_sale)
            .take(FEATURED_LIMIT)
            .collect()
    }

    /// Other products in the same category, at most `limit`.
    ///
    /// Unknown product IDs have no related products.
    #[must_use]
    pub fn related_products(&self, id: &ProductId, limit: usize) -> Vec<&Product> {
        let Some(product) = self.get_product(id) else {
            return Vec::new();
        };
        self.products
            .iter()
            .filter(|p| &p.id != id && p.category == product.category)
            .take(limit)
            .collect()
    }

    /// Products in a category; `All` counts every product.
    #[must_use]
    pub fn category_count(&self, category: &str) -> usize {
        if category == ALL_CATEGORIES {
            return self.products.len();
        }
        self.products
            .iter()
            .filter(|p| p.category == category)
            .count()
    }

    /// Products of a brand.
    #[must_use]
    pub fn brand_count(&self, brand: &str) -> usize {
        self.products.iter().filter(|p| p.brand == brand).count()
    }

    /// Products currently in stock.
    #[must_use]
    pub fn in_stock_count(&self) -> usize {
        self.products.iter().filter(|p| p.in_stock).count()
    }

    /// Products rated at least `min_rating`.
    #[must_use]
    pub fn rating_count(&self, min_rating: f64) -> usize {
        self.products
            .iter()
            .filter(|p| p.rating >= min_rating)
            .count()
    }
}

/// Check a seed against catalog rules, returning one message per problem.
#[must_use]
pub fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for product in &seed.products {
        let id = product.id.as_str();
        if id.is_empty() {
            problems.push(format!("product '{}' has an empty id", product.name));
        }
        if !seen.insert(id) {
            problems.push(format!("duplicate product id {id}"));
        }
        if product.name.trim().is_empty() {
            problems.push(format!("product {id} has no name"));
        }
        if product.price.amount().is_sign_negative() {
            problems.push(format!("product {id} has a negative price"));
        }
        if let Some(original) = product.original_price
            && original <= product.price
        {
            problems.push(format!(
                "product {id} original price {original} is not above price {}",
                product.price
            ));
        }
        if !(0.0..=5.0).contains(&product.rating) {
            problems.push(format!(
                "product {id} rating {} is outside 0-5",
                product.rating
            ));
        }
        if product.images.is_empty() {
            problems.push(format!("product {id} has no images"));
        }
    }

    for review in &seed.reviews {
        if !(1..=5).contains(&review.rating) {
            problems.push(format!(
                "review {} rating {} is outside 1-5",
                review.id, review.rating
            ));
        }
    }

    problems
}

/// Keep the first occurrence of every value, preserving order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}
