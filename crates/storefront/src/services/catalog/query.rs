//! Faceted product listing: filtering, sorting and pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use zard_shop_core::{Price, Product};

use super::Catalog;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Price ceiling at which the price filter is inactive.
pub const DEFAULT_MAX_PRICE: u32 = 2000;

/// Products shown per listing page.
pub const PRODUCTS_PER_PAGE: usize = 12;

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    RatingDesc,
    Newest,
    /// Catalog order, used for unrecognized sort parameters.
    Catalog,
}

impl SortKey {
    /// Sort options offered in the listing UI, with labels.
    pub const OPTIONS: [(Self, &'static str); 6] = [
        (Self::NameAsc, "Name: A to Z"),
        (Self::NameDesc, "Name: Z to A"),
        (Self::PriceAsc, "Price: Low to High"),
        (Self::PriceDesc, "Price: High to Low"),
        (Self::RatingDesc, "Highest Rated"),
        (Self::Newest, "Newest First"),
    ];

    /// Interpret a sort parameter; unknown values keep catalog order.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        match value {
            "name-asc" => Self::NameAsc,
            "name-desc" => Self::NameDesc,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "rating-desc" => Self::RatingDesc,
            "newest" => Self::Newest,
            _ => Self::Catalog,
        }
    }

    /// The parameter value for this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::RatingDesc => "rating-desc",
            Self::Newest => "newest",
            Self::Catalog => "catalog",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::NameAsc => compare_names(a, b),
            Self::NameDesc => compare_names(b, a),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::RatingDesc => b.rating.total_cmp(&a.rating),
            Self::Newest => b.is_new.cmp(&a.is_new),
            Self::Catalog => Ordering::Equal,
        }
    }
}

fn compare_names(a: &Product, b: &Product) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Query-string form of a [`ProductQuery`].
///
/// List facets are comma-separated, e.g. `?brands=AudioTech,GameTech`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQueryParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brands: Option<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub in_stock: Option<bool>,
    pub rating: Option<f64>,
    pub colors: Option<String>,
    pub sizes: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

/// Facet state of the product listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub search: String,
    pub category: String,
    pub brands: Vec<String>,
    pub min_price: u32,
    pub max_price: u32,
    pub in_stock_only: bool,
    pub min_rating: f64,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub sort: SortKey,
    pub page: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: ALL_CATEGORIES.to_string(),
            brands: Vec::new(),
            min_price: 0,
            max_price: DEFAULT_MAX_PRICE,
            in_stock_only: false,
            min_rating: 0.0,
            colors: Vec::new(),
            sizes: Vec::new(),
            sort: SortKey::default(),
            page: 1,
        }
    }
}

impl From<ProductQueryParams> for ProductQuery {
    fn from(params: ProductQueryParams) -> Self {
        let defaults = Self::default();
        Self {
            search: params.search.map(|s| s.trim().to_string()).unwrap_or_default(),
            category: params
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.category),
            brands: split_list(params.brands.as_deref()),
            min_price: params.min_price.unwrap_or(defaults.min_price),
            max_price: params.max_price.unwrap_or(defaults.max_price),
            in_stock_only: params.in_stock.unwrap_or(false),
            min_rating: params
                .rating
                .filter(|r| r.is_finite() && *r > 0.0)
                .unwrap_or(0.0),
            colors: split_list(params.colors.as_deref()),
            sizes: split_list(params.sizes.as_deref()),
            sort: params
                .sort
                .as_deref()
                .map_or(defaults.sort, SortKey::from_param),
            page: params.page.unwrap_or(1).max(1),
        }
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One page of filtered products.
#[derive(Debug)]
pub struct Page<'a> {
    pub products: Vec<&'a Product>,
    /// Products matching the filters across all pages.
    pub total_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl Page<'_> {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

impl ProductQuery {
    /// Whether a product passes every active facet.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.search.is_empty() {
            let term = self.search.to_lowercase();
            let hit = product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term)
                || product.brand.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }

        if self.category != ALL_CATEGORIES && product.category != self.category {
            return false;
        }

        if !self.brands.is_empty() && !self.brands.contains(&product.brand) {
            return false;
        }

        if self.max_price < DEFAULT_MAX_PRICE
            && product.price > Price::from_cents(i64::from(self.max_price) * 100)
        {
            return false;
        }

        if self.min_price > 0 && product.price < Price::from_cents(i64::from(self.min_price) * 100)
        {
            return false;
        }

        if self.in_stock_only && !product.in_stock {
            return false;
        }

        if self.min_rating > 0.0 && product.rating < self.min_rating {
            return false;
        }

        if !self.colors.is_empty() && !self.colors.iter().any(|c| product.has_color(c)) {
            return false;
        }

        if !self.sizes.is_empty() && !self.sizes.iter().any(|s| product.has_size(s)) {
            return false;
        }

        true
    }

    /// Every matching product, sorted.
    #[must_use]
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        let mut products: Vec<&Product> = catalog
            .all_products()
            .iter()
            .filter(|p| self.matches(p))
            .collect();
        // sort_by is stable, so ties keep catalog order
        products.sort_by(|a, b| self.sort.compare(a, b));
        products
    }

    /// The requested page of matching products.
    #[must_use]
    pub fn paginate<'a>(&self, catalog: &'a Catalog) -> Page<'a> {
        let matching = self.apply(catalog);
        let total_count = matching.len();
        let total_pages = total_count.div_ceil(PRODUCTS_PER_PAGE);
        let current_page = self.page.max(1);
        let start = (current_page - 1).saturating_mul(PRODUCTS_PER_PAGE);

        let products = matching
            .into_iter()
            .skip(start)
            .take(PRODUCTS_PER_PAGE)
            .collect();

        Page {
            products,
            total_count,
            current_page,
            total_pages,
        }
    }

    // =========================================================================
    // Facet mutations (each returns to the first page)
    // =========================================================================

    /// Add the color if absent, remove it if present.
    pub fn toggle_color(&mut self, color: &str) {
        toggle(&mut self.colors, color);
        self.page = 1;
    }

    /// Add the size if absent, remove it if present.
    pub fn toggle_size(&mut self, size: &str) {
        toggle(&mut self.sizes, size);
        self.page = 1;
    }

    /// Check or uncheck a brand.
    pub fn set_brand(&mut self, brand: &str, checked: bool) {
        if checked {
            if !self.brands.iter().any(|b| b == brand) {
                self.brands.push(brand.to_string());
            }
        } else {
            self.brands.retain(|b| b != brand);
        }
        self.page = 1;
    }

    /// Set the price ceiling (quick price range).
    pub fn set_max_price(&mut self, max_price: u32) {
        self.max_price = max_price;
        self.page = 1;
    }

    /// Reset every facet, keeping the sort order.
    pub fn clear(&mut self) {
        *self = Self {
            sort: self.sort,
            ..Self::default()
        };
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.page = 1;
    }

    pub fn clear_category(&mut self) {
        ALL_CATEGORIES.clone_into(&mut self.category);
        self.page = 1;
    }

    pub fn clear_price(&mut self) {
        self.min_price = 0;
        self.max_price = DEFAULT_MAX_PRICE;
        self.page = 1;
    }

    pub fn clear_brands(&mut self) {
        self.brands.clear();
        self.page = 1;
    }

    pub fn clear_colors(&mut self) {
        self.colors.clear();
        self.page = 1;
    }

    pub fn clear_rating(&mut self) {
        self.min_rating = 0.0;
        self.page = 1;
    }

    /// Whether any facet narrows the listing.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Number of active facets.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        [
            !self.search.is_empty(),
            self.category != ALL_CATEGORIES,
            !self.brands.is_empty(),
            self.max_price < DEFAULT_MAX_PRICE,
            self.min_price > 0,
            self.min_rating > 0.0,
            !self.colors.is_empty(),
            !self.sizes.is_empty(),
            self.in_stock_only,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Encode as a URL query string (without the leading `?`).
    ///
    /// Default values are omitted, so the default query encodes as "".
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let defaults = Self::default();
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if self.category != defaults.category {
            pairs.push(("category", self.category.clone()));
        }
        if !self.brands.is_empty() {
            pairs.push(("brands", self.brands.join(",")));
        }
        if self.min_price != defaults.min_price {
            pairs.push(("min_price", self.min_price.to_string()));
        }
        if self.max_price != defaults.max_price {
            pairs.push(("max_price", self.max_price.to_string()));
        }
        if self.in_stock_only {
            pairs.push(("in_stock", "true".to_string()));
        }
        if self.min_rating > 0.0 {
            pairs.push(("rating", self.min_rating.to_string()));
        }
        if !self.colors.is_empty() {
            pairs.push(("colors", self.colors.join(",")));
        }
        if !self.sizes.is_empty() {
            pairs.push(("sizes", self.sizes.join(",")));
        }
        if self.sort != defaults.sort {
            pairs.push(("sort", self.sort.as_str().to_string()));
        }
        if self.page > 1 {
            pairs.push(("page", self.page.to_string()));
        }

        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Query string for the same facets on another page.
    #[must_use]
    pub fn page_link(&self, page: usize) -> String {
        let mut query = self.clone();
        query.page = page.max(1);
        query.to_query_string()
    }
}

fn toggle(values: &mut Vec<String>, value: &str) {
    if let Some(index) = values.iter().position(|v| v == value) {
        values.remove(index);
    } else {
        values.push(value.to_string());
    }
}
