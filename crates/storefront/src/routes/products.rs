//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use zard_shop_core::{Product, ProductId, Review, Specification};

use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::PageChrome;
use crate::services::cart::CartStore;
use crate::services::catalog::{
    ALL_CATEGORIES, DEFAULT_MAX_PRICE, Page, PRODUCTS_PER_PAGE, ProductQuery, ProductQueryParams,
    RELATED_LIMIT, SortKey,
};
use crate::services::wishlist::WishlistStore;
use crate::state::AppState;

/// Listing path without a query string.
pub const LISTING_PATH: &str = "/shop/products";

/// Quick price ranges offered next to the price ceiling input.
const QUICK_PRICE_RANGES: [(u32, &str); 4] = [
    (50, "Under $50"),
    (100, "Under $100"),
    (200, "Under $200"),
    (DEFAULT_MAX_PRICE, "$500+"),
];

/// Rating breakdown shown on every product page: (stars, percent, reviews).
const RATING_BREAKDOWN: [(u8, u32, u32); 5] =
    [(5, 65, 83), (4, 20, 26), (3, 10, 13), (2, 3, 4), (1, 2, 2)];

// =============================================================================
// View Types
// =============================================================================

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_percentage: u32,
    pub image: String,
    pub rating: f64,
    pub review_count: u32,
    pub in_stock: bool,
    pub is_new: bool,
    pub is_sale: bool,
    pub colors: Vec<String>,
    pub in_wishlist: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, in_wishlist: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price.display(),
            original_price: product
                .original_price
                .filter(|original| *original > product.price)
                .map(|original| original.display()),
            discount_percentage: product.discount_percentage(),
            image: product.primary_image().to_string(),
            rating: product.rating,
            review_count: product.review_count,
            in_stock: product.in_stock,
            is_new: product.is_new,
            is_sale: product.is_sale,
            colors: product.colors.clone(),
            in_wishlist,
        }
    }
}

/// A facet option that links to the listing with the option toggled.
#[derive(Clone)]
pub struct FacetLink {
    pub label: String,
    pub count: usize,
    pub active: bool,
    pub href: String,
}

/// Sort dropdown option.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Page number link.
#[derive(Clone)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Review display data for templates.
#[derive(Clone)]
pub struct ReviewView {
    pub initials: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub date: String,
    pub verified: bool,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            initials: review.initials(),
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            date: review.date.format("%B %-d, %Y").to_string(),
            verified: review.verified,
        }
    }
}

/// One row of the rating breakdown.
#[derive(Clone)]
pub struct RatingRow {
    pub stars: u8,
    pub percent: u32,
    pub count: u32,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: PageChrome,
    pub query: ProductQuery,
    pub current_href: String,
    pub products: Vec<ProductCard>,
    pub total_count: usize,
    pub first_shown: usize,
    pub last_shown: usize,
    pub categories: Vec<FacetLink>,
    pub brands: Vec<FacetLink>,
    pub colors: Vec<FacetLink>,
    pub sizes: Vec<FacetLink>,
    pub ratings: Vec<FacetLink>,
    pub price_ranges: Vec<FacetLink>,
    pub in_stock_count: usize,
    pub active_filters: Vec<FacetLink>,
    pub active_filter_count: usize,
    pub clear_all_href: String,
    pub sort_options: Vec<SortOption>,
    pub pages: Vec<PageLink>,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: PageChrome,
    pub product: ProductCard,
    pub description: String,
    pub images: Vec<String>,
    pub selected_image: String,
    pub selected_color: String,
    pub sizes: Vec<String>,
    pub specifications: Vec<Specification>,
    pub features: Vec<String>,
    pub reviews: Vec<ReviewView>,
    pub rating_breakdown: Vec<RatingRow>,
    pub related_products: Vec<ProductCard>,
    pub current_href: String,
}

// =============================================================================
// Listing Helpers
// =============================================================================

/// Listing URL for a query.
#[must_use]
pub fn listing_href(query: &ProductQuery) -> String {
    let query_string = query.to_query_string();
    if query_string.is_empty() {
        LISTING_PATH.to_string()
    } else {
        format!("{LISTING_PATH}?{query_string}")
    }
}

fn facet(
    query: &ProductQuery,
    label: &str,
    count: usize,
    active: bool,
    edit: impl FnOnce(&mut ProductQuery),
) -> FacetLink {
    let mut next = query.clone();
    edit(&mut next);
    FacetLink {
        label: label.to_string(),
        count,
        active,
        href: listing_href(&next),
    }
}

fn page_links(query: &ProductQuery, page: &Page<'_>) -> Vec<PageLink> {
    (1..=page.total_pages)
        .map(|number| {
            let mut target = query.clone();
            target.page = number;
            PageLink {
                number,
                href: listing_href(&target),
                current: number == page.current_page,
            }
        })
        .collect()
}

fn active_filter_chips(query: &ProductQuery) -> Vec<FacetLink> {
    let chip = |label: &str, edit: &dyn Fn(&mut ProductQuery)| facet(query, label, 0, true, edit);

    let mut chips = Vec::new();
    if !query.search.is_empty() {
        let label = format!("Search: \"{}\"", query.search);
        chips.push(chip(&label, &ProductQuery::clear_search));
    }
    if query.category != ALL_CATEGORIES {
        chips.push(chip(&query.category, &ProductQuery::clear_category));
    }
    if query.max_price < DEFAULT_MAX_PRICE || query.min_price > 0 {
        let label = if query.min_price > 0 {
            format!("${} - ${}", query.min_price, query.max_price)
        } else {
            format!("Up to ${}", query.max_price)
        };
        chips.push(chip(&label, &ProductQuery::clear_price));
    }
    if !query.brands.is_empty() {
        chips.push(chip(&query.brands.join(", "), &ProductQuery::clear_brands));
    }
    if !query.colors.is_empty() {
        chips.push(chip(&query.colors.join(", "), &ProductQuery::clear_colors));
    }
    for size in &query.sizes {
        let label = format!("Size: {size}");
        chips.push(chip(&label, &|q: &mut ProductQuery| q.toggle_size(size)));
    }
    if query.min_rating > 0.0 {
        let label = format!("{}+ stars", query.min_rating);
        chips.push(chip(&label, &ProductQuery::clear_rating));
    }
    if query.in_stock_only {
        chips.push(chip("In stock", &|q: &mut ProductQuery| {
            q.in_stock_only = false;
            q.page = 1;
        }));
    }
    chips
}

// =============================================================================
// Handlers
// =============================================================================

/// Redirect `/` and `/shop` to the product listing.
pub async fn shop_home() -> Redirect {
    Redirect::permanent(LISTING_PATH)
}

/// Display the filtered product listing.
#[instrument(skip(state, session, params))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ProductQueryParams>,
) -> Result<ProductsIndexTemplate> {
    let catalog = state.catalog();
    let query = ProductQuery::from(params);
    let page = query.paginate(catalog);

    let cart = CartStore::load(session.clone()).await?;
    let wishlist = WishlistStore::load(session.clone(), catalog).await?;

    tracing::debug!(
        matches = page.total_count,
        page = page.current_page,
        filters = query.active_filter_count(),
        "Product listing"
    );

    let products = page
        .products
        .iter()
        .map(|product| ProductCard::new(product, wishlist.is_in_wishlist(&product.id)))
        .collect::<Vec<_>>();
    let (first_shown, last_shown) = if products.is_empty() {
        (0, 0)
    } else {
        let first = (page.current_page - 1) * PRODUCTS_PER_PAGE + 1;
        (first, first + products.len() - 1)
    };

    let categories = std::iter::once(ALL_CATEGORIES)
        .chain(catalog.categories())
        .map(|category| {
            facet(&query, category, catalog.category_count(category), query.category == category, |q| {
                q.category = category.to_string();
                q.page = 1;
            })
        })
        .collect();
    let brands = catalog
        .brands()
        .into_iter()
        .map(|brand| {
            let active = query.brands.iter().any(|b| b == brand);
            facet(&query, brand, catalog.brand_count(brand), active, |q| q.set_brand(brand, !active))
        })
        .collect();
    let colors = catalog
        .available_colors()
        .into_iter()
        .map(|color| {
            let active = query.colors.iter().any(|c| c == color);
            facet(&query, color, 0, active, |q| q.toggle_color(color))
        })
        .collect();
    let sizes = catalog
        .available_sizes()
        .into_iter()
        .map(|size| {
            let active = query.sizes.iter().any(|s| s == size);
            facet(&query, size, 0, active, |q| q.toggle_size(size))
        })
        .collect();
    let ratings = (1..=5u8)
        .rev()
        .map(|stars| {
            let rating = f64::from(stars);
            let active = (query.min_rating - rating).abs() < f64::EPSILON;
            facet(&query, &format!("{stars}"), catalog.rating_count(rating), active, |q| {
                if active {
                    q.clear_rating();
                } else {
                    q.min_rating = rating;
                    q.page = 1;
                }
            })
        })
        .collect();
    let price_ranges = QUICK_PRICE_RANGES
        .iter()
        .map(|(max_price, label)| {
            let active = if *max_price == DEFAULT_MAX_PRICE {
                query.max_price >= 500
            } else {
                query.max_price == *max_price
            };
            facet(&query, label, 0, active, |q| q.set_max_price(*max_price))
        })
        .collect();

    let sort_options = SortKey::OPTIONS
        .iter()
        .map(|(key, label)| SortOption {
            value: key.as_str(),
            label: *label,
            selected: *key == query.sort,
        })
        .collect();

    let previous_href = page.has_previous().then(|| {
        let mut target = query.clone();
        target.page = page.current_page - 1;
        listing_href(&target)
    });
    let next_href = page.has_next().then(|| {
        let mut target = query.clone();
        target.page = page.current_page + 1;
        listing_href(&target)
    });

    let mut cleared = query.clone();
    cleared.clear();

    Ok(ProductsIndexTemplate {
        chrome: PageChrome::new(&session, cart.total_items(), wishlist.len()).await?,
        current_href: listing_href(&query),
        total_count: page.total_count,
        first_shown,
        last_shown,
        categories,
        brands,
        colors,
        sizes,
        ratings,
        price_ranges,
        in_stock_count: catalog.in_stock_count(),
        active_filters: active_filter_chips(&query),
        active_filter_count: query.active_filter_count(),
        clear_all_href: listing_href(&cleared),
        sort_options,
        pages: page_links(&query, &page),
        previous_href,
        next_href,
        products,
        query,
    })
}

/// Product detail query parameters.
#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    /// Index of the image shown large.
    pub image: Option<usize>,
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(detail): Query<DetailQuery>,
) -> Result<ProductShowTemplate> {
    let catalog = state.catalog();
    let product_id = ProductId::new(id);
    let product = catalog
        .get_product(&product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let cart = CartStore::load(session.clone()).await?;
    let wishlist = WishlistStore::load(session.clone(), catalog).await?;

    let selected_image = detail
        .image
        .and_then(|index| product.images.get(index))
        .map_or_else(|| product.primary_image().to_string(), Clone::clone);

    let related_products = catalog
        .related_products(&product.id, RELATED_LIMIT)
        .into_iter()
        .map(|related| ProductCard::new(related, wishlist.is_in_wishlist(&related.id)))
        .collect();

    Ok(ProductShowTemplate {
        chrome: PageChrome::new(&session, cart.total_items(), wishlist.len()).await?,
        product: ProductCard::new(product, wishlist.is_in_wishlist(&product.id)),
        description: product.description.clone(),
        images: product.images.clone(),
        selected_image,
        selected_color: product.colors.first().cloned().unwrap_or_default(),
        sizes: product.sizes.clone(),
        specifications: product.specification_list().to_vec(),
        features: product.feature_list().to_vec(),
        reviews: catalog
            .product_reviews(&product.id)
            .iter()
            .map(ReviewView::from)
            .collect(),
        rating_breakdown: RATING_BREAKDOWN
            .iter()
            .map(|(stars, percent, count)| RatingRow {
                stars: *stars,
                percent: *percent,
                count: *count,
            })
            .collect(),
        related_products,
        current_href: format!("/shop/product-detail/{}", product.id),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::catalog::tests::catalog;

    #[test]
    fn test_listing_href_omits_default_query() {
        assert_eq!(listing_href(&ProductQuery::default()), LISTING_PATH);

        let mut query = ProductQuery::default();
        query.toggle_color("black");
        assert_eq!(listing_href(&query), "/shop/products?colors=black");
    }

    #[test]
    fn test_facet_links_reset_page() {
        let query = ProductQuery {
            page: 2,
            ..ProductQuery::default()
        };
        let link = facet(&query, "AudioTech", 1, false, |q| q.set_brand("AudioTech", true));
        assert_eq!(link.href, "/shop/products?brands=AudioTech");
    }

    #[test]
    fn test_active_filter_chips_clear_their_facet() {
        let mut query = ProductQuery::default();
        query.search = "lamp".to_string();
        query.set_max_price(100);

        let chips = active_filter_chips(&query);
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].label, "Search: \"lamp\"");
        assert_eq!(chips[0].href, "/shop/products?max_price=100");
        assert_eq!(chips[1].href, "/shop/products?search=lamp");
    }

    #[test]
    fn test_page_links_cover_every_page() {
        let catalog = catalog();
        let query = ProductQuery::default();
        let page = query.paginate(&catalog);

        let links = page_links(&query, &page);
        assert_eq!(links.len(), 2);
        assert!(links[0].current);
        assert_eq!(links[1].href, "/shop/products?page=2");
    }

    #[test]
    fn test_product_card_hides_non_discount_original_price() {
        let catalog = catalog();
        let product = catalog.get_product(&ProductId::new("1")).unwrap();
        let card = ProductCard::new(product, true);
        assert_eq!(card.price, "$299.00");
        assert_eq!(card.original_price.as_deref(), Some("$399.00"));
        assert!(card.in_wishlist);
    }
}
