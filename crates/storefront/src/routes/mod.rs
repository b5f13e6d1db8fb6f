//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                 - Redirect to the product listing
//! GET  /health                           - Health check
//!
//! # Products
//! GET  /shop                             - Redirect to the product listing
//! GET  /shop/products                    - Filtered, sorted, paginated listing
//! GET  /shop/product-detail/{id}         - Product detail with reviews
//!
//! # Cart
//! GET  /shop/cart                        - Cart page with order summary
//! GET  /shop/cart/count                  - Cart count badge (fragment)
//! POST /shop/cart/add                    - Add a product variant
//! POST /shop/cart/update                 - Set a line's quantity
//! POST /shop/cart/increase               - Quantity + 1
//! POST /shop/cart/decrease               - Quantity - 1 (never below 1)
//! POST /shop/cart/remove                 - Remove a line
//! POST /shop/cart/clear                  - Empty the cart
//! POST /shop/cart/promo                  - Apply a promo code
//! POST /shop/cart/promo/remove           - Remove the promo code
//! POST /shop/cart/shipping               - Choose a shipping method
//! POST /shop/cart/proceed                - Purge unavailable lines or go to checkout
//!
//! # Checkout
//! GET  /shop/checkout                    - Checkout form
//! POST /shop/checkout                    - Place the order (rate limited)
//! GET  /shop/order-success/{order_id}    - Order confirmation
//! POST /shop/order-success/{order_id}/track - Order tracking notice
//!
//! # Wishlist
//! GET  /shop/wishlist                    - Wishlist page
//! GET  /shop/wishlist/count              - Wishlist count badge (fragment)
//! POST /shop/wishlist/toggle             - Add or remove a product
//! POST /shop/wishlist/remove             - Remove a product
//! POST /shop/wishlist/add-to-cart        - Add one wishlist product to the cart
//! POST /shop/wishlist/clear              - Empty the wishlist
//! POST /shop/wishlist/select             - Toggle a product's selection
//! POST /shop/wishlist/select-all         - Select all, or deselect when all are selected
//! POST /shop/wishlist/selection/clear    - Clear the selection
//! POST /shop/wishlist/selection/add-to-cart - Add selected products to the cart
//! POST /shop/wishlist/selection/remove   - Remove selected products
//!
//! # JSON API
//! GET  /api/products                     - Filtered page of products
//! GET  /api/products/{id}                - Single product
//! GET  /api/cart                         - Cart lines and order summary
//! GET  /api/wishlist                     - Wishlist entries and summary
//! ```
//!
//! Form posts answer with `303 See Other`, either to the local path in the
//! `redirect_to` field or to the page that owns the action.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::order_rate_limiter;
use crate::models::Notice;
use crate::models::session::take_notices;
use crate::services::cart::CartStore;
use crate::services::catalog::Catalog;
use crate::services::wishlist::WishlistStore;
use crate::state::AppState;

// =============================================================================
// Shared Page Data
// =============================================================================

/// Header badges and pending notices rendered by the base layout.
pub struct PageChrome {
    pub cart_count: u32,
    pub wishlist_count: usize,
    pub notices: Vec<Notice>,
}

impl PageChrome {
    /// Build the chrome from counts the handler already knows.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending notices cannot be read.
    pub async fn new(session: &Session, cart_count: u32, wishlist_count: usize) -> Result<Self> {
        Ok(Self {
            cart_count,
            wishlist_count,
            notices: take_notices(session).await?,
        })
    }

    /// Load the cart and wishlist to build the chrome.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(session: &Session, catalog: &Catalog) -> Result<Self> {
        let cart = CartStore::load(session.clone()).await?;
        let wishlist = WishlistStore::load(session.clone(), catalog).await?;
        Self::new(session, cart.total_items(), wishlist.len()).await
    }
}

/// Redirect to `redirect_to` when it is a path on this site, otherwise to
/// `fallback`.
#[must_use]
pub fn redirect_back(redirect_to: Option<&str>, fallback: &str) -> Redirect {
    let target = redirect_to
        .map(str::trim)
        .filter(|target| is_local_path(target))
        .unwrap_or(fallback);
    Redirect::to(target)
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}

// =============================================================================
// Routers
// =============================================================================

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/product-detail/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/increase", post(cart::increase))
        .route("/decrease", post(cart::decrease))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/promo", post(cart::apply_promo))
        .route("/promo/remove", post(cart::remove_promo))
        .route("/shipping", post(cart::select_shipping))
        .route("/proceed", post(cart::proceed))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::place).layer(order_rate_limiter())),
        )
        .route("/order-success/{order_id}", get(checkout::success))
        .route("/order-success/{order_id}/track", post(checkout::track))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/count", get(wishlist::count))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
        .route("/add-to-cart", post(wishlist::add_to_cart))
        .route("/clear", post(wishlist::clear))
        .route("/select", post(wishlist::select))
        .route("/select-all", post(wishlist::select_all))
        .route("/selection/clear", post(wishlist::clear_selection))
        .route("/selection/add-to-cart", post(wishlist::add_selected_to_cart))
        .route("/selection/remove", post(wishlist::remove_selected))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::products))
        .route("/products/{id}", get(api::product))
        .route("/cart", get(api::cart))
        .route("/wishlist", get(api::wishlist))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let shop = Router::new()
        .route("/", get(products::shop_home))
        .merge(product_routes())
        .merge(checkout_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes());

    Router::new()
        .route("/", get(products::shop_home))
        .route("/health", get(health))
        .nest("/shop", shop)
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn location(redirect: Redirect) -> String {
        let response = redirect.into_response();
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_redirect_back_accepts_local_paths() {
        assert_eq!(
            location(redirect_back(Some("/shop/products?page=2"), "/shop/cart")),
            "/shop/products?page=2"
        );
    }

    #[test]
    fn test_redirect_back_rejects_foreign_targets() {
        for target in ["https://evil.example", "//evil.example", "/\\evil", "", "shop"] {
            assert_eq!(
                location(redirect_back(Some(target), "/shop/cart")),
                "/shop/cart",
                "{target} should not be followed"
            );
        }
        assert_eq!(location(redirect_back(None, "/shop/wishlist")), "/shop/wishlist");
    }
}
