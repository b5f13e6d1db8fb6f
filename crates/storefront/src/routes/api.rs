//! Read-only JSON endpoints.
//!
//! These mirror the HTML pages for scripts and tests: the same catalog
//! filtering, and the cart and wishlist held in the caller's session.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use zard_shop_core::{CartItem, OrderSummary, Product, ProductId, PromoCode, ShippingMethod};

use crate::error::{AppError, Result};
use crate::services::cart::CartStore;
use crate::services::catalog::{ProductQuery, ProductQueryParams};
use crate::services::pricing::PricingSelection;
use crate::services::wishlist::{WishlistSelection, WishlistStore, WishlistSummary};
use crate::state::AppState;

/// One page of the filtered catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageResponse {
    pub products: Vec<Product>,
    pub total_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Cart contents with totals rounded to cents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub summary: OrderSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoCode>,
    pub shipping: ShippingMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryResponse {
    pub product: Product,
    pub added_date: chrono::DateTime<chrono::Utc>,
}

/// Wishlist entries, sidebar figures and the bulk selection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistResponse {
    pub items: Vec<WishlistEntryResponse>,
    pub summary: WishlistSummary,
    pub selection: WishlistSelection,
}

/// Filtered, sorted page of products. Accepts the listing's query string.
#[instrument(skip(state, params))]
pub async fn products(
    State(state): State<AppState>,
    Query(params): Query<ProductQueryParams>,
) -> Json<ProductPageResponse> {
    let query = ProductQuery::from(params);
    let page = query.paginate(state.catalog());
    Json(ProductPageResponse {
        products: page.products.into_iter().cloned().collect(),
        total_count: page.total_count,
        current_page: page.current_page,
        total_pages: page.total_pages,
    })
}

/// Single product by ID.
#[instrument(skip(state))]
pub async fn product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    state
        .catalog()
        .get_product(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// The caller's cart.
#[instrument(skip(session))]
pub async fn cart(session: Session) -> Result<Json<CartResponse>> {
    let cart = CartStore::load(session.clone()).await?;
    let pricing = PricingSelection::load(&session).await?;
    Ok(Json(CartResponse {
        items: cart.items().to_vec(),
        total_items: cart.total_items(),
        summary: cart.summary(pricing.promo, pricing.shipping).rounded(),
        promo: pricing.promo,
        shipping: pricing.shipping,
    }))
}

/// The caller's wishlist.
#[instrument(skip(state, session))]
pub async fn wishlist(State(state): State<AppState>, session: Session) -> Result<Json<WishlistResponse>> {
    let wishlist = WishlistStore::load(session, state.catalog()).await?;
    Ok(Json(WishlistResponse {
        items: wishlist
            .items()
            .iter()
            .map(|item| WishlistEntryResponse {
                product: item.product.clone(),
                added_date: item.added_date,
            })
            .collect(),
        summary: wishlist.summary(),
        selection: wishlist.selection().clone(),
    }))
}
