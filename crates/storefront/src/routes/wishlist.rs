//! Wishlist route handlers.
//!
//! Single-product actions come from product cards and detail pages as well as
//! the wishlist itself, so they honor `redirect_to`. Bulk actions act on the
//! persisted selection and always return to the wishlist.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use zard_shop_core::{Product, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::Notice;
use crate::models::session::push_notice;
use crate::routes::cart::RedirectForm;
use crate::routes::products::ProductCard;
use crate::routes::{PageChrome, redirect_back};
use crate::services::cart::{AddToCartOptions, CartStore};
use crate::services::catalog::Catalog;
use crate::services::wishlist::{WishlistStore, relative_date, toggle_notice};
use crate::state::AppState;

/// Wishlist page path.
pub const WISHLIST_PATH: &str = "/shop/wishlist";

// =============================================================================
// View Types
// =============================================================================

/// Wishlist entry display data.
#[derive(Clone)]
pub struct WishlistEntryView {
    pub product: ProductCard,
    pub added: String,
    pub selected: bool,
}

/// Wishlist sidebar figures.
#[derive(Clone)]
pub struct WishlistSummaryView {
    pub total_items: usize,
    pub total_value: String,
    pub in_stock_items: usize,
    pub on_sale_items: usize,
}

// =============================================================================
// Forms
// =============================================================================

/// Form data naming one product.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_id: String,
    pub redirect_to: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub chrome: PageChrome,
    pub items: Vec<WishlistEntryView>,
    pub summary: WishlistSummaryView,
    pub selected_count: usize,
    pub selected_total: String,
    pub all_selected: bool,
}

/// Wishlist count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_count.html")]
pub struct WishlistCountTemplate {
    pub count: usize,
}

fn find_product<'a>(catalog: &'a Catalog, product_id: &str) -> Result<&'a Product> {
    let id = ProductId::new(product_id);
    catalog
        .get_product(&id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display wishlist page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<WishlistShowTemplate> {
    let wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let cart = CartStore::load(session.clone()).await?;
    let now = Utc::now();

    let items = wishlist
        .items()
        .iter()
        .map(|item| WishlistEntryView {
            product: ProductCard::new(&item.product, true),
            added: relative_date(item.added_date, now),
            selected: wishlist.is_selected(&item.product_id),
        })
        .collect();
    let summary = wishlist.summary();

    Ok(WishlistShowTemplate {
        chrome: PageChrome::new(&session, cart.total_items(), wishlist.len()).await?,
        items,
        summary: WishlistSummaryView {
            total_items: summary.total_items,
            total_value: summary.total_value.display(),
            in_stock_items: summary.in_stock_items,
            on_sale_items: summary.on_sale_items,
        },
        selected_count: wishlist.selection().len(),
        selected_total: wishlist.selected_total().display(),
        all_selected: wishlist.all_selected(),
    })
}

/// Wishlist count badge fragment.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<WishlistCountTemplate> {
    let wishlist = WishlistStore::load(session, state.catalog()).await?;
    Ok(WishlistCountTemplate {
        count: wishlist.len(),
    })
}

/// Save a product, or remove it when already saved.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    let product = find_product(state.catalog(), &form.product_id)?;
    let mut wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let added = wishlist.toggle_wishlist(product).await?;
    push_notice(&session, toggle_notice(product, added)).await?;

    add_breadcrumb(
        "wishlist",
        if added { "Saved product" } else { "Unsaved product" },
        Some(&[("product_id", product.id.as_str())]),
    );
    Ok(redirect_back(form.redirect_to.as_deref(), WISHLIST_PATH))
}

/// Remove a product from the wishlist.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    wishlist
        .remove_from_wishlist(&ProductId::new(form.product_id))
        .await?;
    push_notice(&session, Notice::success("Item removed from wishlist")).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), WISHLIST_PATH))
}

/// Add one unit of a saved product to the cart. The product stays saved.
#[instrument(skip(state, session))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    let product = find_product(state.catalog(), &form.product_id)?;
    let mut cart = CartStore::load(session.clone()).await?;
    let notice = cart.add_to_cart(product, AddToCartOptions::default()).await?;
    push_notice(&session, notice).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), WISHLIST_PATH))
}

/// Empty the wishlist.
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RedirectForm>,
) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let notice = wishlist.clear_wishlist().await?;
    push_notice(&session, notice).await?;

    add_breadcrumb("wishlist", "Cleared wishlist", None);
    Ok(redirect_back(form.redirect_to.as_deref(), WISHLIST_PATH))
}

/// Toggle a saved product's selection.
#[instrument(skip(state, session))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session, state.catalog()).await?;
    wishlist
        .toggle_selection(&ProductId::new(form.product_id))
        .await?;
    Ok(Redirect::to(WISHLIST_PATH))
}

/// Select every saved product, or deselect all when all are selected.
#[instrument(skip(state, session))]
pub async fn select_all(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session, state.catalog()).await?;
    wishlist.select_all().await?;
    Ok(Redirect::to(WISHLIST_PATH))
}

#[instrument(skip(state, session))]
pub async fn clear_selection(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session, state.catalog()).await?;
    wishlist.clear_selection().await?;
    Ok(Redirect::to(WISHLIST_PATH))
}

/// Add one unit of every selected product to the cart.
#[instrument(skip(state, session))]
pub async fn add_selected_to_cart(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let mut cart = CartStore::load(session.clone()).await?;
    let (added, notice) = wishlist.add_selected_to_cart(&mut cart).await?;
    push_notice(&session, notice).await?;

    tracing::debug!(added, "Added selected wishlist products to cart");
    Ok(Redirect::to(WISHLIST_PATH))
}

/// Remove every selected product from the wishlist.
#[instrument(skip(state, session))]
pub async fn remove_selected(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let mut wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let (removed, notice) = wishlist.remove_selected().await?;
    push_notice(&session, notice).await?;

    add_breadcrumb("wishlist", "Removed selected products", None);
    tracing::debug!(removed, "Removed selected wishlist products");
    Ok(Redirect::to(WISHLIST_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::catalog::tests::catalog;

    #[test]
    fn test_find_product_reports_unknown_ids() {
        let catalog = catalog();
        assert!(find_product(&catalog, "1").is_ok());
        assert!(matches!(
            find_product(&catalog, "missing"),
            Err(AppError::NotFound(_))
        ));
    }
}
