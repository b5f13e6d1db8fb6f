//! Cart route handlers.
//!
//! Every action posts a form, updates the cart kept in the visitor session and
//! redirects back, queueing a notice for the next page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Deserializer};
use tower_sessions::Session;
use tracing::instrument;

use zard_shop_core::{
    CartItem, CartItemId, FREE_SHIPPING_THRESHOLD_CENTS, OrderSummary, Price, ProductId,
    PromoCode, ShippingMethod,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session::{push_notice, push_notices};
use crate::models::Notice;
use crate::routes::{PageChrome, redirect_back};
use crate::services::cart::{AddToCartOptions, CartStore};
use crate::services::pricing::{self, PricingSelection};
use crate::services::wishlist::WishlistStore;
use crate::state::AppState;

/// Cart page path.
pub const CART_PATH: &str = "/shop/cart";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub price: String,
    pub original_price: Option<String>,
    pub quantity: u32,
    pub line_total: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub in_stock: bool,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            brand: item.brand.clone(),
            image: item.image.clone(),
            price: item.price.display(),
            original_price: item
                .original_price
                .filter(|original| *original > item.price)
                .map(|original| original.display()),
            quantity: item.quantity,
            line_total: item.line_total().display(),
            color: item.color.clone(),
            size: item.size.clone(),
            in_stock: item.in_stock,
        }
    }
}

/// Order summary display data, shared by the cart, checkout and
/// order-success pages.
#[derive(Clone)]
pub struct SummaryView {
    pub total_items: u32,
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping: String,
    pub tax: String,
    pub total: String,
    /// Standard shipping is selected and the subtotal earns it for free.
    pub free_shipping: bool,
    /// How much more is needed for free standard shipping.
    pub to_free_shipping: Option<String>,
}

impl SummaryView {
    #[must_use]
    pub fn new(summary: &OrderSummary, total_items: u32, shipping: ShippingMethod) -> Self {
        let rounded = summary.rounded();
        let threshold = Price::from_cents(FREE_SHIPPING_THRESHOLD_CENTS);
        Self {
            total_items,
            subtotal: rounded.subtotal.display(),
            discount: (!rounded.discount.is_zero()).then(|| rounded.discount.display()),
            shipping: if rounded.shipping.is_zero() {
                "Free".to_string()
            } else {
                rounded.shipping.display()
            },
            tax: rounded.tax.display(),
            total: rounded.total.display(),
            free_shipping: shipping == ShippingMethod::Standard && summary.subtotal >= threshold,
            to_free_shipping: (summary.subtotal < threshold)
                .then(|| (threshold - summary.subtotal).display()),
        }
    }
}

/// Shipping method radio option.
#[derive(Clone)]
pub struct ShippingChoice {
    pub id: &'static str,
    pub name: String,
    pub price: String,
    pub description: String,
    pub estimated_days: String,
    pub selected: bool,
}

impl ShippingChoice {
    /// Every shipping method, marking the selected one.
    #[must_use]
    pub fn all(selected: ShippingMethod) -> Vec<Self> {
        ShippingMethod::ALL
            .into_iter()
            .map(|method| {
                let option = method.option();
                Self {
                    id: method.id(),
                    price: if option.price.is_zero() {
                        "Free".to_string()
                    } else {
                        option.price.display()
                    },
                    name: option.name,
                    description: option.description,
                    estimated_days: option.estimated_days,
                    selected: method == selected,
                }
            })
            .collect()
    }
}

/// Applied promo code display data.
#[derive(Clone)]
pub struct PromoView {
    pub code: &'static str,
    pub percent_off: u32,
}

impl From<PromoCode> for PromoView {
    fn from(code: PromoCode) -> Self {
        Self {
            code: code.code(),
            percent_off: code.percent_off(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Treat blank form fields as absent.
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub size: Option<String>,
    pub redirect_to: Option<String>,
}

/// Form data naming one cart line.
#[derive(Debug, Deserialize)]
pub struct CartItemForm {
    pub item_id: String,
    pub redirect_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: i64,
    pub redirect_to: Option<String>,
}

/// Promo code form data.
#[derive(Debug, Deserialize)]
pub struct PromoForm {
    pub code: String,
    pub redirect_to: Option<String>,
}

/// Shipping method form data.
#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    pub method: String,
    pub redirect_to: Option<String>,
}

/// Form data for actions that only need somewhere to return to.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectForm {
    pub redirect_to: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: PageChrome,
    pub items: Vec<CartLineView>,
    pub summary: SummaryView,
    pub promo: Option<PromoView>,
    pub shipping_options: Vec<ShippingChoice>,
    pub has_out_of_stock_items: bool,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let cart = CartStore::load(session.clone()).await?;
    let wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let pricing = PricingSelection::load(&session).await?;
    let summary = cart.summary(pricing.promo, pricing.shipping);

    Ok(CartShowTemplate {
        chrome: PageChrome::new(&session, cart.total_items(), wishlist.len()).await?,
        items: cart.items().iter().map(CartLineView::from).collect(),
        summary: SummaryView::new(&summary, cart.total_items(), pricing.shipping),
        promo: pricing.promo.map(PromoView::from),
        shipping_options: ShippingChoice::all(pricing.shipping),
        has_out_of_stock_items: cart.has_out_of_stock_items(),
    })
}

/// Cart count badge fragment.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let cart = CartStore::load(session).await?;
    Ok(CartCountTemplate {
        count: cart.total_items(),
    })
}

/// Add a product to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(form.product_id);
    let product = state
        .catalog()
        .get_product(&product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let mut cart = CartStore::load(session.clone()).await?;
    let options = AddToCartOptions {
        quantity: form.quantity.unwrap_or(1),
        ..AddToCartOptions::variant(form.color, form.size)
    };
    let notice = cart.add_to_cart(product, options).await?;
    push_notice(&session, notice).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Set a cart line's quantity.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let mut cart = CartStore::load(session.clone()).await?;
    let notice = cart
        .update_quantity(&CartItemId::new(form.item_id), form.quantity)
        .await?;
    push_notices(&session, notice).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Increase a cart line's quantity by one.
#[instrument(skip(session))]
pub async fn increase(session: Session, Form(form): Form<CartItemForm>) -> Result<Redirect> {
    let mut cart = CartStore::load(session).await?;
    cart.increase_quantity(&CartItemId::new(form.item_id)).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Decrease a cart line's quantity by one, never below one.
#[instrument(skip(session))]
pub async fn decrease(session: Session, Form(form): Form<CartItemForm>) -> Result<Redirect> {
    let mut cart = CartStore::load(session).await?;
    cart.decrease_quantity(&CartItemId::new(form.item_id)).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Remove a cart line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<CartItemForm>) -> Result<Redirect> {
    let mut cart = CartStore::load(session.clone()).await?;
    let notice = cart.remove_from_cart(&CartItemId::new(form.item_id)).await?;
    push_notices(&session, notice).await?;

    add_breadcrumb("cart", "Removed from cart", None);
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session, Form(form): Form<RedirectForm>) -> Result<Redirect> {
    let mut cart = CartStore::load(session.clone()).await?;
    let notice = cart.clear_cart().await?;
    push_notices(&session, notice).await?;

    add_breadcrumb("cart", "Cleared cart", None);
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Apply a promo code.
#[instrument(skip(session, form), fields(code = %form.code))]
pub async fn apply_promo(session: Session, Form(form): Form<PromoForm>) -> Result<Redirect> {
    let notice = pricing::apply_promo(&session, &form.code).await?;
    push_notice(&session, notice).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Remove the applied promo code.
#[instrument(skip(session))]
pub async fn remove_promo(session: Session, Form(form): Form<RedirectForm>) -> Result<Redirect> {
    pricing::remove_promo(&session).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Choose a shipping method.
#[instrument(skip(session))]
pub async fn select_shipping(
    session: Session,
    Form(form): Form<ShippingForm>,
) -> Result<Redirect> {
    let method = ShippingMethod::parse(form.method.trim())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    pricing::select_shipping(&session, method).await?;
    Ok(redirect_back(form.redirect_to.as_deref(), CART_PATH))
}

/// Continue from the cart.
///
/// While the cart holds unavailable products the button purges them and the
/// visitor stays on the cart; otherwise it leads to checkout.
#[instrument(skip(session))]
pub async fn proceed(session: Session) -> Result<Response> {
    let mut cart = CartStore::load(session.clone()).await?;
    if cart.has_out_of_stock_items() {
        let removed = cart.remove_out_of_stock().await?;
        push_notice(
            &session,
            Notice::info(format!("Removed {removed} out of stock item(s)")),
        )
        .await?;
        return Ok(Redirect::to(CART_PATH).into_response());
    }
    Ok(Redirect::to(crate::routes::checkout::CHECKOUT_PATH).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_view_free_shipping() {
        let summary = OrderSummary::compute(Price::from_cents(5_800), None, ShippingMethod::Standard);
        let view = SummaryView::new(&summary, 2, ShippingMethod::Standard);
        assert_eq!(view.shipping, "Free");
        assert!(view.free_shipping);
        assert!(view.to_free_shipping.is_none());
        assert!(view.discount.is_none());
    }

    #[test]
    fn test_summary_view_almost_free_shipping() {
        let summary = OrderSummary::compute(
            Price::from_cents(3_000),
            Some(PromoCode::Save10),
            ShippingMethod::Express,
        );
        let view = SummaryView::new(&summary, 1, ShippingMethod::Express);
        assert_eq!(view.shipping, "$9.99");
        assert_eq!(view.discount.as_deref(), Some("$3.00"));
        assert_eq!(view.to_free_shipping.as_deref(), Some("$20.00"));
        assert!(!view.free_shipping);
    }

    #[test]
    fn test_shipping_choices_mark_selection() {
        let choices = ShippingChoice::all(ShippingMethod::Express);
        assert_eq!(choices.len(), 3);
        assert!(choices.iter().any(|c| c.id == "express" && c.selected));
        assert_eq!(choices.iter().filter(|c| c.selected).count(), 1);
        assert_eq!(choices.first().unwrap().price, "Free");
    }

    #[test]
    fn test_add_form_blank_variant_fields() {
        let uri: axum::http::Uri = "/?product_id=2&quantity=3&color=&size=M".parse().unwrap();
        let axum::extract::Query(form) =
            axum::extract::Query::<AddToCartForm>::try_from_uri(&uri).unwrap();
        assert_eq!(form.quantity, Some(3));
        assert!(form.color.is_none());
        assert_eq!(form.size.as_deref(), Some("M"));
    }
}
