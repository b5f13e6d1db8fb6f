//! Checkout and order confirmation route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use zard_shop_core::{Order, OrderId, PaymentMethodType};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::Notice;
use crate::models::session::push_notice;
use crate::routes::PageChrome;
use crate::routes::cart::{CART_PATH, CartLineView, PromoView, ShippingChoice, SummaryView};
use crate::services::cart::CartStore;
use crate::services::checkout::{
    COUNTRIES, CheckoutError, CheckoutForm, DEFAULT_COUNTRY, STATES, place_order,
    placed_by_visitor, remember_order,
};
use crate::services::pricing::{self, PricingSelection};
use crate::services::storage::StorageError;
use crate::services::wishlist::WishlistStore;
use crate::state::AppState;

/// Checkout page path.
pub const CHECKOUT_PATH: &str = "/shop/checkout";

// =============================================================================
// View Types
// =============================================================================

/// Select option display data.
#[derive(Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn select_options(options: &[(&'static str, &'static str)], selected: &str) -> Vec<SelectOption> {
    options
        .iter()
        .map(|&(value, label)| SelectOption {
            value,
            label,
            selected: value == selected,
        })
        .collect()
}

/// Billing fields echoed back into a re-rendered form.
///
/// Card number and CVV are never echoed.
#[derive(Clone, Default)]
pub struct BillingFormView {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub cardholder_name: String,
    pub expiry_date: String,
}

impl From<&CheckoutForm> for BillingFormView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            apartment: form.apartment.clone(),
            city: form.city.clone(),
            state: form.state.clone(),
            zip_code: form.zip_code.clone(),
            country: form.country.clone(),
            cardholder_name: form.cardholder_name.clone(),
            expiry_date: form.expiry_date.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub chrome: PageChrome,
    pub items: Vec<CartLineView>,
    pub summary: SummaryView,
    pub promo: Option<PromoView>,
    pub shipping_options: Vec<ShippingChoice>,
    pub states: Vec<SelectOption>,
    pub countries: Vec<SelectOption>,
    pub payment_methods: Vec<SelectOption>,
    pub card_required: bool,
    pub form: BillingFormView,
    pub errors: Vec<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/success.html")]
pub struct OrderSuccessTemplate {
    pub chrome: PageChrome,
    pub order_number: String,
    pub order_date: String,
    pub estimated_delivery: String,
    pub status: &'static str,
    pub email: String,
    pub payment_method: &'static str,
    pub card_last_four: Option<String>,
    pub shipping_method: String,
    pub promo: Option<PromoView>,
    pub items: Vec<CartLineView>,
    pub summary: SummaryView,
}

/// Render the checkout page for the visitor's cart.
async fn render_checkout(
    state: &AppState,
    session: &Session,
    cart: &CartStore<Session>,
    form: BillingFormView,
    payment_method: PaymentMethodType,
    errors: Vec<String>,
) -> Result<CheckoutTemplate> {
    let wishlist = WishlistStore::load(session.clone(), state.catalog()).await?;
    let pricing = PricingSelection::load(session).await?;
    let summary = cart.summary(pricing.promo, pricing.shipping);
    let country = if form.country.is_empty() {
        DEFAULT_COUNTRY
    } else {
        form.country.as_str()
    };

    Ok(CheckoutTemplate {
        chrome: PageChrome::new(session, cart.total_items(), wishlist.len()).await?,
        items: cart.items().iter().map(CartLineView::from).collect(),
        summary: SummaryView::new(&summary, cart.total_items(), pricing.shipping),
        promo: pricing.promo.map(PromoView::from),
        shipping_options: ShippingChoice::all(pricing.shipping),
        states: select_options(&STATES, &form.state),
        countries: select_options(&COUNTRIES, country),
        payment_methods: PaymentMethodType::ALL
            .into_iter()
            .map(|method| SelectOption {
                value: method.as_str(),
                label: method.label(),
                selected: method == payment_method,
            })
            .collect(),
        card_required: payment_method.requires_card(),
        form,
        errors,
    })
}

fn field_label(field: &str) -> String {
    match field {
        "zip_code" => "ZIP code".to_string(),
        "cvv" => "CVV".to_string(),
        other => {
            let spaced = other.replace('_', " ");
            let mut chars = spaced.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form; an empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = CartStore::load(session.clone()).await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    let page = render_checkout(
        &state,
        &session,
        &cart,
        BillingFormView::default(),
        PaymentMethodType::default(),
        Vec::new(),
    )
    .await?;
    Ok(page.into_response())
}

/// Place the order.
///
/// Invalid forms are re-rendered with `422 Unprocessable Entity`; a placed
/// order redirects to its confirmation page.
///
/// Placements from one visitor run one at a time. The session is saved
/// before the lock is released, so a repeated submit finds the emptied cart
/// and goes back to the cart page.
#[instrument(skip_all, fields(payment_method = %form.payment_method))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    // Session data is loaded lazily, so nothing may read it before the lock.
    let _placing = match session.id() {
        Some(id) => Some(state.orders().lock_checkout(&id.to_string()).await),
        None => None,
    };

    let mut cart = CartStore::load(session.clone()).await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    let echoed = BillingFormView::from(&form);
    let payment_method = form.payment_method;
    let details = match form.validate() {
        Ok(details) => details,
        Err(err @ (CheckoutError::MissingFields(_) | CheckoutError::InvalidEmail)) => {
            tracing::debug!("Checkout form rejected: {err}");
            let errors = match err {
                CheckoutError::MissingFields(fields) => fields
                    .into_iter()
                    .map(|field| format!("{} is required", field_label(field)))
                    .collect(),
                _ => vec!["Enter a valid email address".to_string()],
            };
            push_notice(
                &session,
                Notice::error("Please complete all required fields")
                    .with_description("Check your shipping address and payment information"),
            )
            .await?;
            let page =
                render_checkout(&state, &session, &cart, echoed, payment_method, errors).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };

    let pricing = PricingSelection::load(&session).await?;
    let order = place_order(
        &mut cart,
        &details,
        pricing.promo,
        pricing.shipping,
        state.config().checkout_delay,
        state.orders(),
    )
    .await?;
    remember_order(&session, &order.id).await?;
    pricing::remove_promo(&session).await?;

    push_notice(
        &session,
        Notice::success("Order placed successfully!").with_description(
            "Thank you for your purchase. You will receive a confirmation email shortly.",
        ),
    )
    .await?;
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
    session.save().await.map_err(StorageError::from)?;

    Ok(Redirect::to(&format!("/shop/order-success/{}", order.id)).into_response())
}

/// Look up an order placed by this visitor.
///
/// Malformed, unknown, expired and other visitors' orders are all 404.
async fn visitor_order(state: &AppState, session: &Session, order_id: &str) -> Result<Arc<Order>> {
    let not_found = || AppError::NotFound(format!("order {order_id}"));
    let id = OrderId::parse(order_id).ok_or_else(not_found)?;
    if !placed_by_visitor(session, &id).await? {
        return Err(not_found());
    }
    state.orders().get(&id).await.ok_or_else(not_found)
}

/// Display the order confirmation.
#[instrument(skip(state, session))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    Path(order_id): Path<String>,
) -> Result<OrderSuccessTemplate> {
    let order = visitor_order(&state, &session, &order_id).await?;

    let shipping = order.shipping_option.id;
    Ok(OrderSuccessTemplate {
        chrome: PageChrome::load(&session, state.catalog()).await?,
        order_number: order.id.to_string(),
        order_date: order.order_date.format("%B %-d, %Y").to_string(),
        estimated_delivery: order
            .estimated_delivery
            .map(|date| date.format("%B %-d, %Y").to_string())
            .unwrap_or_default(),
        status: order.status.label(),
        email: order.email.clone(),
        payment_method: order.payment_method.label(),
        card_last_four: order.card_last_four.clone(),
        shipping_method: order.shipping_option.name.clone(),
        promo: order.promo.map(PromoView::from),
        items: order.items.iter().map(CartLineView::from).collect(),
        summary: SummaryView::new(&order.summary, order.total_items(), shipping),
    })
}

/// Queue the order tracking notice and return to the confirmation.
#[instrument(skip(state, session))]
pub async fn track(
    State(state): State<AppState>,
    session: Session,
    Path(order_id): Path<String>,
) -> Result<Redirect> {
    let order = visitor_order(&state, &session, &order_id).await?;
    push_notice(
        &session,
        Notice::info("Order tracking").with_description(
            "You will receive tracking information via email once your order ships.",
        ),
    )
    .await?;
    Ok(Redirect::to(&format!("/shop/order-success/{}", order.id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_labels() {
        assert_eq!(field_label("first_name"), "First name");
        assert_eq!(field_label("zip_code"), "ZIP code");
        assert_eq!(field_label("cvv"), "CVV");
    }

    #[test]
    fn test_select_options_mark_selection() {
        let options = select_options(&STATES, "NY");
        assert_eq!(options.len(), 4);
        assert!(options.iter().any(|o| o.value == "NY" && o.selected));
        assert!(!options.iter().any(|o| o.value == "CA" && o.selected));
    }
}
