//! Checkout: billing form validation, order placement and the order cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::instrument;

use zard_shop_core::{Order, OrderId, PaymentMethodType, PromoCode, ShippingMethod};

use crate::models::session_keys;
use crate::services::cart::CartStore;
use crate::services::storage::{LocalStorage, StorageError, Stored, read_json, write_json};

/// State options offered by the billing form.
pub const STATES: [(&str, &str); 4] = [
    ("CA", "California"),
    ("NY", "New York"),
    ("TX", "Texas"),
    ("FL", "Florida"),
];

/// Country options offered by the billing form.
pub const COUNTRIES: [(&str, &str); 3] = [
    ("US", "United States"),
    ("CA", "Canada"),
    ("MX", "Mexico"),
];

/// Default country of the billing form.
pub const DEFAULT_COUNTRY: &str = "US";

/// How many placed orders a visitor's session remembers.
pub const REMEMBERED_ORDERS: usize = 20;

/// Idle time after which a visitor's checkout lock is dropped.
const CHECKOUT_LOCK_IDLE: Duration = Duration::from_secs(600);

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Required fields were left blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The email address is not of the form `local@domain`.
    #[error("invalid email address")]
    InvalidEmail,

    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Session storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Submitted checkout form.
///
/// Every field defaults to empty so incomplete submissions reach validation
/// instead of being rejected while parsing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
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
    pub payment_method: PaymentMethodType,
    pub cardholder_name: String,
    #[serde(deserialize_with = "optional_secret")]
    pub card_number: Option<SecretString>,
    pub expiry_date: String,
    #[serde(deserialize_with = "optional_secret")]
    pub cvv: Option<SecretString>,
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from))
}

/// A validated billing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Card details; number and CVV never leave the secret wrapper.
#[derive(Debug)]
pub struct CardDetails {
    pub cardholder_name: String,
    pub card_number: SecretString,
    pub expiry_date: String,
    pub cvv: SecretString,
}

impl CardDetails {
    /// Last four digits of the card number for display.
    #[must_use]
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .expose_secret()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        digits.iter().skip(digits.len().saturating_sub(4)).collect()
    }
}

/// Everything needed to place an order.
#[derive(Debug)]
pub struct CheckoutDetails {
    pub billing: BillingAddress,
    pub payment_method: PaymentMethodType,
    pub card: Option<CardDetails>,
}

impl CheckoutForm {
    /// Validate the form, reporting every missing field at once.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingFields` or `CheckoutError::InvalidEmail`.
    pub fn validate(self) -> Result<CheckoutDetails, CheckoutError> {
        let mut missing = Vec::new();
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }

        if self.payment_method.requires_card() {
            if self.cardholder_name.trim().is_empty() {
                missing.push("cardholder_name");
            }
            if self.card_number.is_none() {
                missing.push("card_number");
            }
            if self.expiry_date.trim().is_empty() {
                missing.push("expiry_date");
            }
            if self.cvv.is_none() {
                missing.push("cvv");
            }
        }

        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }

        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'));
        if !valid_email {
            return Err(CheckoutError::InvalidEmail);
        }

        let card = match (self.payment_method.requires_card(), self.card_number, self.cvv) {
            (true, Some(card_number), Some(cvv)) => Some(CardDetails {
                cardholder_name: self.cardholder_name.trim().to_string(),
                card_number,
                expiry_date: self.expiry_date.trim().to_string(),
                cvv,
            }),
            _ => None,
        };

        let country = self.country.trim();
        Ok(CheckoutDetails {
            billing: BillingAddress {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: email.to_string(),
                phone: self.phone.trim().to_string(),
                address: self.address.trim().to_string(),
                apartment: Some(self.apartment.trim().to_string()).filter(|a| !a.is_empty()),
                city: self.city.trim().to_string(),
                state: self.state.trim().to_string(),
                zip_code: self.zip_code.trim().to_string(),
                country: if country.is_empty() {
                    DEFAULT_COUNTRY.to_string()
                } else {
                    country.to_string()
                },
            },
            payment_method: self.payment_method,
            card,
        })
    }
}

/// Placed orders, kept for the order-success page until they expire.
///
/// Also hands out one checkout lock per visitor so a repeated submit waits
/// for the first placement to finish.
#[derive(Clone)]
pub struct OrderStore {
    cache: Cache<OrderId, Arc<Order>>,
    checkout_locks: Cache<String, Arc<Mutex<()>>>,
}

impl OrderStore {
    /// Create an order store whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
            checkout_locks: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(CHECKOUT_LOCK_IDLE)
                .build(),
        }
    }

    /// Store an order under a free order number.
    ///
    /// When the number is taken by an order placed in the same millisecond,
    /// the next free number is used instead.
    pub async fn insert(&self, mut order: Order) -> Arc<Order> {
        loop {
            let candidate = Arc::new(order.clone());
            let entry = self
                .cache
                .entry(order.id.clone())
                .or_insert_with(async { Arc::clone(&candidate) })
                .await;
            if entry.is_fresh() {
                return candidate;
            }
            tracing::debug!(order_id = %order.id, "Order number taken, trying the next one");
            order.id = order.id.successor();
        }
    }

    pub async fn get(&self, id: &OrderId) -> Option<Arc<Order>> {
        self.cache.get(id).await
    }

    /// Wait for the checkout lock of one visitor.
    pub async fn lock_checkout(&self, visitor: &str) -> OwnedMutexGuard<()> {
        self.checkout_locks
            .get_with(visitor.to_owned(), async { Arc::new(Mutex::new(())) })
            .await
            .lock_owned()
            .await
    }
}

async fn placed_orders<S: LocalStorage>(storage: &S) -> Result<Vec<OrderId>, StorageError> {
    let ids = match read_json(storage, session_keys::PLACED_ORDERS).await? {
        Stored::Value(ids) => ids,
        Stored::Missing => Vec::new(),
        Stored::Corrupt(e) => {
            tracing::warn!("Discarding unreadable placed orders: {e}");
            Vec::new()
        }
    };
    Ok(ids)
}

/// Record that the visitor placed `id`, keeping the most recent
/// [`REMEMBERED_ORDERS`].
///
/// # Errors
///
/// Returns `StorageError` if the storage backend fails.
pub async fn remember_order<S: LocalStorage>(storage: &S, id: &OrderId) -> Result<(), StorageError> {
    let mut ids = placed_orders(storage).await?;
    ids.retain(|placed| placed != id);
    ids.push(id.clone());
    let excess = ids.len().saturating_sub(REMEMBERED_ORDERS);
    ids.drain(..excess);
    write_json(storage, session_keys::PLACED_ORDERS, &ids).await
}

/// Whether the visitor placed `id`.
///
/// # Errors
///
/// Returns `StorageError` if the storage backend fails.
pub async fn placed_by_visitor<S: LocalStorage>(storage: &S, id: &OrderId) -> Result<bool, StorageError> {
    Ok(placed_orders(storage).await?.contains(id))
}

/// Place an order for the cart contents.
///
/// Takes the cart lines first, then waits for `processing_delay` to simulate
/// payment processing and records the order.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` when the cart has no items, or a
/// storage error if the cart cannot be saved.
#[instrument(skip_all, fields(payment_method = %details.payment_method))]
pub async fn place_order<S: LocalStorage>(
    cart: &mut CartStore<S>,
    details: &CheckoutDetails,
    promo: Option<PromoCode>,
    shipping: ShippingMethod,
    processing_delay: Duration,
    orders: &OrderStore,
) -> Result<Arc<Order>, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let items = cart.take_items().await?;
    tokio::time::sleep(processing_delay).await;

    let mut order = Order::place(
        items,
        promo,
        shipping,
        details.billing.email.clone(),
        details.payment_method,
        Utc::now(),
    );
    order.card_last_four = details.card.as_ref().map(CardDetails::last_four);
    tracing::info!(
        order_id = %order.id,
        items = order.total_items(),
        total = %order.summary.rounded().total,
        "Order placed"
    );

    Ok(orders.insert(order).await)
}
