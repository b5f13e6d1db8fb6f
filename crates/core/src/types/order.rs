//! Pricing rules, shipping methods, promo codes and placed orders.

use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cart::CartItem;
use super::id::OrderId;
use super::price::Price;
use super::status::{OrderStatus, PaymentMethodType};

/// Sales tax applied to the discounted subtotal, in percent.
pub const TAX_RATE_PERCENT: u32 = 8;

/// Subtotal from which standard shipping is free, in cents.
pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 5_000;

/// Days between placing an order and its estimated delivery.
pub const DELIVERY_ESTIMATE_DAYS: u64 = 5;

/// Errors raised while interpreting pricing input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The promo code is not one of the recognized codes.
    #[error("invalid promo code: {0}")]
    InvalidPromoCode(String),
    /// The shipping method id is unknown.
    #[error("invalid shipping method: {0}")]
    InvalidShippingMethod(String),
}

/// A recognized promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromoCode {
    #[serde(rename = "SAVE10")]
    Save10,
    #[serde(rename = "SAVE20")]
    Save20,
}

impl PromoCode {
    /// Parse user input; surrounding whitespace and case are ignored.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::InvalidPromoCode` for anything but `SAVE10` or
    /// `SAVE20`.
    pub fn parse(input: &str) -> Result<Self, PricingError> {
        match input.trim().to_uppercase().as_str() {
            "SAVE10" => Ok(Self::Save10),
            "SAVE20" => Ok(Self::Save20),
            _ => Err(PricingError::InvalidPromoCode(input.trim().to_owned())),
        }
    }

    /// The code as typed by customers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Save10 => "SAVE10",
            Self::Save20 => "SAVE20",
        }
    }

    /// Discount percentage granted by the code.
    #[must_use]
    pub const fn percent_off(self) -> u32 {
        match self {
            Self::Save10 => 10,
            Self::Save20 => 20,
        }
    }
}

impl std::fmt::Display for PromoCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Available shipping methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    /// All methods in display order.
    pub const ALL: [Self; 3] = [Self::Standard, Self::Express, Self::Overnight];

    /// Parse a method id (`standard`, `express`, `overnight`).
    ///
    /// # Errors
    ///
    /// Returns `PricingError::InvalidShippingMethod` for unknown ids.
    pub fn parse(id: &str) -> Result<Self, PricingError> {
        match id {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "overnight" => Ok(Self::Overnight),
            other => Err(PricingError::InvalidShippingMethod(other.to_owned())),
        }
    }

    /// Method id used in forms and storage.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
        }
    }

    /// Display record for this method.
    #[must_use]
    pub fn option(self) -> ShippingOption {
        let (name, cents, description, estimated_days) = match self {
            Self::Standard => (
                "Standard Shipping",
                0,
                "Free shipping on orders over $50",
                "5-7 business days",
            ),
            Self::Express => ("Express Shipping", 999, "Fast delivery", "2-3 business days"),
            Self::Overnight => (
                "Overnight Shipping",
                2499,
                "Next day delivery",
                "1 business day",
            ),
        };
        ShippingOption {
            id: self,
            name: name.to_owned(),
            price: Price::from_cents(cents),
            description: description.to_owned(),
            estimated_days: estimated_days.to_owned(),
        }
    }

    /// Shipping charged for an order with the given subtotal.
    ///
    /// Standard shipping is free from $50.
    #[must_use]
    pub fn cost_for(self, subtotal: Price) -> Price {
        if self == Self::Standard && subtotal >= Price::from_cents(FREE_SHIPPING_THRESHOLD_CENTS) {
            return Price::zero();
        }
        self.option().price
    }
}

/// Display record for a shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub id: ShippingMethod,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub estimated_days: String,
}

/// Derived order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Price,
    pub discount: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl OrderSummary {
    /// Compute totals from a subtotal, an optional promo code and a shipping
    /// method.
    ///
    /// - discount = subtotal x promo percentage
    /// - shipping = method price (standard is free from $50)
    /// - tax = 8 % of (subtotal - discount)
    /// - total = subtotal - discount + shipping + tax
    ///
    /// Amounts are exact; use [`OrderSummary::rounded`] for display.
    #[must_use]
    pub fn compute(subtotal: Price, promo: Option<PromoCode>, shipping: ShippingMethod) -> Self {
        let discount = promo.map_or_else(Price::zero, |code| subtotal.percent(code.percent_off()));
        let shipping = shipping.cost_for(subtotal);
        let tax = (subtotal - discount).percent(TAX_RATE_PERCENT);
        let total = subtotal - discount + shipping + tax;

        Self {
            subtotal,
            discount,
            shipping,
            tax,
            total,
        }
    }

    /// Every amount rounded to cents independently.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: self.subtotal.round_cents(),
            discount: self.discount.round_cents(),
            shipping: self.shipping.round_cents(),
            tax: self.tax.round_cents(),
            total: self.total.round_cents(),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<CartItem>,
    pub summary: OrderSummary,
    pub shipping_option: ShippingOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoCode>,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub email: String,
    pub payment_method: PaymentMethodType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last_four: Option<String>,
}

impl Order {
    /// Build an order placed at `placed_at` from the cart contents.
    #[must_use]
    pub fn place(
        items: Vec<CartItem>,
        promo: Option<PromoCode>,
        shipping: ShippingMethod,
        email: String,
        payment_method: PaymentMethodType,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let subtotal: Price = items.iter().map(CartItem::line_total).sum();
        Self {
            id: OrderId::from_timestamp_millis(placed_at.timestamp_millis()),
            summary: OrderSummary::compute(subtotal, promo, shipping),
            shipping_option: shipping.option(),
            promo,
            items,
            status: OrderStatus::Processing,
            order_date: placed_at,
            estimated_delivery: placed_at.checked_add_days(Days::new(DELIVERY_ESTIMATE_DAYS)),
            email,
            payment_method,
            card_last_four: None,
        }
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.quantity)
            .fold(0, u32::saturating_add)
    }
}
