//! Type-safe price representation using decimal arithmetic.
//!
//! All storefront amounts are US dollars. Arithmetic stays exact; rounding to
//! cents happens only when an amount is displayed or reported.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A USD amount.
///
/// ```
/// use zard_shop_core::Price;
///
/// let shirt = Price::from_cents(2900);
/// assert_eq!(shirt.times(3).display(), "$87.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount in dollars.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// A zero amount.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The exact decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round to whole cents (midpoint away from zero).
    #[must_use]
    pub fn round_cents(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by a per-unit quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Take a percentage of this amount (`percent(8)` is 8 %).
    #[must_use]
    pub fn percent(&self, percent: u32) -> Self {
        Self(self.0 * Decimal::from(percent) / Decimal::ONE_HUNDRED)
    }

    /// Format for display, rounded to cents (e.g., `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.round_cents().0;
        if rounded.is_sign_negative() && !rounded.is_zero() {
            format!("-${:.2}", rounded.abs())
        } else {
            format!("${:.2}", rounded.abs())
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
