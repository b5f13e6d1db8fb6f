//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Catalog IDs are
//! assigned by the seed data; line-item and wishlist IDs are generated.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// Passing `generated` as a second argument also adds a `generate()`
/// constructor that returns a fresh random ID with the given prefix.
///
/// # Example
///
/// ```rust
/// # use zard_shop_core::define_id;
/// define_id!(SkuId);
/// define_id!(LineId, generated = "line");
///
/// let sku = SkuId::new("42");
/// let line = LineId::generate();
///
/// assert_eq!(sku.as_str(), "42");
/// assert!(line.as_str().starts_with("line_"));
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
    ($name:ident, generated = $prefix:literal) => {
        $crate::define_id!($name);

        impl $name {
            /// Generate a fresh, random ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, $crate::__uuid::Uuid::new_v4().simple()))
            }
        }
    };
}

// Catalog entities (IDs come from seed data)
define_id!(ProductId);
define_id!(ReviewId);

// Per-visitor entities
define_id!(CartItemId, generated = "item");
define_id!(WishlistItemId, generated = "wish");

/// Order number shown to the customer (e.g. `ORD-12345678`).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Prefix of every order number.
    pub const PREFIX: &'static str = "ORD-";

    /// Build an order number from a millisecond timestamp.
    ///
    /// Uses the last eight digits of the timestamp.
    #[must_use]
    pub fn from_timestamp_millis(millis: i64) -> Self {
        let digits = millis.unsigned_abs().to_string();
        let tail = digits
            .char_indices()
            .nth_back(7)
            .map_or(digits.as_str(), |(idx, _)| &digits[idx..]);
        Self(format!("{}{tail:0>8}", Self::PREFIX))
    }

    /// The order number that follows this one, wrapping after `ORD-99999999`.
    #[must_use]
    pub fn successor(&self) -> Self {
        let number = self
            .0
            .strip_prefix(Self::PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok())
            .unwrap_or(0);
        Self(format!("{}{:08}", Self::PREFIX, (number + 1) % 100_000_000))
    }

    /// Parse an order number received from a URL.
    ///
    /// Returns `None` unless the value looks like `ORD-` followed by digits.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix(Self::PREFIX)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(value.to_owned()))
    }

    /// Get the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
