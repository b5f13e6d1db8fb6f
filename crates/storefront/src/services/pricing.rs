//! Promo code and shipping choice shared by the cart and checkout pages.

use zard_shop_core::{PricingError, PromoCode, ShippingMethod};

use crate::models::{Notice, session_keys};
use crate::services::storage::{LocalStorage, StorageError, Stored, read_json, write_json};

/// The visitor's pricing choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingSelection {
    pub promo: Option<PromoCode>,
    pub shipping: ShippingMethod,
}

impl PricingSelection {
    /// Read the stored choices. Missing or unreadable values fall back to no
    /// promo and standard shipping.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend fails.
    pub async fn load<S: LocalStorage>(storage: &S) -> Result<Self, StorageError> {
        let promo = match read_json(storage, session_keys::APPLIED_PROMO).await? {
            Stored::Value(promo) => Some(promo),
            Stored::Missing | Stored::Corrupt(_) => None,
        };
        let shipping = match read_json(storage, session_keys::SELECTED_SHIPPING).await? {
            Stored::Value(shipping) => shipping,
            Stored::Missing | Stored::Corrupt(_) => ShippingMethod::default(),
        };
        Ok(Self { promo, shipping })
    }
}

/// Apply a promo code typed by the visitor.
///
/// Valid codes are stored and produce a success notice; anything else
/// produces an error notice and leaves the applied code untouched.
///
/// # Errors
///
/// Returns `StorageError` if the code cannot be stored.
pub async fn apply_promo<S: LocalStorage>(storage: &S, input: &str) -> Result<Notice, StorageError> {
    match PromoCode::parse(input) {
        Ok(code) => {
            write_json(storage, session_keys::APPLIED_PROMO, &code).await?;
            Ok(Notice::success(format!("Promo code {code} applied!")).with_description(format!(
                "You saved {}% on your order",
                code.percent_off()
            )))
        }
        Err(PricingError::InvalidPromoCode(code)) => {
            tracing::debug!(code = %code, "Rejected promo code");
            Ok(Notice::error("Invalid promo code")
                .with_description("Please check your promo code and try again"))
        }
        Err(e) => {
            tracing::debug!("Rejected promo code: {e}");
            Ok(Notice::error("Invalid promo code"))
        }
    }
}

/// Remove the applied promo code.
///
/// # Errors
///
/// Returns `StorageError` if the storage backend fails.
pub async fn remove_promo<S: LocalStorage>(storage: &S) -> Result<(), StorageError> {
    storage.remove_item(session_keys::APPLIED_PROMO).await
}

/// Store the selected shipping method.
///
/// # Errors
///
/// Returns `StorageError` if the storage backend fails.
pub async fn select_shipping<S: LocalStorage>(
    storage: &S,
    method: ShippingMethod,
) -> Result<(), StorageError> {
    write_json(storage, session_keys::SELECTED_SHIPPING, &method).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::NoticeLevel;
    use crate::services::storage::MemoryStorage;

    #[tokio::test]
    async fn test_defaults() {
        let storage = MemoryStorage::new();
        let selection = PricingSelection::load(&storage).await.unwrap();
        assert_eq!(selection, PricingSelection::default());
        assert_eq!(selection.shipping, ShippingMethod::Standard);
    }

    #[tokio::test]
    async fn test_apply_valid_promo() {
        let storage = MemoryStorage::new();
        let notice = apply_promo(&storage, " save20 ").await.unwrap();

        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.title, "Promo code SAVE20 applied!");
        assert_eq!(notice.description.as_deref(), Some("You saved 20% on your order"));
        assert_eq!(
            PricingSelection::load(&storage).await.unwrap().promo,
            Some(PromoCode::Save20)
        );
    }

    #[tokio::test]
    async fn test_invalid_promo_keeps_applied_code() {
        let storage = MemoryStorage::new();
        apply_promo(&storage, "SAVE10").await.unwrap();

        let notice = apply_promo(&storage, "FREESTUFF").await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Invalid promo code");
        assert_eq!(
            PricingSelection::load(&storage).await.unwrap().promo,
            Some(PromoCode::Save10)
        );

        remove_promo(&storage).await.unwrap();
        assert!(PricingSelection::load(&storage).await.unwrap().promo.is_none());
    }

    #[tokio::test]
    async fn test_select_shipping() {
        let storage = MemoryStorage::new();
        select_shipping(&storage, ShippingMethod::Overnight)
            .await
            .unwrap();
        assert_eq!(
            PricingSelection::load(&storage).await.unwrap().shipping,
            ShippingMethod::Overnight
        );
    }
}
