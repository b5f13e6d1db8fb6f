//! Session-related types.
//!
//! Visitor state lives in the session under the keys below. Each value is a
//! JSON string, matching what the browser storefront kept in `localStorage`.

use serde::{Deserialize, Serialize};

use crate::services::storage::{LocalStorage, StorageError, Stored, read_json, write_json};

/// Session keys for visitor state.
pub mod keys {
    /// Cart line items.
    pub const CART: &str = "cart";

    /// Wishlist entries.
    pub const WISHLIST: &str = "zard-shop-wishlist";

    /// Product IDs selected for wishlist bulk actions.
    pub const WISHLIST_SELECTION: &str = "wishlist-selection";

    /// The applied promo code, if any.
    pub const APPLIED_PROMO: &str = "applied_promo";

    /// The selected shipping method.
    pub const SELECTED_SHIPPING: &str = "selected_shipping";

    /// Orders placed by this visitor, most recent last.
    pub const PLACED_ORDERS: &str = "placed_orders";

    /// Flash notices waiting to be shown.
    pub const NOTICES: &str = "notices";
}

/// Severity of a flash notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

impl NoticeLevel {
    /// CSS modifier used by the notice template.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: None,
        }
    }

    /// Attach a secondary line.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Queue notices for the next page render.
///
/// # Errors
///
/// Returns `StorageError` if the session cannot be written.
pub async fn push_notices<S: LocalStorage>(
    storage: &S,
    notices: impl IntoIterator<Item = Notice>,
) -> Result<(), StorageError> {
    let mut pending = match read_json::<_, Vec<Notice>>(storage, keys::NOTICES).await? {
        Stored::Value(pending) => pending,
        Stored::Missing | Stored::Corrupt(_) => Vec::new(),
    };
    let before = pending.len();
    pending.extend(notices);
    if pending.len() == before {
        return Ok(());
    }
    write_json(storage, keys::NOTICES, &pending).await
}

/// Queue a single notice.
///
/// # Errors
///
/// Returns `StorageError` if the session cannot be written.
pub async fn push_notice<S: LocalStorage>(storage: &S, notice: Notice) -> Result<(), StorageError> {
    push_notices(storage, [notice]).await
}

/// Remove and return every pending notice.
///
/// # Errors
///
/// Returns `StorageError` if the session cannot be read or written.
pub async fn take_notices<S: LocalStorage>(storage: &S) -> Result<Vec<Notice>, StorageError> {
    let notices = match read_json::<_, Vec<Notice>>(storage, keys::NOTICES).await? {
        Stored::Missing => return Ok(Vec::new()),
        Stored::Value(notices) => notices,
        Stored::Corrupt(e) => {
            tracing::warn!("Discarding unreadable notices: {e}");
            Vec::new()
        }
    };
    storage.remove_item(keys::NOTICES).await?;
    Ok(notices)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;

    #[tokio::test]
    async fn test_notices_are_taken_once() {
        let storage = MemoryStorage::new();
        push_notice(&storage, Notice::success("Saved")).await.unwrap();
        push_notice(
            &storage,
            Notice::error("Invalid promo code").with_description("Try again"),
        )
        .await
        .unwrap();

        let notices = take_notices(&storage).await.unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[1].description.as_deref(), Some("Try again"));

        assert!(take_notices(&storage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pushing_nothing_leaves_storage_untouched() {
        let storage = MemoryStorage::new();
        push_notices(&storage, Vec::new()).await.unwrap();
        assert!(storage.get_item(keys::NOTICES).await.unwrap().is_none());
    }
}
