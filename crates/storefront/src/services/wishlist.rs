//! Wishlist store and bulk selection.
//!
//! Entries are persisted under `zard-shop-wishlist`; the product IDs picked
//! for bulk actions are persisted under `wishlist-selection`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use zard_shop_core::{Price, Product, ProductId, WishlistItem, WishlistItemId};

use crate::models::{Notice, session_keys};
use crate::services::cart::{AddToCartOptions, CartStore};
use crate::services::catalog::Catalog;
use crate::services::storage::{LocalStorage, StorageError, Stored, read_json, write_json};

/// Stored form of an entry. The product snapshot is ignored on load and
/// replaced with live catalog data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    id: WishlistItemId,
    product_id: ProductId,
    added_date: DateTime<Utc>,
}

/// Aggregate figures for the wishlist sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistSummary {
    pub total_items: usize,
    pub total_value: Price,
    pub in_stock_items: usize,
    pub on_sale_items: usize,
}

/// Product IDs selected for bulk actions, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishlistSelection(Vec<ProductId>);

impl WishlistSelection {
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.0.contains(product_id)
    }

    /// Select the product if unselected, deselect it otherwise.
    pub fn toggle(&mut self, product_id: &ProductId) {
        if let Some(index) = self.0.iter().position(|id| id == product_id) {
            self.0.remove(index);
        } else {
            self.0.push(product_id.clone());
        }
    }

    pub fn remove(&mut self, product_id: &ProductId) {
        self.0.retain(|id| id != product_id);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// A visitor's wishlist bound to its storage.
#[derive(Debug)]
pub struct WishlistStore<S> {
    storage: S,
    items: Vec<WishlistItem>,
    selection: WishlistSelection,
}

impl<S: LocalStorage> WishlistStore<S> {
    /// Load the wishlist and rehydrate every entry against the catalog.
    ///
    /// Entries whose product no longer exists are dropped. Unparsable data
    /// resets the wishlist to empty. Selected IDs that are not on the
    /// wishlist are pruned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend fails.
    pub async fn load(storage: S, catalog: &Catalog) -> Result<Self, StorageError> {
        let mut dirty = false;
        let items = match read_json::<_, Vec<StoredEntry>>(&storage, session_keys::WISHLIST).await? {
            Stored::Missing => Vec::new(),
            Stored::Corrupt(e) => {
                tracing::error!("Error loading wishlist from storage: {e}");
                dirty = true;
                Vec::new()
            }
            Stored::Value(entries) => {
                let count = entries.len();
                let items: Vec<WishlistItem> = entries
                    .into_iter()
                    .filter_map(|entry| {
                        let product = catalog.get_product(&entry.product_id)?;
                        Some(WishlistItem {
                            id: entry.id,
                            product_id: entry.product_id,
                            product: product.clone(),
                            added_date: entry.added_date,
                        })
                    })
                    .collect();
                dirty = items.len() != count;
                items
            }
        };

        let mut selection =
            match read_json::<_, WishlistSelection>(&storage, session_keys::WISHLIST_SELECTION)
                .await?
            {
                Stored::Value(selection) => selection,
                Stored::Missing | Stored::Corrupt(_) => WishlistSelection::default(),
            };
        let selected = selection.len();
        selection
            .0
            .retain(|id| items.iter().any(|item| &item.product_id == id));

        let store = Self {
            storage,
            items,
            selection,
        };
        if dirty {
            store.persist_items().await?;
        }
        if store.selection.len() != selected {
            store.persist_selection().await?;
        }
        Ok(store)
    }

    async fn persist_items(&self) -> Result<(), StorageError> {
        write_json(&self.storage, session_keys::WISHLIST, &self.items).await
    }

    async fn persist_selection(&self) -> Result<(), StorageError> {
        write_json(&self.storage, session_keys::WISHLIST_SELECTION, &self.selection).await
    }

    /// Entries in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    /// Save a product. Returns `false` when it was already saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be saved.
    pub async fn add_to_wishlist(&mut self, product: &Product) -> Result<bool, StorageError> {
        if self.is_in_wishlist(&product.id) {
            return Ok(false);
        }
        self.items.push(WishlistItem::new(product.clone()));
        self.persist_items().await?;
        Ok(true)
    }

    /// Remove a product and deselect it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be saved.
    pub async fn remove_from_wishlist(&mut self, product_id: &ProductId) -> Result<(), StorageError> {
        self.items.retain(|item| &item.product_id != product_id);
        self.persist_items().await?;

        if self.selection.contains(product_id) {
            self.selection.remove(product_id);
            self.persist_selection().await?;
        }
        Ok(())
    }

    /// Remove a product if saved, add it otherwise. Returns `true` when the
    /// product is now on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be saved.
    pub async fn toggle_wishlist(&mut self, product: &Product) -> Result<bool, StorageError> {
        if self.is_in_wishlist(&product.id) {
            self.remove_from_wishlist(&product.id).await?;
            Ok(false)
        } else {
            self.add_to_wishlist(product).await
        }
    }

    /// Remove every entry and the selection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be saved.
    pub async fn clear_wishlist(&mut self) -> Result<Notice, StorageError> {
        self.items.clear();
        self.selection.clear();
        self.persist_items().await?;
        self.persist_selection().await?;
        Ok(Notice::success("Wishlist cleared"))
    }

    #[must_use]
    pub fn summary(&self) -> WishlistSummary {
        WishlistSummary {
            total_items: self.items.len(),
            total_value: self.items.iter().map(|item| item.product.price).sum(),
            in_stock_items: self.items.iter().filter(|item| item.product.in_stock).count(),
            on_sale_items: self.items.iter().filter(|item| item.product.is_sale).count(),
        }
    }

    // =========================================================================
    // Bulk selection
    // =========================================================================

    #[must_use]
    pub const fn selection(&self) -> &WishlistSelection {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, product_id: &ProductId) -> bool {
        self.selection.contains(product_id)
    }

    /// Whether every entry of a non-empty wishlist is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.items.is_empty() && self.selection.len() == self.items.len()
    }

    /// Sum of prices of the selected entries.
    #[must_use]
    pub fn selected_total(&self) -> Price {
        self.selected_products().map(|product| product.price).sum()
    }

    fn selected_products(&self) -> impl Iterator<Item = &Product> {
        self.items
            .iter()
            .filter(|item| self.selection.contains(&item.product_id))
            .map(|item| &item.product)
    }

    /// Toggle selection of a saved product. IDs not on the wishlist are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the selection cannot be saved.
    pub async fn toggle_selection(&mut self, product_id: &ProductId) -> Result<(), StorageError> {
        if !self.is_in_wishlist(product_id) {
            return Ok(());
        }
        self.selection.toggle(product_id);
        self.persist_selection().await
    }

    /// Select every entry, or deselect all when everything is selected.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the selection cannot be saved.
    pub async fn select_all(&mut self) -> Result<(), StorageError> {
        if self.all_selected() {
            self.selection.clear();
        } else {
            self.selection = WishlistSelection(
                self.items
                    .iter()
                    .map(|item| item.product_id.clone())
                    .collect(),
            );
        }
        self.persist_selection().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the selection cannot be saved.
    pub async fn clear_selection(&mut self) -> Result<(), StorageError> {
        self.selection.clear();
        self.persist_selection().await
    }

    /// Add one unit of every selected product to the cart and clear the
    /// selection. Returns the number of products added.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart or selection cannot be saved.
    pub async fn add_selected_to_cart<C: LocalStorage>(
        &mut self,
        cart: &mut CartStore<C>,
    ) -> Result<(usize, Notice), StorageError> {
        let products: Vec<Product> = self.selected_products().cloned().collect();
        for product in &products {
            cart.add_to_cart(product, AddToCartOptions::default()).await?;
        }
        self.clear_selection().await?;

        let count = products.len();
        Ok((count, Notice::success(format!("{count} items added to cart!"))))
    }

    /// Remove every selected product from the wishlist and clear the
    /// selection. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be saved.
    pub async fn remove_selected(&mut self) -> Result<(usize, Notice), StorageError> {
        let before = self.items.len();
        let selection = std::mem::take(&mut self.selection);
        self.items
            .retain(|item| !selection.contains(&item.product_id));
        self.persist_items().await?;
        self.persist_selection().await?;

        let count = before - self.items.len();
        Ok((
            count,
            Notice::success(format!("{count} items removed from wishlist")),
        ))
    }
}

/// Notice shown after toggling a product from a listing or product page.
#[must_use]
pub fn toggle_notice(product: &Product, added: bool) -> Notice {
    if added {
        Notice::success(format!("{} added to wishlist!", product.name))
            .with_description("You can view your wishlist items later")
    } else {
        Notice::success(format!("{} removed from wishlist!", product.name))
    }
}

/// Human-friendly age of a wishlist entry.
#[must_use]
pub fn relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - date).num_days();
    match days {
        ..=0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => format!("{} months ago", days / 30),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::catalog::tests::catalog;
    use crate::services::storage::MemoryStorage;

    async fn store_with(
        catalog: &Catalog,
        ids: &[&str],
    ) -> WishlistStore<MemoryStorage> {
        let mut store = WishlistStore::load(MemoryStorage::new(), catalog)
            .await
            .unwrap();
        for id in ids {
            let product = catalog.get_product(&ProductId::new(*id)).unwrap();
            store.add_to_wishlist(product).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1"]).await;
        let product = catalog.get_product(&ProductId::new("1")).unwrap();

        assert!(!store.add_to_wishlist(product).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_wishlist() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &[]).await;
        let product = catalog.get_product(&ProductId::new("6")).unwrap();

        assert!(store.toggle_wishlist(product).await.unwrap());
        assert!(store.is_in_wishlist(&product.id));
        assert!(!store.toggle_wishlist(product).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_summary() {
        let catalog = catalog();
        let store = store_with(&catalog, &["1", "3", "6"]).await;
        let summary = store.summary();

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_value, Price::from_cents(68_700));
        assert_eq!(summary.in_stock_items, 2);
        assert_eq!(summary.on_sale_items, 2);
    }

    #[tokio::test]
    async fn test_load_rehydrates_and_drops_orphans() {
        let catalog = catalog();
        let storage = MemoryStorage::new();
        let stored = serde_json::json!([
            {
                "id": "wish_a",
                "productId": "12",
                "product": {"name": "stale snapshot"},
                "addedDate": "2024-01-01T00:00:00Z"
            },
            {
                "id": "wish_b",
                "productId": "999",
                "product": {},
                "addedDate": "2024-01-02T00:00:00Z"
            }
        ]);
        storage
            .set_item(session_keys::WISHLIST, stored.to_string())
            .await
            .unwrap();

        let store = WishlistStore::load(storage.clone(), &catalog).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.items()[0].product.name, "Gaming Mechanical Keyboard");

        // The orphan is gone from storage as well.
        let reloaded = storage.get_item(session_keys::WISHLIST).await.unwrap().unwrap();
        assert!(!reloaded.contains("999"));
    }

    #[tokio::test]
    async fn test_corrupt_storage_resets() {
        let catalog = catalog();
        let storage = MemoryStorage::new();
        storage
            .set_item(session_keys::WISHLIST, "{".to_string())
            .await
            .unwrap();

        let store = WishlistStore::load(storage.clone(), &catalog).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(
            storage.get_item(session_keys::WISHLIST).await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_select_all_toggles() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1", "2"]).await;

        store.select_all().await.unwrap();
        assert!(store.all_selected());
        assert_eq!(store.selected_total(), Price::from_cents(32_800));

        store.select_all().await.unwrap();
        assert!(store.selection().is_empty());
        assert!(!store.all_selected());
    }

    #[tokio::test]
    async fn test_all_selected_false_for_empty_wishlist() {
        let catalog = catalog();
        let store = store_with(&catalog, &[]).await;
        assert!(!store.all_selected());
    }

    #[tokio::test]
    async fn test_toggle_selection_ignores_unknown_products() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1"]).await;

        store.toggle_selection(&ProductId::new("2")).await.unwrap();
        assert!(store.selection().is_empty());

        store.toggle_selection(&ProductId::new("1")).await.unwrap();
        assert!(store.is_selected(&ProductId::new("1")));
    }

    #[tokio::test]
    async fn test_remove_deselects() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1", "2"]).await;
        store.select_all().await.unwrap();

        store.remove_from_wishlist(&ProductId::new("1")).await.unwrap();
        assert_eq!(store.selection().ids(), &[ProductId::new("2")]);
        assert!(store.all_selected());
    }

    #[tokio::test]
    async fn test_add_selected_to_cart() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1", "2", "4"]).await;
        let mut cart = CartStore::load(MemoryStorage::new()).await.unwrap();

        store.toggle_selection(&ProductId::new("1")).await.unwrap();
        store.toggle_selection(&ProductId::new("4")).await.unwrap();
        let (count, notice) = store.add_selected_to_cart(&mut cart).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(notice.title, "2 items added to cart!");
        assert_eq!(cart.total_items(), 2);
        assert!(store.selection().is_empty());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_selected() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1", "2", "4"]).await;
        store.toggle_selection(&ProductId::new("2")).await.unwrap();
        store.toggle_selection(&ProductId::new("4")).await.unwrap();

        let (count, notice) = store.remove_selected().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(notice.title, "2 items removed from wishlist");
        assert_eq!(store.len(), 1);
        assert!(store.selection().is_empty());
    }

    #[tokio::test]
    async fn test_clear_wishlist_clears_selection() {
        let catalog = catalog();
        let mut store = store_with(&catalog, &["1", "2"]).await;
        store.select_all().await.unwrap();

        store.clear_wishlist().await.unwrap();
        assert!(store.is_empty());
        assert!(store.selection().is_empty());
    }

    #[tokio::test]
    async fn test_selection_persists_and_prunes() {
        let catalog = catalog();
        let storage = MemoryStorage::new();
        storage
            .set_item(
                session_keys::WISHLIST_SELECTION,
                r#"["1","7"]"#.to_string(),
            )
            .await
            .unwrap();

        let mut store = WishlistStore::load(storage.clone(), &catalog).await.unwrap();
        assert!(store.selection().is_empty());

        let product = catalog.get_product(&ProductId::new("1")).unwrap();
        store.add_to_wishlist(product).await.unwrap();
        store.toggle_selection(&product.id).await.unwrap();

        let reloaded = WishlistStore::load(storage, &catalog).await.unwrap();
        assert!(reloaded.is_selected(&product.id));
    }

    #[test]
    fn test_relative_date() {
        let now = Utc::now();
        assert_eq!(relative_date(now, now), "today");
        assert_eq!(relative_date(now + Duration::hours(2), now), "today");
        assert_eq!(relative_date(now - Duration::hours(30), now), "yesterday");
        assert_eq!(relative_date(now - Duration::days(3), now), "3 days ago");
        assert_eq!(relative_date(now - Duration::days(14), now), "2 weeks ago");
        assert_eq!(relative_date(now - Duration::days(29), now), "4 weeks ago");
        assert_eq!(relative_date(now - Duration::days(65), now), "2 months ago");
    }

    #[test]
    fn test_toggle_notice() {
        let catalog = catalog();
        let product = catalog.get_product(&ProductId::new("1")).unwrap();
        assert_eq!(
            toggle_notice(product, true).title,
            "Premium Wireless Headphones added to wishlist!"
        );
        assert!(toggle_notice(product, false).description.is_none());
    }
}
