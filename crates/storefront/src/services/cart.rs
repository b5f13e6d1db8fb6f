//! Cart store.
//!
//! The cart is an ordered list of [`CartItem`]s persisted under the `cart`
//! key after every mutation. Mutations that the visitor should hear about
//! return a [`Notice`] for the caller to flash.

use tracing::instrument;

use zard_shop_core::{
    CartItem, CartItemId, OrderSummary, Price, Product, ProductId, PromoCode, ShippingMethod,
};

use crate::models::{Notice, session_keys};
use crate::services::storage::{LocalStorage, StorageError, Stored, read_json, write_json};

/// Variant and quantity chosen when adding a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddToCartOptions {
    pub color: Option<String>,
    pub size: Option<String>,
    /// Units to add; 0 counts as 1 and the line never exceeds
    /// [`CartItem::MAX_QUANTITY`].
    pub quantity: u32,
}

impl AddToCartOptions {
    /// One unit of a specific variant.
    #[must_use]
    pub const fn variant(color: Option<String>, size: Option<String>) -> Self {
        Self {
            color,
            size,
            quantity: 1,
        }
    }
}

/// A visitor's cart bound to its storage.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    items: Vec<CartItem>,
}

impl<S: LocalStorage> CartStore<S> {
    /// Load the cart from storage.
    ///
    /// A stored value that does not parse is logged and the cart starts empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend fails.
    pub async fn load(storage: S) -> Result<Self, StorageError> {
        let items = match read_json::<_, Vec<CartItem>>(&storage, session_keys::CART).await? {
            Stored::Value(items) => items,
            Stored::Missing => Vec::new(),
            Stored::Corrupt(e) => {
                tracing::error!("Error loading cart from storage: {e}");
                Vec::new()
            }
        };
        Ok(Self { storage, items })
    }

    async fn persist(&self) -> Result<(), StorageError> {
        write_json(&self.storage, session_keys::CART, &self.items).await
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Sum of price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn has_out_of_stock_items(&self) -> bool {
        self.items.iter().any(|item| !item.in_stock)
    }

    /// Order totals for the current contents.
    #[must_use]
    pub fn summary(&self, promo: Option<PromoCode>, shipping: ShippingMethod) -> OrderSummary {
        OrderSummary::compute(self.subtotal(), promo, shipping)
    }

    #[must_use]
    pub fn get_cart_item(&self, item_id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    /// Whether the exact product variant is in the cart.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId, color: Option<&str>, size: Option<&str>) -> bool {
        self.items
            .iter()
            .any(|item| item.matches(product_id, color, size))
    }

    /// Add a product, merging into an existing line for the same variant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(
        &mut self,
        product: &Product,
        options: AddToCartOptions,
    ) -> Result<Notice, StorageError> {
        let quantity = options.quantity.clamp(1, CartItem::MAX_QUANTITY);
        let existing = self.items.iter_mut().find(|item| {
            item.matches(
                &product.id,
                options.color.as_deref(),
                options.size.as_deref(),
            )
        });

        match existing {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .saturating_add(quantity)
                    .min(CartItem::MAX_QUANTITY);
            }
            None => self.items.push(CartItem::from_product(
                product,
                quantity,
                options.color.clone(),
                options.size.clone(),
            )),
        }
        self.persist().await?;

        let mut description = format!("Quantity: {quantity}");
        if let Some(color) = &options.color {
            description.push_str(&format!(", Color: {color}"));
        }
        if let Some(size) = &options.size {
            description.push_str(&format!(", Size: {size}"));
        }
        Ok(Notice::success(format!("{} added to cart!", product.name)).with_description(description))
    }

    /// Remove a line. Returns a notice when the line existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn remove_from_cart(
        &mut self,
        item_id: &CartItemId,
    ) -> Result<Option<Notice>, StorageError> {
        let removed = self
            .items
            .iter()
            .position(|item| &item.id == item_id)
            .map(|index| self.items.remove(index));
        self.persist().await?;

        Ok(removed.map(|item| Notice::success(format!("{} removed from cart", item.name))))
    }

    /// Set a line's quantity; zero or less removes the line and anything
    /// above [`CartItem::MAX_QUANTITY`] is capped.
    ///
    /// Unknown IDs leave the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn update_quantity(
        &mut self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<Option<Notice>, StorageError> {
        if quantity <= 0 {
            return self.remove_from_cart(item_id).await;
        }
        let quantity = u32::try_from(quantity)
            .map_or(CartItem::MAX_QUANTITY, |q| q.min(CartItem::MAX_QUANTITY));
        self.set_quantity(item_id, quantity).await?;
        Ok(None)
    }

    async fn set_quantity(&mut self, item_id: &CartItemId, quantity: u32) -> Result<(), StorageError> {
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == item_id) {
            item.quantity = quantity;
        }
        self.persist().await
    }

    /// Add one unit to a line, up to [`CartItem::MAX_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn increase_quantity(&mut self, item_id: &CartItemId) -> Result<(), StorageError> {
        let Some(current) = self.get_cart_item(item_id).map(|item| item.quantity) else {
            return Ok(());
        };
        if current >= CartItem::MAX_QUANTITY {
            return Ok(());
        }
        self.set_quantity(item_id, current + 1).await
    }

    /// Remove one unit from a line, never going below one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn decrease_quantity(&mut self, item_id: &CartItemId) -> Result<(), StorageError> {
        let Some(current) = self.get_cart_item(item_id).map(|item| item.quantity) else {
            return Ok(());
        };
        if current > 1 {
            self.set_quantity(item_id, current - 1).await?;
        }
        Ok(())
    }

    /// Empty the cart. Returns a notice when something was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn clear_cart(&mut self) -> Result<Option<Notice>, StorageError> {
        let count = self.items.len();
        self.items.clear();
        self.persist().await?;

        if count == 0 {
            return Ok(None);
        }
        let noun = if count == 1 { "item" } else { "items" };
        Ok(Some(
            Notice::success("Cart cleared successfully")
                .with_description(format!("Removed {count} {noun} from cart")),
        ))
    }

    /// Drop every out-of-stock line, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn remove_out_of_stock(&mut self) -> Result<usize, StorageError> {
        let before = self.items.len();
        self.items.retain(|item| item.in_stock);
        let removed = before - self.items.len();
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Remove and return every line without a notice (used when an order is
    /// placed).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be saved.
    pub async fn take_items(&mut self) -> Result<Vec<CartItem>, StorageError> {
        let items = std::mem::take(&mut self.items);
        self.persist().await?;
        Ok(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::catalog::tests::catalog;
    use crate::services::storage::MemoryStorage;

    fn product(id: &str) -> Product {
        catalog().get_product(&ProductId::new(id)).unwrap().clone()
    }

    async fn empty_cart() -> CartStore<MemoryStorage> {
        CartStore::load(MemoryStorage::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_merges_same_variant() {
        let mut cart = empty_cart().await;
        let shirt = product("2");

        cart.add_to_cart(&shirt, AddToCartOptions::variant(Some("navy".into()), Some("M".into())))
            .await
            .unwrap();
        cart.add_to_cart(
            &shirt,
            AddToCartOptions {
                color: Some("navy".into()),
                size: Some("M".into()),
                quantity: 2,
            },
        )
        .await
        .unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_items(), 3);
    }

    #[tokio::test]
    async fn test_add_different_variants_creates_lines() {
        let mut cart = empty_cart().await;
        let shirt = product("2");

        cart.add_to_cart(&shirt, AddToCartOptions::variant(Some("navy".into()), None))
            .await
            .unwrap();
        cart.add_to_cart(&shirt, AddToCartOptions::variant(Some("white".into()), None))
            .await
            .unwrap();
        cart.add_to_cart(&shirt, AddToCartOptions::default())
            .await
            .unwrap();

        assert_eq!(cart.items().len(), 3);
        assert!(cart.is_in_cart(&shirt.id, Some("white"), None));
        assert!(cart.is_in_cart(&shirt.id, None, None));
        assert!(!cart.is_in_cart(&shirt.id, Some("black"), None));
    }

    #[tokio::test]
    async fn test_add_notice_describes_variant() {
        let mut cart = empty_cart().await;
        let notice = cart
            .add_to_cart(
                &product("8"),
                AddToCartOptions {
                    color: Some("red".into()),
                    size: Some("10".into()),
                    quantity: 2,
                },
            )
            .await
            .unwrap();

        assert_eq!(notice.title, "Running Sneakers added to cart!");
        assert_eq!(
            notice.description.as_deref(),
            Some("Quantity: 2, Color: red, Size: 10")
        );

        let plain = cart
            .add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();
        assert_eq!(plain.description.as_deref(), Some("Quantity: 1"));
    }

    #[tokio::test]
    async fn test_subtotal_and_line_totals() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(
            &product("1"),
            AddToCartOptions {
                quantity: 2,
                ..AddToCartOptions::default()
            },
        )
        .await
        .unwrap();
        cart.add_to_cart(&product("2"), AddToCartOptions::default())
            .await
            .unwrap();

        assert_eq!(cart.subtotal(), Price::from_cents(62_700));
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();
        let id = cart.items()[0].id.clone();

        assert!(cart.update_quantity(&id, 5).await.unwrap().is_none());
        assert_eq!(cart.items()[0].quantity, 5);

        let notice = cart.update_quantity(&id, 0).await.unwrap().unwrap();
        assert_eq!(notice.title, "Minimalist Desk Lamp removed from cart");
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_quantities_are_capped() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();
        cart.add_to_cart(&product("5"), AddToCartOptions::default())
            .await
            .unwrap();
        let ids: Vec<CartItemId> = cart.items().iter().map(|item| item.id.clone()).collect();

        for id in &ids {
            cart.update_quantity(id, 9_999_999_999).await.unwrap();
        }
        assert!(cart.items().iter().all(|item| item.quantity == CartItem::MAX_QUANTITY));
        assert_eq!(cart.total_items(), 2 * CartItem::MAX_QUANTITY);

        cart.increase_quantity(&ids[0]).await.unwrap();
        cart.add_to_cart(
            &product("4"),
            AddToCartOptions {
                quantity: u32::MAX,
                ..AddToCartOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cart.items()[0].quantity, CartItem::MAX_QUANTITY);
    }

    #[tokio::test]
    async fn test_update_unknown_item_is_noop() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();

        cart.update_quantity(&CartItemId::new("missing"), 4)
            .await
            .unwrap();
        assert_eq!(cart.total_items(), 1);
        assert!(
            cart.remove_from_cart(&CartItemId::new("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_decrease_never_below_one() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("7"), AddToCartOptions::default())
            .await
            .unwrap();
        let id = cart.items()[0].id.clone();

        cart.decrease_quantity(&id).await.unwrap();
        assert_eq!(cart.items()[0].quantity, 1);

        cart.increase_quantity(&id).await.unwrap();
        cart.increase_quantity(&id).await.unwrap();
        cart.decrease_quantity(&id).await.unwrap();
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_clear_cart_notice() {
        let mut cart = empty_cart().await;
        assert!(cart.clear_cart().await.unwrap().is_none());

        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();
        let notice = cart.clear_cart().await.unwrap().unwrap();
        assert_eq!(notice.title, "Cart cleared successfully");
        assert_eq!(notice.description.as_deref(), Some("Removed 1 item from cart"));

        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();
        cart.add_to_cart(&product("7"), AddToCartOptions::default())
            .await
            .unwrap();
        let notice = cart.clear_cart().await.unwrap().unwrap();
        assert_eq!(notice.description.as_deref(), Some("Removed 2 items from cart"));
    }

    #[tokio::test]
    async fn test_out_of_stock_handling() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("3"), AddToCartOptions::default())
            .await
            .unwrap();
        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();

        assert!(cart.has_out_of_stock_items());
        assert_eq!(cart.remove_out_of_stock().await.unwrap(), 1);
        assert!(!cart.has_out_of_stock_items());
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_cart_persists_across_loads() {
        let storage = MemoryStorage::new();
        let mut cart = CartStore::load(storage.clone()).await.unwrap();
        cart.add_to_cart(&product("12"), AddToCartOptions::default())
            .await
            .unwrap();

        let reloaded = CartStore::load(storage).await.unwrap();
        assert_eq!(reloaded.items(), cart.items());
        assert_eq!(reloaded.subtotal(), Price::from_cents(15_900));
    }

    #[tokio::test]
    async fn test_corrupt_storage_loads_empty() {
        let storage = MemoryStorage::new();
        storage
            .set_item(session_keys::CART, "not json".to_string())
            .await
            .unwrap();

        let cart = CartStore::load(storage).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_summary_uses_subtotal() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("1"), AddToCartOptions::default())
            .await
            .unwrap();

        let summary = cart
            .summary(Some(PromoCode::Save10), ShippingMethod::Standard)
            .rounded();
        assert_eq!(summary.total, Price::from_cents(29_063));
    }

    #[tokio::test]
    async fn test_take_items_empties_cart() {
        let mut cart = empty_cart().await;
        cart.add_to_cart(&product("4"), AddToCartOptions::default())
            .await
            .unwrap();
        let items = cart.take_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(cart.is_empty());
    }
}
