//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::catalog::{Catalog, CatalogError};
use crate::services::checkout::OrderStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the placed-order cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    orders: OrderStore,
}

impl AppState {
    /// Create application state from an already loaded catalog.
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Self {
        let orders = OrderStore::new(config.order_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                orders,
            }),
        }
    }

    /// Create application state, loading the catalog named by the
    /// configuration or the built-in seed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog seed cannot be loaded.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin()?,
        };
        tracing::info!(products = catalog.len(), "Catalog loaded");
        Ok(Self::new(config, catalog))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the placed-order cache.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }
}
