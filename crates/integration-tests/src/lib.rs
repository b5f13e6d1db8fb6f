//! Integration tests for Zard Shop.
//!
//! Each test spawns the storefront in-process on an ephemeral port and talks
//! to it over HTTP with a cookie-holding client, so every test gets its own
//! visitor session.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zard-shop-integration-tests
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, redirect};
use serde_json::Value;

use zard_shop_storefront::config::StorefrontConfig;
use zard_shop_storefront::state::AppState;

/// A storefront running on a local ephemeral port.
pub struct TestServer {
    pub base_url: String,
    /// Follows redirects, like a browser.
    pub client: Client,
    /// Same cookie jar, but stops at redirects so tests can inspect them.
    pub raw: Client,
}

impl TestServer {
    /// Spawn a storefront with the built-in catalog and no checkout delay.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot bind or the HTTP clients cannot be built.
    pub async fn spawn() -> Self {
        let config = StorefrontConfig {
            checkout_delay: Duration::ZERO,
            ..StorefrontConfig::default()
        };
        let state = AppState::from_config(config).expect("built-in catalog should load");
        let app = zard_shop_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self::connect(format!("http://{addr}"))
    }

    /// Clients with a fresh cookie jar, i.e. a new visitor session.
    fn connect(base_url: String) -> Self {
        let jar = std::sync::Arc::new(reqwest::cookie::Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .expect("Failed to create HTTP client");
        let raw = Client::builder()
            .cookie_provider(jar)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            client,
            raw,
        }
    }

    /// Another visitor of the same storefront, with its own session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP clients cannot be built.
    #[must_use]
    pub fn other_visitor(&self) -> Self {
        Self::connect(self.base_url.clone())
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a page and return its body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or does not answer 200.
    pub async fn page(&self, path: &str) -> String {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed");
        assert_eq!(resp.status(), 200, "GET {path}");
        resp.text().await.expect("body should be text")
    }

    /// POST a form, follow the redirect and return the landing page body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the landing page is not 200.
    pub async fn submit(&self, path: &str, form: &[(&str, &str)]) -> String {
        let resp = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed");
        assert_eq!(resp.status(), 200, "POST {path}");
        resp.text().await.expect("body should be text")
    }

    /// GET a JSON endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
            .json()
            .await
            .expect("body should be JSON")
    }

    /// Add a product to the cart.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> String {
        let quantity = quantity.to_string();
        self.submit(
            "/shop/cart/add",
            &[("product_id", product_id), ("quantity", quantity.as_str())],
        )
        .await
    }
}

/// Read a decimal amount from JSON, which may be a string or a number.
///
/// # Panics
///
/// Panics if the value is not an amount.
#[must_use]
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().expect("amount string should parse"),
        Value::Number(n) => n.as_f64().expect("amount should be finite"),
        other => panic!("expected an amount, got {other}"),
    }
}
