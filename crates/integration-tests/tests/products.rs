//! Integration tests for the product listing, product pages and the JSON API.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;
use zard_shop_integration_tests::TestServer;

fn ids(page: &Value) -> Vec<&str> {
    page["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    assert_eq!(server.page("/health").await, "ok");
}

#[tokio::test]
async fn test_root_redirects_to_listing() {
    let server = TestServer::spawn().await;
    for path in ["/", "/shop"] {
        let resp = server.raw.get(server.url(path)).send().await.unwrap();
        assert!(resp.status().is_redirection(), "{path}");
        assert_eq!(resp.headers()["location"], "/shop/products");
    }
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_shows_first_page() {
    let server = TestServer::spawn().await;
    let page = server.page("/shop/products").await;
    assert!(page.contains("Showing 1-12 of 18 products"));
    assert!(page.contains("rel=\"next\""));
}

#[tokio::test]
async fn test_category_filter_counts() {
    let server = TestServer::spawn().await;
    let page = server.page("/shop/products?category=Electronics").await;
    assert!(page.contains("Showing 1-6 of 6 products"));
    assert!(page.contains("Active filters (1)"));
}

#[tokio::test]
async fn test_no_matches_shows_empty_state() {
    let server = TestServer::spawn().await;
    let page = server.page("/shop/products?search=nothing-matches-this").await;
    assert!(page.contains("No products found"));
}

#[tokio::test]
async fn test_api_pagination() {
    let server = TestServer::spawn().await;

    let first = server.json("/api/products").await;
    assert_eq!(first["totalCount"], 18);
    assert_eq!(first["totalPages"], 2);
    assert_eq!(first["products"].as_array().unwrap().len(), 12);

    let second = server.json("/api/products?page=2").await;
    assert_eq!(second["currentPage"], 2);
    assert_eq!(second["products"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_api_facets_are_conjunctive() {
    let server = TestServer::spawn().await;

    let page = server.json("/api/products?colors=pink").await;
    assert_eq!(ids(&page), vec!["20", "13"]);

    let page = server.json("/api/products?max_price=50&in_stock=true").await;
    assert_eq!(page["totalCount"], 6);

    let page = server.json("/api/products?rating=4.7&category=Electronics").await;
    assert_eq!(ids(&page), vec!["12", "3"]);

    let page = server.json("/api/products?search=KEYBOARD").await;
    assert_eq!(ids(&page), vec!["12"]);
}

#[tokio::test]
async fn test_api_sorting() {
    let server = TestServer::spawn().await;

    let page = server.json("/api/products?sort=price-asc").await;
    assert_eq!(ids(&page).first(), Some(&"2"));

    let page = server.json("/api/products?sort=price-desc").await;
    assert_eq!(ids(&page).first(), Some(&"1"));

    let page = server.json("/api/products?sort=bogus").await;
    assert_eq!(ids(&page).first(), Some(&"1"));
}

// =============================================================================
// Product Pages
// =============================================================================

#[tokio::test]
async fn test_product_detail() {
    let server = TestServer::spawn().await;
    let page = server.page("/shop/product-detail/1").await;
    assert!(page.contains("Premium Wireless Headphones"));
    assert!(page.contains("Customer Reviews"));
    assert!(page.contains("You may also like"));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .get(server.url("/shop/product-detail/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .get(server.url("/api/products/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let product = server.json("/api/products/6").await;
    assert_eq!(product["name"], "Leather Messenger Bag");
}

#[tokio::test]
async fn test_static_stylesheet_is_served() {
    let server = TestServer::spawn().await;
    let resp = server
        .client
        .get(server.url("/static/css/main.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
