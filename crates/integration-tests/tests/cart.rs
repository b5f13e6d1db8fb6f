//! Integration tests for the cart, promo codes and shipping.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use reqwest::StatusCode;
use zard_shop_integration_tests::{TestServer, amount};

// =============================================================================
// Cart Lines
// =============================================================================

#[tokio::test]
async fn test_cart_count_badge_tracks_quantity() {
    let server = TestServer::spawn().await;

    let fragment = server.page("/shop/cart/count").await;
    assert!(fragment.contains(">0<"), "empty cart badge: {fragment}");

    server.add_to_cart("2", 2).await;
    server.add_to_cart("7", 1).await;

    let fragment = server.page("/shop/cart/count").await;
    assert!(fragment.contains(">3<"), "badge after adds: {fragment}");
}

#[tokio::test]
async fn test_same_variant_merges_and_other_variants_split() {
    let server = TestServer::spawn().await;

    for color in ["black", "black", "white"] {
        server
            .submit(
                "/shop/cart/add",
                &[("product_id", "2"), ("color", color), ("size", "M")],
            )
            .await;
    }

    let cart = server.json("/api/cart").await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["color"], "black");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[1]["color"], "white");
    assert_eq!(cart["totalItems"], 3);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let server = TestServer::spawn().await;
    server.add_to_cart("4", 2).await;

    let cart = server.json("/api/cart").await;
    let item_id = cart["items"][0]["id"].as_str().unwrap().to_string();

    server
        .submit("/shop/cart/increase", &[("item_id", item_id.as_str())])
        .await;
    assert_eq!(server.json("/api/cart").await["items"][0]["quantity"], 3);

    let page = server
        .submit(
            "/shop/cart/update",
            &[("item_id", item_id.as_str()), ("quantity", "0")],
        )
        .await;
    assert!(page.contains("Your cart is empty"));
    assert_eq!(server.json("/api/cart").await["totalItems"], 0);
}

#[tokio::test]
async fn test_decrease_never_goes_below_one() {
    let server = TestServer::spawn().await;
    server.add_to_cart("7", 1).await;
    let cart = server.json("/api/cart").await;
    let item_id = cart["items"][0]["id"].as_str().unwrap().to_string();

    server
        .submit("/shop/cart/decrease", &[("item_id", item_id.as_str())])
        .await;

    assert_eq!(server.json("/api/cart").await["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let server = TestServer::spawn().await;
    let resp = server
        .raw
        .post(server.url("/shop/cart/add"))
        .form(&[("product_id", "999")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_survives_navigation() {
    let server = TestServer::spawn().await;
    server.add_to_cart("10", 1).await;

    server.page("/shop/products").await;
    server.page("/shop/product-detail/1").await;
    server.page("/shop/wishlist").await;

    let page = server.page("/shop/cart").await;
    assert!(page.contains("Bluetooth Speaker"));
    assert_eq!(server.json("/api/cart").await["totalItems"], 1);
}

#[tokio::test]
async fn test_add_redirects_back_to_local_page_only() {
    let server = TestServer::spawn().await;

    let resp = server
        .raw
        .post(server.url("/shop/cart/add"))
        .form(&[("product_id", "1"), ("redirect_to", "/shop/products?page=2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/shop/products?page=2");

    let resp = server
        .raw
        .post(server.url("/shop/cart/add"))
        .form(&[("product_id", "1"), ("redirect_to", "https://example.com/")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["location"], "/shop/cart");
}

// =============================================================================
// Promo Codes and Shipping
// =============================================================================

#[tokio::test]
async fn test_promo_code_discounts_totals() {
    let server = TestServer::spawn().await;
    server.add_to_cart("1", 1).await;

    let page = server
        .submit("/shop/cart/promo", &[("code", " save10 ")])
        .await;
    assert!(page.contains("SAVE10"));

    let cart = server.json("/api/cart").await;
    let summary = &cart["summary"];
    assert_eq!(cart["promo"], "SAVE10");
    assert_eq!(amount(&summary["subtotal"]), 299.0);
    assert_eq!(amount(&summary["discount"]), 29.9);
    assert_eq!(amount(&summary["shipping"]), 0.0);
    assert_eq!(amount(&summary["tax"]), 21.53);
    assert_eq!(amount(&summary["total"]), 290.63);
}

#[tokio::test]
async fn test_invalid_promo_code_keeps_previous_code() {
    let server = TestServer::spawn().await;
    server.add_to_cart("1", 1).await;
    server.submit("/shop/cart/promo", &[("code", "SAVE20")]).await;

    let page = server.submit("/shop/cart/promo", &[("code", "FREESTUFF")]).await;
    assert!(page.contains("Invalid promo code"));
    assert_eq!(server.json("/api/cart").await["promo"], "SAVE20");

    server.submit("/shop/cart/promo/remove", &[]).await;
    assert!(server.json("/api/cart").await.get("promo").is_none());
}

#[tokio::test]
async fn test_shipping_method_changes_totals() {
    let server = TestServer::spawn().await;
    server.add_to_cart("2", 1).await;

    let cart = server.json("/api/cart").await;
    assert_eq!(cart["shipping"], "standard");
    assert_eq!(amount(&cart["summary"]["shipping"]), 0.0);

    server
        .submit("/shop/cart/shipping", &[("method", "overnight")])
        .await;
    let cart = server.json("/api/cart").await;
    assert_eq!(cart["shipping"], "overnight");
    assert_eq!(amount(&cart["summary"]["shipping"]), 24.99);
    // 29 + 24.99 + 8% of 29
    assert_eq!(amount(&cart["summary"]["total"]), 56.31);
}

#[tokio::test]
async fn test_unknown_shipping_method_is_bad_request() {
    let server = TestServer::spawn().await;
    let resp = server
        .raw
        .post(server.url("/shop/cart/shipping"))
        .form(&[("method", "drone")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Proceeding to Checkout
// =============================================================================

#[tokio::test]
async fn test_proceed_purges_out_of_stock_lines() {
    let server = TestServer::spawn().await;
    server.add_to_cart("3", 1).await;
    server.add_to_cart("4", 1).await;

    let cart_page = server.page("/shop/cart").await;
    assert!(cart_page.contains("Remove out of stock items"));

    let page = server.submit("/shop/cart/proceed", &[]).await;
    assert!(page.contains("Removed 1 out of stock item(s)"));
    let cart = server.json("/api/cart").await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["productId"], "4");

    let resp = server
        .raw
        .post(server.url("/shop/cart/proceed"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["location"], "/shop/checkout");
}
