//! Integration tests for the wishlist and its bulk selection.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use reqwest::StatusCode;
use zard_shop_integration_tests::{TestServer, amount};

async fn save(server: &TestServer, ids: &[&str]) {
    for id in ids {
        server
            .submit("/shop/wishlist/toggle", &[("product_id", id)])
            .await;
    }
}

#[tokio::test]
async fn test_toggle_adds_then_removes() {
    let server = TestServer::spawn().await;

    let page = server
        .submit("/shop/wishlist/toggle", &[("product_id", "1")])
        .await;
    assert!(page.contains("added to wishlist"));
    assert!(server.page("/shop/wishlist/count").await.contains(">1<"));

    let page = server
        .submit("/shop/wishlist/toggle", &[("product_id", "1")])
        .await;
    assert!(page.contains("removed from wishlist"));
    assert!(page.contains("Your wishlist is empty"));
}

#[tokio::test]
async fn test_toggle_unknown_product_is_not_found() {
    let server = TestServer::spawn().await;
    let resp = server
        .raw
        .post(server.url("/shop/wishlist/toggle"))
        .form(&[("product_id", "999")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_summary_figures() {
    let server = TestServer::spawn().await;
    save(&server, &["1", "6", "3"]).await;

    let wishlist = server.json("/api/wishlist").await;
    let summary = &wishlist["summary"];
    assert_eq!(summary["totalItems"], 3);
    assert_eq!(amount(&summary["totalValue"]), 687.0);
    assert_eq!(summary["inStockItems"], 2);
    assert_eq!(summary["onSaleItems"], 2);
}

#[tokio::test]
async fn test_wishlist_add_to_cart_keeps_entry() {
    let server = TestServer::spawn().await;
    save(&server, &["7"]).await;

    server
        .submit("/shop/wishlist/add-to-cart", &[("product_id", "7")])
        .await;

    assert_eq!(server.json("/api/cart").await["totalItems"], 1);
    assert_eq!(
        server.json("/api/wishlist").await["items"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_bulk_add_selected_to_cart() {
    let server = TestServer::spawn().await;
    save(&server, &["1", "2", "7"]).await;

    server.submit("/shop/wishlist/select-all", &[]).await;
    let wishlist = server.json("/api/wishlist").await;
    assert_eq!(wishlist["selection"].as_array().unwrap().len(), 3);

    let page = server
        .submit("/shop/wishlist/selection/add-to-cart", &[])
        .await;
    assert!(page.contains("3 items added to cart!"));

    assert_eq!(server.json("/api/cart").await["totalItems"], 3);
    let wishlist = server.json("/api/wishlist").await;
    assert!(wishlist["selection"].as_array().unwrap().is_empty());
    assert_eq!(wishlist["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_select_all_toggles_off_when_everything_selected() {
    let server = TestServer::spawn().await;
    save(&server, &["1", "2"]).await;

    server.submit("/shop/wishlist/select-all", &[]).await;
    server.submit("/shop/wishlist/select-all", &[]).await;

    let wishlist = server.json("/api/wishlist").await;
    assert!(wishlist["selection"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_selected() {
    let server = TestServer::spawn().await;
    save(&server, &["1", "2", "7"]).await;

    server
        .submit("/shop/wishlist/select", &[("product_id", "2")])
        .await;
    let page = server.submit("/shop/wishlist/selection/remove", &[]).await;
    assert!(page.contains("1 items removed from wishlist"));

    let wishlist = server.json("/api/wishlist").await;
    let ids: Vec<&str> = wishlist["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["product"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "7"]);
}

#[tokio::test]
async fn test_removing_entry_deselects_it() {
    let server = TestServer::spawn().await;
    save(&server, &["1", "2"]).await;
    server
        .submit("/shop/wishlist/select", &[("product_id", "1")])
        .await;

    server
        .submit("/shop/wishlist/remove", &[("product_id", "1")])
        .await;

    let wishlist = server.json("/api/wishlist").await;
    assert!(wishlist["selection"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_marks_saved_products() {
    let server = TestServer::spawn().await;
    save(&server, &["1"]).await;

    let page = server.page("/shop/products").await;
    assert!(page.contains("Remove from wishlist"));
}
