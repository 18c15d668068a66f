//! Cart mutations, refetch and the navigation badge, end to end.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;
use shopfront_integration_tests::{TestApp, api_path, cart_json, fail, header, ok, product_json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_product(app: &TestApp, id: i64, stock: u32) {
    Mock::given(method("GET"))
        .and(path(api_path(&format!("/products/{id}"))))
        .respond_with(ok(product_json(id, "Desk Lamp", stock)))
        .mount(&app.api)
        .await;
}

#[tokio::test]
async fn test_add_to_cart_clamps_refetches_and_triggers_badge() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;
    mount_product(&app, 7, 2).await;

    Mock::given(method("POST"))
        .and(path(api_path("/cart")))
        .and(body_json(json!({ "productId": 7, "quantity": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(cart_json(&product_json(7, "Desk Lamp", 2), 2)))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app
        .htmx_post("/cart/add", "/products/7", &[("product_id", "7"), ("quantity", "5")])
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "hx-trigger"), "cart-updated");
    assert!(resp.text().await.unwrap().contains("Added to your cart (2 items)."));
}

#[tokio::test]
async fn test_add_out_of_stock_is_refused_locally() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;
    mount_product(&app, 7, 0).await;

    Mock::given(method("POST"))
        .and(path(api_path("/cart")))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&app.api)
        .await;

    let resp = app
        .htmx_post("/cart/add", "/products/7", &[("product_id", "7"), ("quantity", "1")])
        .await;

    assert_eq!(header(&resp, "hx-trigger"), "");
    assert!(resp.text().await.unwrap().contains("out of stock"));
}

#[tokio::test]
async fn test_plain_form_add_redirects_back_to_product() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;
    mount_product(&app, 7, 3).await;

    Mock::given(method("POST"))
        .and(path(api_path("/cart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(cart_json(&product_json(7, "Desk Lamp", 3), 1)))
        .mount(&app.api)
        .await;

    let resp = app
        .client
        .post(app.url("/cart/add"))
        .form(&[("product_id", "7"), ("quantity", "1")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&resp, "location"), "/products/7?added=1");
}

#[tokio::test]
async fn test_failed_update_still_refetches_cart() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;
    mount_product(&app, 7, 10).await;

    Mock::given(method("PUT"))
        .and(path(api_path("/cart/7")))
        .and(body_json(json!({ "quantity": 3 })))
        .respond_with(fail(400, "Insufficient stock"))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(cart_json(&product_json(7, "Desk Lamp", 10), 2)))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app
        .htmx_post("/cart/items/7", "/cart", &[("quantity", "3")])
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "hx-trigger"), "");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Insufficient stock"));
    // The refetched cart replaces the optimistic one
    assert!(body.contains(r#"value="2""#));
}

#[tokio::test]
async fn test_remove_item_returns_refetched_fragment() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("/cart/7")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(json!({ "items": [], "subtotal": "0", "itemCount": 0 })))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.htmx_post("/cart/items/7/remove", "/cart", &[]).await;

    assert_eq!(header(&resp, "hx-trigger"), "cart-updated");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Your cart is empty."));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn test_mutation_401_skips_refetch_and_expires_session() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("/cart")))
        .respond_with(fail(401, "Token expired"))
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&app.api)
        .await;

    let resp = app.htmx_post("/cart/clear", "/cart", &[]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header(&resp, "hx-redirect"),
        "/auth/login?error=session_expired&redirect=%2Fcart"
    );
}

#[tokio::test]
async fn test_badge_count() {
    let app = TestApp::spawn().await;

    // Anonymous visitors see zero without an API call
    let resp = app.htmx_get("/cart/count").await;
    assert_eq!(resp.text().await.unwrap().trim(), "0");

    app.login_as_ana().await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(cart_json(&product_json(7, "Desk Lamp", 9), 3)))
        .mount(&app.api)
        .await;

    let resp = app.htmx_get("/cart/count").await;
    assert_eq!(resp.text().await.unwrap().trim(), "3");
}

#[tokio::test]
async fn test_badge_shows_zero_when_api_fails() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(fail(500, "Database unavailable"))
        .mount(&app.api)
        .await;

    let resp = app.htmx_get("/cart/count").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap().trim(), "0");
}

#[tokio::test]
async fn test_cart_page_shows_inline_error_when_api_is_down() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(fail(503, "Upstream unavailable"))
        .mount(&app.api)
        .await;

    let resp = app.get("/cart").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Reload cart"));
    assert!(!body.contains("Upstream unavailable"));
}

#[tokio::test]
async fn test_clear_cart_refetches_and_triggers_badge() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("/cart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(json!({ "items": [], "subtotal": 0, "itemCount": 0 })))
        .expect(1)
        .mount(&app.api)
        .await;

    let resp = app.htmx_post("/cart/clear", "/cart", &[]).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "hx-trigger"), "cart-updated");
    assert!(resp.text().await.unwrap().contains("Your cart is empty."));
}

#[tokio::test]
async fn test_plain_form_clear_redirects_to_cart() {
    let app = TestApp::spawn().await;
    app.login_as_ana().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("/cart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/cart")))
        .respond_with(ok(json!({})))
        .mount(&app.api)
        .await;

    let resp = app.client.post(app.url("/cart/clear")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&resp, "location"), "/cart");
}
