//! Seller console flows: listings, photos and the order console.

use axum::http::StatusCode;
use o2_shop_core::DeliveryStatus;
use o2_shop_integration_tests::{PRODUCTS, SELLER_ORDERS, TestApp, multipart_body};
use o2_shop_storefront::api::Endpoint;

#[tokio::test]
async fn test_seller_login_lands_on_console() {
    let app = TestApp::new();
    let response = app.login_seller().await;
    assert_eq!(response.location(), Some("/seller/dashboard"));
}

#[tokio::test]
async fn test_shopper_cannot_open_seller_pages() {
    let app = TestApp::new();
    app.login_shopper().await;

    let response = app.get("/seller/orders").await;

    assert_eq!(response.location(), Some("/dashboard"));
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_dashboard_lists_own_products() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("GET /seller/products", PRODUCTS);

    let response = app.get("/seller/dashboard").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Notebook"));
    assert!(response.body.contains("/seller/update/1"));
    assert!(response.body.contains("Home Appliances"));
}

#[tokio::test]
async fn test_add_product_sends_new_listing() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("POST /seller/addProducts", "");

    let response = app
        .post(
            "/seller/products",
            "name=Kettle&description=1.5L&price=1299&stock=4&category=Home+Appliances&status=1",
        )
        .await;

    assert_eq!(response.location(), Some("/seller/dashboard"));
    let calls = app.api.calls_to("POST /seller/addProducts");
    let [Endpoint::AddProduct(product)] = calls.as_slice() else {
        panic!("expected one new product, got {calls:?}");
    };
    assert_eq!(product.pid, 0);
    assert_eq!(product.pname, "Kettle");
    assert_eq!(product.img, None);
}

#[tokio::test]
async fn test_editing_someone_elses_product_is_not_found() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("GET /seller/products", PRODUCTS);

    let response = app.get("/seller/update/99").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_photos_upload_one_request_each() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("POST /seller/products/1/addPhoto", "");

    let body = multipart_body(
        &[],
        &[("photos", "a.png", b"first"), ("photos", "b.png", b"second")],
    );
    let response = app.post_multipart("/seller/products/1/photos", body).await;

    assert_eq!(response.location(), Some("/seller/dashboard"));
    let calls = app.api.calls_to("POST /seller/products/1/addPhoto");
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        calls.first(),
        Some(Endpoint::AddProductPhoto { photo, .. }) if photo == "Zmlyc3Q="
    ));
}

#[tokio::test]
async fn test_status_change_shows_new_status() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("GET /seller/myOrders", SELLER_ORDERS);
    app.api.respond("PUT /seller/orders/42/status", "");
    app.get("/seller/orders").await;

    let response = app
        .htmx_post("/seller/orders/42/status", "status=Shipped")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("value=\"Shipped\" selected"));
    assert!(!response.body.contains("alert-error"));
    let calls = app.api.calls_to("PUT /seller/orders/42/status");
    assert!(matches!(
        calls.as_slice(),
        [Endpoint::UpdateOrderStatus { status: DeliveryStatus::Shipped, .. }]
    ));
}

#[tokio::test]
async fn test_failed_status_change_resyncs_from_backend() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("GET /seller/myOrders", SELLER_ORDERS);
    app.api.fail("PUT /seller/orders/42/status", 500, "Update failed");
    app.get("/seller/orders").await;
    app.api.clear_calls();

    let response = app
        .htmx_post("/seller/orders/42/status", "status=Delivered")
        .await;

    assert!(response.body.contains("Update failed"));
    assert!(!response.body.contains("value=\"Delivered\" selected"));
    assert_eq!(app.api.calls_to("GET /seller/myOrders").len(), 1);
}

#[tokio::test]
async fn test_failed_delete_keeps_order() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("GET /seller/myOrders", SELLER_ORDERS);
    app.api.fail("DELETE /seller/orders/43", 500, "");
    app.get("/seller/orders").await;

    let response = app.htmx_post("/seller/orders/43/delete", "").await;

    assert!(response.body.contains("#43"));
    assert!(response.body.contains("alert-error"));
}

#[tokio::test]
async fn test_delete_removes_order() {
    let app = TestApp::new();
    app.login_seller().await;
    app.api.respond("GET /seller/myOrders", SELLER_ORDERS);
    app.api.respond("DELETE /seller/orders/43", "");
    app.get("/seller/orders").await;

    let response = app.htmx_post("/seller/orders/43/delete", "").await;

    assert!(!response.body.contains("#43"));
    assert!(response.body.contains("#42"));
}
