//! Signed-in shopper flows: login, cart, checkout, orders, profile.

use axum::http::StatusCode;
use o2_shop_integration_tests::{CART, PRODUCT, TestApp, multipart_body};
use o2_shop_storefront::api::Endpoint;
use o2_shop_storefront::testing::FakePaymentWidget;

const CHECKOUT_COD: &str = "quantity=2&house=12+MG+Road&city=Pune&state=MH&pin=411001&mode=COD";
const CHECKOUT_ONLINE: &str =
    "quantity=1&house=12+MG+Road&city=Pune&state=MH&pin=411001&mode=ONLINE";
const SESSION: &str = r#"{"id":"order_9","key":"rzp_test","amount":99900,"currency":"INR","buyId":77}"#;

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_lands_on_role_home() {
    let app = TestApp::new();

    let response = app.login_shopper().await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/dashboard"));
    // Backend cookies stay server-side
    let cookies: Vec<_> = response.headers.get_all("set-cookie").iter().collect();
    assert!(cookies.iter().all(|c| !c.to_str().unwrap().contains("JSESSIONID")));
}

#[tokio::test]
async fn test_failed_login_shows_backend_reason() {
    let app = TestApp::new();
    app.api.fail("POST /auth/login", 400, "Invalid email or password");

    let response = app
        .post("/auth/login", "email=asha%40example.in&password=wrong-pass")
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_guest_is_sent_to_login() {
    let app = TestApp::new();

    for path in ["/cart", "/orders", "/profile", "/checkout/1"] {
        let response = app.get(path).await;
        assert_eq!(response.location(), Some("/auth/login"), "{path}");
    }
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_backend_session_redirects_to_login() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.fail("GET /user/orders", 401, "");

    let response = app.get("/orders").await;

    assert_eq!(response.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("POST /auth/logout", "");

    let response = app.post("/auth/logout", "").await;
    assert_eq!(response.location(), Some("/"));
    assert_eq!(app.api.calls_to("POST /auth/logout").len(), 1);

    let response = app.get("/cart").await;
    assert_eq!(response.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_signup_validates_before_calling_backend() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/signup",
            "name=Asha&email=asha%40example.in&password=short&role=SELLER",
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("at least 8 characters"));
    assert!(app.api.calls().is_empty());
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_page_shows_lines_and_total() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/cart", CART);

    let response = app.get("/cart").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Desk Lamp"));
    assert!(response.body.contains("₹2248.00"));
}

#[tokio::test]
async fn test_failed_removal_restores_cart() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/cart", CART);
    app.api.fail("DELETE /user/cart/remove/1", 500, "Server busy");

    let response = app.htmx_post("/cart/remove", "product_id=1").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Server busy"));
    assert!(response.body.contains("Desk Lamp"));
    assert!(response.body.contains("Mug"));
    assert!(response.header("hx-trigger").is_none());
    assert_eq!(app.api.calls_to("DELETE /user/cart/remove/1").len(), 1);
}

#[tokio::test]
async fn test_successful_removal_drops_line() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/cart", CART);
    app.api.respond("DELETE /user/cart/remove/1", "");

    let response = app.htmx_post("/cart/remove", "product_id=1").await;

    assert!(!response.body.contains("Desk Lamp"));
    assert!(response.body.contains("Mug"));
    assert_eq!(response.header("hx-trigger"), Some("cart-updated"));
}

#[tokio::test]
async fn test_quantity_below_one_sends_nothing() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/cart", CART);

    let response = app.htmx_post("/cart/update", "product_id=3&quantity=0").await;

    assert!(response.body.contains("Quantity must be at least 1"));
    assert!(app.api.calls_to("PUT /user/cart/update/3").is_empty());
}

#[tokio::test]
async fn test_failed_quantity_change_reverts() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/cart", CART);
    app.api.fail("PUT /user/cart/update/1", 500, "");

    let response = app.htmx_post("/cart/update", "product_id=1&quantity=3").await;

    // Still two lamps: 2 x 999 + 250
    assert!(response.body.contains("₹2248.00"));
    let calls = app.api.calls_to("PUT /user/cart/update/1");
    assert!(matches!(
        calls.as_slice(),
        [Endpoint::UpdateCartQuantity { quantity: 3, .. }]
    ));
}

#[tokio::test]
async fn test_add_to_cart_triggers_refresh() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("POST /user/Addtocart/1", "");

    let response = app.htmx_post("/cart/add/1", "").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("hx-trigger"), Some("cart-updated"));
    assert!(response.body.contains("Added to cart"));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_cash_on_delivery_goes_to_orders_without_widget() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/products/1", PRODUCT);
    app.api.respond("POST /auth/checkout/session", SESSION);

    let response = app.post("/checkout/1", CHECKOUT_COD).await;

    assert_eq!(response.location(), Some("/orders"));
    assert_eq!(app.widget.loads(), 0);
    let calls = app.api.calls_to("POST /auth/checkout/session");
    let [Endpoint::CheckoutSession(request)] = calls.as_slice() else {
        panic!("expected one checkout session, got {calls:?}");
    };
    assert_eq!(request.quantity, 2);
    assert_eq!(request.address, "12 MG Road, Pune, MH - 411001");
}

#[tokio::test]
async fn test_cash_on_delivery_over_htmx_uses_hx_redirect() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/products/1", PRODUCT);
    app.api.respond("POST /auth/checkout/session", SESSION);

    let response = app.htmx_post("/checkout/1", CHECKOUT_COD).await;

    assert_eq!(response.header("hx-redirect"), Some("/orders"));
}

#[tokio::test]
async fn test_online_payment_hands_off_to_widget() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/products/1", PRODUCT);
    app.api.respond("POST /auth/checkout/session", SESSION);

    let response = app.post("/checkout/1", CHECKOUT_ONLINE).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.widget.loads(), 1);
    assert!(response.body.contains("data-order=\"order_9\""));
    assert!(response.body.contains("name=\"buyId\" value=\"77\""));
    let csp = response.header("content-security-policy").unwrap();
    let nonce = csp
        .split("'nonce-")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .unwrap();
    assert!(response.body.contains(&format!("nonce=\"{nonce}\"")));
}

#[tokio::test]
async fn test_unreachable_payment_script_stays_on_form() {
    let app = TestApp::with_widget(FakePaymentWidget::unavailable());
    app.login_shopper().await;
    app.api.respond("GET /user/products/1", PRODUCT);
    app.api.respond("POST /auth/checkout/session", SESSION);

    let response = app.htmx_post("/checkout/1", CHECKOUT_ONLINE).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.header("hx-redirect").is_none());
    assert!(response.location().is_none());
    assert!(response.body.contains("Failed to load the payment gateway"));
    assert_eq!(app.widget.loads(), 1);
}

#[tokio::test]
async fn test_checkout_validation_sends_nothing() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/products/1", PRODUCT);

    let response = app
        .post("/checkout/1", "quantity=9&house=x&city=y&state=z&pin=1&mode=COD")
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("exceeds available stock"));
    assert!(app.api.calls_to("POST /auth/checkout/session").is_empty());
}

#[tokio::test]
async fn test_blank_quantity_shows_inline_alert() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("GET /user/products/1", PRODUCT);

    let response = app
        .post("/checkout/1", "quantity=&house=x&city=y&state=z&pin=1&mode=COD")
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Quantity must be at least 1"));
    assert!(response.body.contains("<h1>Checkout</h1>"));
    assert!(app.api.calls_to("POST /auth/checkout/session").is_empty());
}

#[tokio::test]
async fn test_payment_verification_relays_widget_fields() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("POST /auth/payment/verify", "");

    let response = app
        .post(
            "/checkout/verify",
            "buyId=77&razorpay_payment_id=pay_1&razorpay_order_id=order_9&razorpay_signature=sig",
        )
        .await;

    assert_eq!(response.location(), Some("/orders"));
    let calls = app.api.calls_to("POST /auth/payment/verify");
    let [Endpoint::VerifyPayment(verification)] = calls.as_slice() else {
        panic!("expected one verification, got {calls:?}");
    };
    assert_eq!(verification.buy_id, "77");
    assert_eq!(verification.razorpay_signature, "sig");
    let body = calls.first().unwrap().body().unwrap().unwrap();
    assert_eq!(body["buyId"], 77);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_update_sends_avatar_as_data_uri() {
    let app = TestApp::new();
    app.login_shopper().await;
    app.api.respond("PUT /update", "");

    let body = multipart_body(&[("name", "Asha R")], &[("photo", "me.png", b"\x89PNG")]);
    let response = app.post_multipart("/update", body).await;

    assert_eq!(response.location(), Some("/profile"));
    let calls = app.api.calls_to("PUT /update");
    let [Endpoint::UpdateProfile(update)] = calls.as_slice() else {
        panic!("expected one profile update, got {calls:?}");
    };
    assert_eq!(update.name.as_deref(), Some("Asha R"));
    assert!(
        update
            .photo
            .as_deref()
            .is_some_and(|p| p.starts_with("data:image/png;base64,"))
    );
}
