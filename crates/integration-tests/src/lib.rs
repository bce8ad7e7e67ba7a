//! Integration tests for the O2 Shop storefront.
//!
//! Each test builds the full router (sessions, security headers, rate
//! limits) over [`FakeShopApi`] and drives it with `tower::ServiceExt`.
//! The session cookie is carried between requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p o2-shop-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use o2_shop_storefront::app;
use o2_shop_storefront::testing::{FakePaymentWidget, FakeShopApi, test_state};
use tower::ServiceExt;

/// Backend cookie handed out by the fake login.
pub const BACKEND_COOKIE: &str = "JSESSIONID=backend-1; Path=/; HttpOnly";

pub const SHOPPER_PROFILE: &str =
    r#"{"id":1,"name":"Asha Rao","email":"asha@example.in","role":"USER"}"#;
pub const SELLER_PROFILE: &str =
    r#"{"id":2,"name":"Ravi Traders","email":"ravi@example.in","role":"SELLER"}"#;

pub const PRODUCTS: &str = r#"[
    {"pid":1,"pname":"Desk Lamp","price":999,"stock":5,"status":1,"img":"","category":"Home Appliances"},
    {"pid":2,"pname":"Notebook","price":49.5,"stock":0,"status":0,"img":"","category":"Books"}
]"#;

pub const PRODUCT: &str =
    r#"{"pid":1,"pname":"Desk Lamp","description":"Warm light","price":999,"stock":5,"status":1,"img":[]}"#;

pub const CART: &str = r#"[
    {"id":10,"quantity":2,"product":{"pid":1,"pname":"Desk Lamp","price":999,"stock":5,"status":1}},
    {"id":11,"quantity":1,"product":{"pid":3,"pname":"Mug","price":250,"stock":9,"status":1}}
]"#;

pub const SELLER_ORDERS: &str = r#"[
    {"id":42,"pid":1,"pname":"Desk Lamp","quantity":1,"price":999,"mode":"COD","status":"Pending","address":"12 MG Road, Pune, MH - 411001"},
    {"id":43,"pid":1,"pname":"Desk Lamp","quantity":2,"price":1998,"mode":"ONLINE","status":"Paid","address":"4 Park St, Kolkata, WB - 700016"}
]"#;

/// A response with its body read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The storefront over fakes, plus a one-session cookie jar.
pub struct TestApp {
    router: Router,
    pub api: Arc<FakeShopApi>,
    pub widget: Arc<FakePaymentWidget>,
    session_cookie: Mutex<Option<String>>,
}

impl TestApp {
    /// Storefront whose payment script loads.
    #[must_use]
    pub fn new() -> Self {
        Self::with_widget(FakePaymentWidget::available())
    }

    #[must_use]
    pub fn with_widget(widget: FakePaymentWidget) -> Self {
        let api = Arc::new(FakeShopApi::new());
        let widget = Arc::new(widget);
        let router = app(test_state(Arc::clone(&api), Arc::clone(&widget))).unwrap();
        Self {
            router,
            api,
            widget,
            session_cookie: Mutex::new(None),
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().trim();
            if pair.starts_with("o2_session=") {
                *self.session_cookie.lock().unwrap() = Some(pair.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn request(&self, method: Method, uri: &str, htmx: bool) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = self.session_cookie.lock().unwrap().as_deref() {
            builder = builder.header(header::COOKIE, cookie);
        }
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        builder
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(self.request(Method::GET, uri, false).body(Body::empty()).unwrap())
            .await
    }

    /// POST a url-encoded form.
    pub async fn post(&self, uri: &str, form: &str) -> TestResponse {
        self.post_form(uri, form, false).await
    }

    /// POST a url-encoded form as HTMX does.
    pub async fn htmx_post(&self, uri: &str, form: &str) -> TestResponse {
        self.post_form(uri, form, true).await
    }

    async fn post_form(&self, uri: &str, form: &str, htmx: bool) -> TestResponse {
        let request = self
            .request(Method::POST, uri, htmx)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart body built with [`multipart_body`].
    pub async fn post_multipart(&self, uri: &str, body: Vec<u8>) -> TestResponse {
        let request = self
            .request(Method::POST, uri, false)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Log in through the storefront with `profile` as the backend account.
    pub async fn login_as(&self, profile: &str) -> TestResponse {
        self.api
            .respond_with_cookies("POST /auth/login", "{}", &[BACKEND_COOKIE]);
        self.api.respond("GET /profile", profile);
        let response = self
            .post("/auth/login", "email=someone%40example.in&password=secret-pass")
            .await;
        self.api.clear_calls();
        response
    }

    pub async fn login_shopper(&self) -> TestResponse {
        self.login_as(SHOPPER_PROFILE).await
    }

    pub async fn login_seller(&self) -> TestResponse {
        self.login_as(SELLER_PROFILE).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub const MULTIPART_BOUNDARY: &str = "o2-test-boundary";

/// A multipart body with text `fields` and image `files` (name, bytes).
#[must_use]
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (field, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}
