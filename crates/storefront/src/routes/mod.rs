//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Health check
//!
//! # Catalog
//! GET  /                               - Catalog with banners (?category=&sort=)
//! GET  /dashboard                      - Same, the shopper's landing page
//! GET  /products/{id}                  - Product detail (?image=n gallery index)
//! GET  /search                         - Navbar search form target (?q=)
//! GET  /products/search/{query}        - Search results
//!
//! # Cart (requires auth; HTMX fragments)
//! GET  /cart                           - Cart page
//! POST /cart/add/{id}                  - Add to cart (triggers cart-updated)
//! POST /cart/update                    - Change quantity (returns cart fragment)
//! POST /cart/remove                    - Remove line (returns cart fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout/{id}                  - Checkout form for one product
//! POST /checkout/{id}                  - Place order (COD -> /orders, ONLINE -> widget)
//! POST /checkout/verify                - Payment widget callback
//! GET  /orders                         - Order history
//!
//! # Auth
//! GET  /auth/login                     - Login page
//! POST /auth/login                     - Login action
//! GET  /auth/signup                    - Signup page
//! POST /auth/signup                    - Signup action
//! POST /auth/logout                    - Logout action
//! GET  /auth/google                    - Redirect to the backend's Google login
//! GET  /auth/google/complete           - Adopt the backend cookies after Google login
//!
//! # Profile (requires auth)
//! GET  /profile                        - Profile with role-specific actions
//! GET  /update                         - Edit profile form
//! POST /update                         - Save name and avatar (multipart)
//!
//! # Seller (requires seller role)
//! GET  /seller/dashboard               - Listings and add-product form
//! POST /seller/products                - Add product
//! GET  /seller/update/{id}             - Edit product form
//! POST /seller/update/{id}             - Save product
//! GET  /seller/products/{id}/photos    - Photo upload form
//! POST /seller/products/{id}/photos    - Upload photos (multipart, sequential)
//! GET  /seller/orders                  - Order console
//! POST /seller/orders/{id}/status      - Change status (optimistic)
//! POST /seller/orders/{id}/delete      - Delete order
//!
//! # Other
//! POST /newsletter                     - Footer signup (HTMX)
//! GET  /faq /returns /shipping /contact /terms - Info pages
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod newsletter;
pub mod orders;
pub mod pages;
pub mod products;
pub mod profile;
pub mod search;
pub mod seller;

use std::collections::HashMap;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Serialize, de::DeserializeOwned};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, form_rate_limiter};
use crate::models::{CurrentUser, Flash};
use crate::services::Photo;
use crate::services::photos::MAX_PHOTO_BYTES;
use crate::state::AppState;

/// Request body cap for upload forms: several photos at the per-file limit.
const MAX_UPLOAD_BODY: usize = 5 * MAX_PHOTO_BYTES;

// =============================================================================
// Shared view data
// =============================================================================

/// Navbar and flash data every full page renders.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    /// Current search text, echoed in the navbar field.
    pub search: String,
}

impl Nav {
    /// Build the navbar for `user`, taking any pending flash message.
    pub async fn new(session: &Session, user: Option<CurrentUser>) -> Self {
        Self {
            user,
            flash: Flash::take(session).await,
            search: String::new(),
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::is_seller)
    }

    /// Where the logo links to.
    #[must_use]
    pub fn home_path(&self) -> &'static str {
        self.user
            .as_ref()
            .map_or("/", |u| u.role.home_path())
    }
}

// =============================================================================
// HTMX helpers
// =============================================================================

/// Whether the request came from HTMX and expects a fragment.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some_and(|v| v == "true")
}

/// Navigate to `path`: `HX-Redirect` for HTMX, 303 otherwise.
#[must_use]
pub fn navigate(headers: &HeaderMap, path: &str) -> Response {
    if is_htmx(headers)
        && let Ok(value) = HeaderValue::from_str(path)
    {
        let mut response = StatusCode::OK.into_response();
        response.headers_mut().insert("HX-Redirect", value);
        return response;
    }
    Redirect::to(path).into_response()
}

/// Queue `flash` and redirect to `path`.
///
/// A session failure only loses the message; the redirect still happens.
pub async fn redirect_with(session: &Session, flash: Flash, path: &str) -> Response {
    if let Err(e) = flash.push(session).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
    Redirect::to(path).into_response()
}

// =============================================================================
// Session mirrors
// =============================================================================

/// Read a view mirror (cart, seller orders) from the session.
pub async fn load_mirror<T: DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    match session.get::<T>(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read session mirror");
            None
        }
    }
}

/// Write a view mirror back to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_mirror<T: Serialize + Send + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(key, value).await
}

// =============================================================================
// Uploads
// =============================================================================

/// A multipart form split into text fields and files.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub photos: Vec<Photo>,
}

impl UploadForm {
    /// Read every part. File inputs left empty are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] for a malformed body.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    if !bytes.is_empty() {
                        form.photos.push(Photo {
                            name: file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed text field, `None` when blank or missing.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/signup", get(auth::signup_page))
        .route("/logout", post(auth::logout))
        .route("/google", get(auth::google))
        .route("/google/complete", get(auth::google_complete))
        .merge(limited)
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/verify", post(checkout::verify))
        .route("/{id}", get(checkout::show).post(checkout::place))
}

/// Create the seller routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(seller::dashboard))
        .route("/products", post(seller::add_product))
        .route(
            "/update/{id}",
            get(seller::edit_product).post(seller::update_product),
        )
        .route(
            "/products/{id}/photos",
            get(seller::photos_page)
                .post(seller::upload_photos)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/orders", get(seller::orders))
        .route("/orders/{id}/status", post(seller::change_status))
        .route("/orders/{id}/delete", post(seller::delete_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Catalog
        .route("/", get(home::home))
        .route("/dashboard", get(home::home))
        .route("/products/{id}", get(products::show))
        .route("/search", get(search::submit))
        .route("/products/search/{query}", get(search::results))
        // Shopper
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders", get(orders::index))
        .route("/profile", get(profile::show))
        .route(
            "/update",
            get(profile::edit)
                .post(profile::update)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        // Seller
        .nest("/seller", seller_routes())
        // Auth
        .nest("/auth", auth_routes())
        // Footer
        .route(
            "/newsletter",
            post(newsletter::subscribe).layer(form_rate_limiter()),
        )
        .merge(pages::router())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}
