//! Seller console route handlers.
//!
//! Listings, the add/edit product forms, photo uploads and the order
//! console. Every handler requires the seller role.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use o2_shop_core::{
    Category, DeliveryStatus, NewProduct, OrderId, Price, Product, ProductId, ProductStatus,
    ProductUpdate,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::BackendCredentials;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireSeller;
use crate::models::{Flash, session_keys};
use crate::routes::{Nav, UploadForm, is_htmx, load_mirror, redirect_with, save_mirror};
use crate::services::photos::{MAX_PHOTO_BYTES, upload_product_photos};
use crate::services::{PhotoError, SellerOrderError, SellerOrders};
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/seller/dashboard";
const ORDERS_PATH: &str = "/seller/orders";

// =============================================================================
// Forms
// =============================================================================

/// Add/edit product form data, as typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub stock: String,
    /// Ignored by the edit form; the backend keeps the original category.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: String,
}

/// A product form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub status: ProductStatus,
}

impl ProductForm {
    /// Pre-fill the edit form from a listing.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_plain_string(),
            stock: product.stock.to_string(),
            category: product.category.clone().unwrap_or_default(),
            status: i32::from(product.status).to_string(),
        }
    }

    /// Check the fields shared by the add and edit forms.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn validate(&self) -> std::result::Result<ValidProduct, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required.");
        }
        let price = Decimal::from_str(self.price.trim())
            .ok()
            .filter(|p| p.is_sign_positive() && !p.is_zero())
            .ok_or("Price must be a positive number.")?;
        let stock = self
            .stock
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|s| *s >= 0)
            .ok_or("Stock must be a whole number of zero or more.")?;
        let status = self
            .status
            .trim()
            .parse::<i32>()
            .map_or(ProductStatus::Active, ProductStatus::from);

        Ok(ValidProduct {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price: Price::new(price),
            stock,
            status,
        })
    }

    /// Validate as a new listing. New listings carry no image.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn to_new_product(&self) -> std::result::Result<NewProduct, &'static str> {
        let valid = self.validate()?;
        let category = Category::from_str(self.category.trim())
            .map_err(|_| "Please choose a category.")?;
        Ok(NewProduct {
            pid: 0,
            pname: valid.name,
            description: valid.description,
            price: valid.price,
            stock: valid.stock,
            category: category.as_str().to_string(),
            status: valid.status,
            img: None,
        })
    }

    /// Validate as an update to an existing listing.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn to_update(&self) -> std::result::Result<ProductUpdate, &'static str> {
        let valid = self.validate()?;
        Ok(ProductUpdate {
            pname: valid.name,
            description: valid.description,
            price: valid.price,
            stock: valid.stock,
            status: valid.status,
        })
    }
}

/// Status dropdown submission.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "seller/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub products: Vec<Product>,
    pub categories: [Category; 7],
    pub form: ProductForm,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/edit.html")]
pub struct EditProductTemplate {
    pub nav: Nav,
    pub product: Product,
    pub form: ProductForm,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/photos.html")]
pub struct PhotosTemplate {
    pub nav: Nav,
    pub product: Product,
    pub max_mb: usize,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/orders.html")]
pub struct SellerOrdersTemplate {
    pub nav: Nav,
    pub orders: SellerOrders,
    pub error: Option<String>,
}

/// The order table alone, swapped in by HTMX after a status change.
#[derive(Template, WebTemplate)]
#[template(path = "partials/seller_orders.html")]
pub struct SellerOrdersPartial {
    pub orders: SellerOrders,
    pub error: Option<String>,
}

// =============================================================================
// Listings
// =============================================================================

/// Load the seller's listings, or an empty list with an inline error.
async fn listings(
    state: &AppState,
    credentials: &BackendCredentials,
) -> Result<(Vec<Product>, Option<String>)> {
    match state.client().seller_products(credentials).await {
        Ok(products) => Ok((products, None)),
        Err(e) if e.needs_login() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load seller products");
            Ok((Vec::new(), Some(e.user_message("Failed to fetch your products"))))
        }
    }
}

/// Find one of the seller's own listings.
async fn own_product(
    state: &AppState,
    credentials: &BackendCredentials,
    id: ProductId,
) -> Result<Product> {
    state
        .client()
        .seller_products(credentials)
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
}

/// Display the seller dashboard.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
) -> Result<DashboardTemplate> {
    let (products, error) = listings(&state, &auth.credentials).await?;
    Ok(DashboardTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        products,
        categories: Category::ALL,
        form: ProductForm::default(),
        error,
    })
}

/// Add a listing.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth, form), fields(name = %form.name))]
pub async fn add_product(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let message = match form.to_new_product() {
        Ok(product) => match state.client().add_product(&auth.credentials, product).await {
            Ok(()) => {
                add_breadcrumb("seller", "Product added", None);
                return Ok(redirect_with(
                    &session,
                    Flash::success("Product added successfully!"),
                    DASHBOARD_PATH,
                )
                .await);
            }
            Err(e) if e.needs_login() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Add product refused");
                e.user_message("Failed to add product")
            }
        },
        Err(message) => message.to_string(),
    };

    let (products, _) = listings(&state, &auth.credentials).await?;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        DashboardTemplate {
            nav: Nav::new(&session, Some(auth.user)).await,
            products,
            categories: Category::ALL,
            form,
            error: Some(message),
        },
    )
        .into_response())
}

/// Display the edit form for one listing.
///
/// # Errors
///
/// Returns 404 if the product is not one of the seller's.
#[instrument(skip(state, session, auth))]
pub async fn edit_product(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<EditProductTemplate> {
    let product = own_product(&state, &auth.credentials, id).await?;
    Ok(EditProductTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        form: ProductForm::from_product(&product),
        product,
        error: None,
    })
}

/// Save a listing.
///
/// # Errors
///
/// Returns 404 if the product is not one of the seller's.
#[instrument(skip(state, session, auth, form), fields(product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let product = own_product(&state, &auth.credentials, id).await?;

    let message = match form.to_update() {
        Ok(update) => match state
            .client()
            .update_product(&auth.credentials, id, update)
            .await
        {
            Ok(()) => {
                return Ok(redirect_with(
                    &session,
                    Flash::success("Product updated successfully!"),
                    DASHBOARD_PATH,
                )
                .await);
            }
            Err(e) if e.needs_login() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Update product refused");
                e.user_message("Failed to update product")
            }
        },
        Err(message) => message.to_string(),
    };

    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        EditProductTemplate {
            nav: Nav::new(&session, Some(auth.user)).await,
            product,
            form,
            error: Some(message),
        },
    )
        .into_response())
}

// =============================================================================
// Photos
// =============================================================================

/// Display the photo upload form.
///
/// # Errors
///
/// Returns 404 if the product is not one of the seller's.
#[instrument(skip(state, session, auth))]
pub async fn photos_page(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<PhotosTemplate> {
    let product = own_product(&state, &auth.credentials, id).await?;
    Ok(PhotosTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        product,
        max_mb: MAX_PHOTO_BYTES / (1024 * 1024),
        error: None,
    })
}

/// Upload the selected photos one at a time.
///
/// # Errors
///
/// Returns an error for a malformed upload or a stale backend session.
#[instrument(skip(state, session, auth, multipart), fields(product_id = %id))]
pub async fn upload_photos(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let form = UploadForm::read(multipart).await?;
    let result =
        upload_product_photos(state.client(), &auth.credentials, id, &form.photos).await;

    let message = match result {
        Ok(count) => {
            let text = if count == 1 {
                "1 photo uploaded.".to_string()
            } else {
                format!("{count} photos uploaded.")
            };
            return Ok(redirect_with(&session, Flash::success(text), DASHBOARD_PATH).await);
        }
        Err(PhotoError::Api { source, .. }) if source.needs_login() => return Err(source.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Photo upload refused");
            e.to_string()
        }
    };

    let product = own_product(&state, &auth.credentials, id).await?;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        PhotosTemplate {
            nav: Nav::new(&session, Some(auth.user)).await,
            product,
            max_mb: MAX_PHOTO_BYTES / (1024 * 1024),
            error: Some(message),
        },
    )
        .into_response())
}

// =============================================================================
// Orders
// =============================================================================

/// Display the order console.
///
/// Always refetches; the session copy only backs status changes.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
) -> Result<SellerOrdersTemplate> {
    let (orders, error) = match SellerOrders::load(state.client(), &auth.credentials).await {
        Ok(orders) => {
            save_mirror(&session, session_keys::SELLER_ORDERS, &orders).await?;
            (orders, None)
        }
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load seller orders");
            (SellerOrders::default(), Some(e.user_message("Failed to fetch orders")))
        }
    };

    Ok(SellerOrdersTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        orders,
        error,
    })
}

/// The mirrored order list, fetched if this session has none.
async fn current_orders(
    state: &AppState,
    session: &Session,
    credentials: &BackendCredentials,
) -> Result<SellerOrders> {
    if let Some(orders) = load_mirror::<SellerOrders>(session, session_keys::SELLER_ORDERS).await {
        return Ok(orders);
    }
    Ok(SellerOrders::load(state.client(), credentials).await?)
}

/// Save the list and answer with the table fragment or a redirect.
async fn respond(
    session: &Session,
    headers: &HeaderMap,
    orders: SellerOrders,
    error: Option<String>,
) -> Result<Response> {
    save_mirror(session, session_keys::SELLER_ORDERS, &orders).await?;

    if is_htmx(headers) {
        return Ok(SellerOrdersPartial { orders, error }.into_response());
    }
    let flash = match error {
        Some(message) => Flash::error(message),
        None => Flash::success("Order updated."),
    };
    Ok(redirect_with(session, flash, ORDERS_PATH).await)
}

fn order_error_message(e: &SellerOrderError, fallback: &str) -> String {
    match e {
        SellerOrderError::UnknownOrder(_) => "That order is no longer listed.".to_string(),
        SellerOrderError::Api(e) => e.user_message(fallback),
    }
}

/// Change an order's delivery status.
///
/// The new status is shown immediately; on failure the list is refetched
/// and the fragment carries an alert.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth, headers, form), fields(order_id = %id, status = %form.status))]
pub async fn change_status(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let status = form.status.trim();
    if status.is_empty() {
        return Err(AppError::BadRequest("Missing status".to_string()));
    }
    let status = DeliveryStatus::from(status.to_string());

    let mut orders = current_orders(&state, &session, &auth.credentials).await?;
    let result = orders
        .change_status(state.client(), &auth.credentials, id, status)
        .await;

    let error = match result {
        Ok(()) => None,
        Err(SellerOrderError::Api(e)) if e.needs_login() => return Err(e.into()),
        Err(e) => Some(order_error_message(&e, "Failed to update status")),
    };
    respond(&session, &headers, orders, error).await
}

/// Delete an order. The row disappears only once the backend confirms.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth, headers), fields(order_id = %id))]
pub async fn delete_order(
    State(state): State<AppState>,
    session: Session,
    auth: RequireSeller,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let mut orders = current_orders(&state, &session, &auth.credentials).await?;
    let result = orders.delete(state.client(), &auth.credentials, id).await;

    let error = match result {
        Ok(()) => None,
        Err(SellerOrderError::Api(e)) if e.needs_login() => return Err(e.into()),
        Err(e) => Some(order_error_message(&e, "Failed to delete order")),
    };
    respond(&session, &headers, orders, error).await
}
