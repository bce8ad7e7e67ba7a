//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart page keeps a mirror of the backend cart in the session; quantity
//! changes and removals edit the mirror first and undo the edit if the
//! backend refuses. A full page load always refetches.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use o2_shop_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, BackendCredentials};
use crate::error::{LOGIN_PATH, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Flash, session_keys};
use crate::routes::{Nav, is_htmx, load_mirror, navigate, redirect_with, save_mirror};
use crate::services::{CartError, CartState};
use crate::state::AppState;

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    /// Signed so that a decrement below one reaches the service and is
    /// rejected there.
    pub quantity: i64,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: Nav,
    pub cart: CartState,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartState,
    pub error: Option<String>,
}

/// Add-to-cart result fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_added.html")]
pub struct CartAddedTemplate {
    pub ok: bool,
    pub message: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// The cart mirror, fetching it if this session has none yet.
async fn current_cart(
    state: &AppState,
    session: &Session,
    credentials: &BackendCredentials,
) -> std::result::Result<CartState, ApiError> {
    if let Some(cart) = load_mirror::<CartState>(session, session_keys::CART).await {
        return Ok(cart);
    }
    CartState::load(state.client(), credentials).await
}

/// Answer a cart mutation: the items fragment for HTMX, a redirect back to
/// the cart page otherwise.
async fn respond(
    session: &Session,
    headers: &HeaderMap,
    cart: CartState,
    result: std::result::Result<(), CartError>,
) -> Result<Response> {
    save_mirror(session, session_keys::CART, &cart).await?;

    let error = match result {
        Ok(()) => None,
        Err(CartError::Api(e)) if e.needs_login() => {
            return Ok(navigate(headers, LOGIN_PATH));
        }
        Err(CartError::Api(e)) => Some(e.user_message("Failed to update your cart")),
        Err(other) => Some(other.to_string()),
    };

    if is_htmx(headers) {
        let changed = error.is_none();
        let fragment = CartItemsTemplate { cart, error };
        return Ok(if changed {
            (AppendHeaders([("HX-Trigger", "cart-updated")]), fragment).into_response()
        } else {
            fragment.into_response()
        });
    }

    Ok(match error {
        Some(message) => redirect_with(session, Flash::error(message), "/cart").await,
        None => Redirect::to("/cart").into_response(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<CartShowTemplate> {
    let (cart, error) = match CartState::load(state.client(), &auth.credentials).await {
        Ok(cart) => (cart, None),
        Err(e) if e.needs_login() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart");
            (
                CartState::default(),
                Some(e.user_message("Failed to fetch cart items")),
            )
        }
    };
    save_mirror(&session, session_keys::CART, &cart).await?;

    Ok(CartShowTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        cart,
        error,
    })
}

/// Add a product to the cart (pessimistic, from the product page).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip(state, session, auth, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let result = state.client().add_to_cart(&auth.credentials, id).await;

    if let Err(e) = &result
        && e.needs_login()
    {
        return Ok(navigate(&headers, LOGIN_PATH));
    }
    // The mirror no longer matches the backend
    session.remove::<CartState>(session_keys::CART).await?;

    let back = format!("/products/{id}");
    match result {
        Ok(()) => {
            let product_id = id.to_string();
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product_id)]));
            if is_htmx(&headers) {
                return Ok((
                    AppendHeaders([("HX-Trigger", "cart-updated")]),
                    CartAddedTemplate {
                        ok: true,
                        message: "Added to cart".to_string(),
                    },
                )
                    .into_response());
            }
            Ok(redirect_with(&session, Flash::success("Added to cart"), &back).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add to cart");
            let message = e.user_message("Failed to add to cart");
            if is_htmx(&headers) {
                return Ok(CartAddedTemplate { ok: false, message }.into_response());
            }
            Ok(redirect_with(&session, Flash::error(message), &back).await)
        }
    }
}

/// Change a line's quantity (HTMX).
///
/// The new quantity is written to the mirror before the backend call and
/// reverted if it fails. Quantities below one are refused without a call.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or the session cannot be
/// modified.
#[instrument(skip(state, session, auth, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = current_cart(&state, &session, &auth.credentials).await?;
    let result = cart
        .set_quantity(
            state.client(),
            &auth.credentials,
            form.product_id,
            form.quantity,
        )
        .await;
    respond(&session, &headers, cart, result).await
}

/// Remove a line (HTMX).
///
/// The line disappears from the mirror first; a failed call restores the
/// list exactly.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or the session cannot be
/// modified.
#[instrument(skip(state, session, auth, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = current_cart(&state, &session, &auth.credentials).await?;
    let result = cart
        .remove(state.client(), &auth.credentials, form.product_id)
        .await;
    respond(&session, &headers, cart, result).await
}
