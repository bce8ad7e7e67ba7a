//! Checkout route handlers.
//!
//! One product per order. Cash-on-delivery orders finish on submit; online
//! orders render a hand-off page that opens the gateway's hosted widget,
//! whose callback posts back to `/checkout/verify`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use o2_shop_core::{PaymentMode, Product, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::wire::PaymentVerification;
use crate::error::{LOGIN_PATH, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::Flash;
use crate::routes::{Nav, navigate, redirect_with};
use crate::services::checkout::{self, ORDERS_PATH, PaymentHandoff};
use crate::services::{Checkout, CheckoutError, CheckoutForm, CheckoutOutcome};
use crate::state::AppState;

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub nav: Nav,
    pub product: Product,
    pub form: CheckoutForm,
    pub modes: [PaymentMode; 2],
    pub error: Option<String>,
}

/// Hosted widget hand-off page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub nav: Nav,
    pub nonce: String,
    pub handoff: PaymentHandoff,
    pub buy_id: String,
    pub prefill_email: String,
    pub prefill_name: String,
}

/// Shown when the backend refuses a payment confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/verify_failed.html")]
pub struct VerifyFailedTemplate {
    pub nav: Nav,
    pub message: String,
}

fn blank_form() -> CheckoutForm {
    CheckoutForm {
        quantity: 1,
        state: String::new(),
        city: String::new(),
        pin: String::new(),
        house: String::new(),
        mode: PaymentMode::Cod,
    }
}

/// Display the checkout form for one product.
///
/// # Errors
///
/// Redirects to login without a backend session; 404 for unknown products.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<CheckoutTemplate> {
    let product = state
        .client()
        .checkout_product(&auth.credentials, id)
        .await?;

    Ok(CheckoutTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        product,
        form: blank_form(),
        modes: [PaymentMode::Cod, PaymentMode::Online],
        error: None,
    })
}

/// Place the order.
///
/// Validation failures, backend rejections and an unreachable payment
/// script re-render the form with an alert; nothing navigates.
///
/// # Errors
///
/// Returns an error if the product cannot be loaded.
#[instrument(skip(state, session, auth, nonce, headers, form), fields(product_id = %id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    CspNonce(nonce): CspNonce,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let product = state
        .client()
        .checkout_product(&auth.credentials, id)
        .await?;

    let checkout = Checkout::new(
        state.client(),
        state.widget(),
        &state.config().payment.merchant_name,
    );

    let result = checkout
        .place_order(&auth.credentials, &product, &form)
        .await;

    match result {
        Ok(CheckoutOutcome::AwaitingPayment(handoff)) => {
            add_breadcrumb("checkout", "Payment widget handed off", None);
            let buy_id = handoff.descriptor.buy_id_text();
            Ok(PaymentTemplate {
                prefill_email: auth.user.email.clone(),
                prefill_name: auth.user.display_name().to_string(),
                nav: Nav::new(&session, Some(auth.user)).await,
                nonce,
                handoff,
                buy_id,
            }
            .into_response())
        }
        Ok(outcome) => {
            add_breadcrumb("checkout", "Cash on delivery order placed", None);
            if let Err(e) = Flash::success("Order placed successfully!")
                .push(&session)
                .await
            {
                tracing::warn!(error = %e, "Failed to store flash message");
            }
            Ok(navigate(&headers, outcome.redirect().unwrap_or(ORDERS_PATH)))
        }
        Err(CheckoutError::Api(e)) if e.needs_login() => Ok(navigate(&headers, LOGIN_PATH)),
        Err(e) => {
            tracing::info!(error = %e, "Checkout refused");
            let template = CheckoutTemplate {
                nav: Nav::new(&session, Some(auth.user)).await,
                product,
                error: Some(e.user_message()),
                form,
                modes: [PaymentMode::Cod, PaymentMode::Online],
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response())
        }
    }
}

/// Payment widget callback: relay the confirmation to the backend.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip(state, session, auth, verification))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Form(verification): Form<PaymentVerification>,
) -> Result<Response> {
    let result = checkout::verify_payment(state.client(), &auth.credentials, verification).await;
    match result {
        Ok(()) => {
            Ok(redirect_with(&session, Flash::success("Payment successful!"), ORDERS_PATH).await)
        }
        Err(e) if e.needs_login() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Payment verification refused");
            Ok((
                StatusCode::BAD_REQUEST,
                VerifyFailedTemplate {
                    nav: Nav::new(&session, Some(auth.user)).await,
                    message: e.user_message("Payment verification failed"),
                },
            )
                .into_response())
        }
    }
}
