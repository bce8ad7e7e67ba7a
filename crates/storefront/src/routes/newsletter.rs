//! Newsletter subscription route handler.
//!
//! The footer form posts here through HTMX and is swapped for one of the
//! fragments below. The backend treats repeat addresses as a success.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use o2_shop_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Subscribe to the newsletter (HTMX).
#[instrument(skip(state), fields(email = %form.email))]
pub async fn subscribe(State(state): State<AppState>, Form(form): Form<SubscribeForm>) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            SubscribeErrorTemplate {
                message: "Please enter a valid email address.".to_string(),
                email: form.email.trim().to_string(),
            },
        )
            .into_response();
    };

    let shown = email.as_str().to_string();
    match state.client().subscribe(email).await {
        Ok(()) => {
            tracing::info!("Newsletter subscription successful");
            SubscribeSuccessTemplate { email: shown }.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: "Something went wrong. Please try again.".to_string(),
                email: shown,
            }
            .into_response()
        }
    }
}
