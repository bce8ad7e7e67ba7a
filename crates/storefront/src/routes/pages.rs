//! Static content page route handlers.
//!
//! Serves the markdown pages bundled under `content/pages`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Nav;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub nav: Nav,
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve a content page by slug.
async fn serve_content_page(
    state: &AppState,
    session: &Session,
    auth: OptionalAuth,
    slug: &str,
) -> Response {
    let Some(page) = state.content().get_page(slug) else {
        return AppError::NotFound(format!("Page {slug}")).into_response();
    };

    ContentPageTemplate {
        nav: Nav::new(session, auth.user).await,
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    }
    .into_response()
}

#[instrument(skip(state, session, auth))]
pub async fn faq(State(state): State<AppState>, session: Session, auth: OptionalAuth) -> Response {
    serve_content_page(&state, &session, auth, "faq").await
}

#[instrument(skip(state, session, auth))]
pub async fn returns(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Response {
    serve_content_page(&state, &session, auth, "returns").await
}

#[instrument(skip(state, session, auth))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Response {
    serve_content_page(&state, &session, auth, "shipping").await
}

#[instrument(skip(state, session, auth))]
pub async fn contact(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Response {
    serve_content_page(&state, &session, auth, "contact").await
}

/// Display the Terms of Service page.
#[instrument(skip(state, session, auth))]
pub async fn terms(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Response {
    serve_content_page(&state, &session, auth, "terms").await
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/faq", get(faq))
        .route("/returns", get(returns))
        .route("/shipping", get(shipping))
        .route("/contact", get(contact))
        .route("/terms", get(terms))
}
