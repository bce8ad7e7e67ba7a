//! Search route handlers.
//!
//! The navbar form submits to `/search?q=`, which redirects to the
//! shareable `/products/search/{query}` results page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use o2_shop_core::Product;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Nav;
use crate::services::SearchOutcome;
use crate::services::catalog;
use crate::state::AppState;

/// Shown when a search matches nothing.
pub const NO_RESULTS_MESSAGE: &str = "No products found for your search.";

/// Navbar search form.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

/// Search results template.
#[derive(Template, WebTemplate)]
#[template(path = "search/results.html")]
pub struct SearchResultsTemplate {
    pub nav: Nav,
    pub query: String,
    pub products: Vec<Product>,
    pub empty_message: Option<&'static str>,
    pub error: Option<String>,
}

/// Redirect the navbar form to the results page. A blank query goes back
/// to the catalog without searching.
#[instrument(skip(auth))]
pub async fn submit(auth: OptionalAuth, Query(form): Query<SearchForm>) -> Response {
    let query = form.q.trim();
    if query.is_empty() {
        let home = auth.user.map_or("/", |u| u.role.home_path());
        return Redirect::to(home).into_response();
    }
    Redirect::to(&format!("/products/search/{}", urlencoding::encode(query))).into_response()
}

/// Display search results.
///
/// Sellers search their own listings, everyone else the public catalog.
/// A backend failure renders the page with an inline alert.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn results(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Path(query): Path<String>,
) -> Result<SearchResultsTemplate> {
    let role = auth.user.as_ref().map(|u| u.role);
    let (products, error) =
        match catalog::search(state.client(), &auth.credentials, role, &query).await {
            Ok(SearchOutcome::Skipped) => (Vec::new(), None),
            Ok(SearchOutcome::Results(products)) => (products, None),
            Err(e) if e.needs_login() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Search failed");
                (
                    Vec::new(),
                    Some(e.user_message("Failed to fetch search results.")),
                )
            }
        };
    let empty_message = (error.is_none() && products.is_empty()).then_some(NO_RESULTS_MESSAGE);

    Ok(SearchResultsTemplate {
        nav: Nav::new(&session, auth.user).await.with_search(query.trim()),
        query: query.trim().to_string(),
        products,
        empty_message,
        error,
    })
}
