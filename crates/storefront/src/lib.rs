//! O2 Shop storefront library.
//!
//! Server-rendered shop and seller console over the O2 backend REST API.
//! The library holds everything but process startup so the integration
//! tests can drive the full router against an in-memory backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use axum::{Router, extract::Request, middleware::from_fn, middleware::from_fn_with_state};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::KeyError;

use crate::middleware::{
    create_session_layer, csp_nonce_middleware, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Static assets, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Markdown pages, relative to the workspace root.
pub const CONTENT_DIR: &str = "crates/storefront/content";

/// Build the storefront router with its middleware stack.
///
/// # Errors
///
/// Returns an error if the session secret cannot be turned into a signing
/// key.
pub fn app(state: AppState) -> Result<Router, KeyError> {
    let session_layer = create_session_layer(state.config())?;

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Ok(routes::routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(trace_layer)
        .with_state(state))
}
