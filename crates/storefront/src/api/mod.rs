//! REST client for the O2 backend.
//!
//! # Architecture
//!
//! - [`Endpoint`] describes every backend call as data: method, path, query
//!   and JSON body
//! - [`ShopApi`] is the transport port; [`HttpShopApi`] implements it with
//!   `reqwest`, tests implement it with a recording fake
//! - [`ShopClient`] is the typed facade the routes use. It decodes JSON and
//!   caches the public catalog in `moka`
//! - The backend authenticates with its own cookies. They are captured at
//!   login into [`BackendCredentials`], kept in the storefront session, and
//!   forwarded on every call
//!
//! # Example
//!
//! ```rust,ignore
//! use o2_shop_storefront::api::{HttpShopApi, ShopClient};
//!
//! let client = ShopClient::new(Arc::new(HttpShopApi::new(&config.api)?), config.api.cache_ttl);
//! let products = client.products().await?;
//! ```

mod cache;
mod client;
mod credentials;
mod endpoint;
mod http;
pub mod wire;

pub use client::{LoginOutcome, ShopClient};
pub use credentials::BackendCredentials;
pub use endpoint::{Endpoint, SearchScope};
pub use http::HttpShopApi;

use async_trait::async_trait;
use thiserror::Error;

/// Longest backend error body kept in [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the credentials (401).
    #[error("Not logged in")]
    Unauthorized,

    /// Backend refused the action for this account (403).
    #[error("Access denied")]
    Forbidden,

    /// Resource not found (404).
    #[error("Not found")]
    NotFound,

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured backend URL cannot be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Map a non-success status and its body to an error.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::Status {
                status,
                message: body.trim().chars().take(MAX_ERROR_BODY).collect(),
            },
        }
    }

    /// Whether the caller should be sent to the login page.
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }

    /// Text for the inline alert shown to the user.
    ///
    /// The backend answers most rejections with a plain-text reason, which
    /// is shown as-is; everything else falls back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Unauthorized | Self::Forbidden => "Please log in to continue.".to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// A successful backend response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiReply {
    /// Response body as text.
    pub body: String,
    /// Raw `Set-Cookie` header values.
    pub set_cookies: Vec<String>,
}

impl ApiReply {
    /// A reply with a body and no cookies.
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            set_cookies: Vec::new(),
        }
    }
}

/// Transport port for backend calls.
///
/// Implementations map non-success statuses with [`ApiError::from_status`].
#[async_trait]
pub trait ShopApi: Send + Sync {
    /// Send `endpoint`, forwarding `credentials` as cookies.
    async fn call(
        &self,
        credentials: &BackendCredentials,
        endpoint: Endpoint,
    ) -> Result<ApiReply, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_failures() {
        assert!(matches!(
            ApiError::from_status(401, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(ApiError::from_status(403, ""), ApiError::Forbidden));
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound));
        assert!(ApiError::from_status(403, "").needs_login());
    }

    #[test]
    fn test_from_status_keeps_trimmed_body() {
        let err = ApiError::from_status(400, "  Out of stock\n");
        assert_eq!(err.user_message("Error placing order"), "Out of stock");
        assert!(!err.needs_login());
    }

    #[test]
    fn test_from_status_truncates_long_bodies() {
        let body = "x".repeat(2000);
        let ApiError::Status { message, .. } = ApiError::from_status(500, &body) else {
            panic!("expected status error");
        };
        assert_eq!(message.len(), MAX_ERROR_BODY);
    }

    #[test]
    fn test_user_message_falls_back_for_empty_body() {
        let err = ApiError::from_status(500, "");
        assert_eq!(err.user_message("Failed to subscribe."), "Failed to subscribe.");
    }
}
