//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use crate::api::{ApiError, HttpShopApi, ShopApi, ShopClient};
use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::services::PaymentWidget;
use crate::services::checkout::HostedCheckoutScript;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Api(#[from] ApiError),
    #[error("payment script client: {0}")]
    Payment(#[from] reqwest::Error),
    #[error("content: {0}")]
    Content(#[from] ContentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backend client, the payment widget, info pages and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: ShopClient,
    widget: Arc<dyn PaymentWidget>,
    content: ContentStore,
}

impl AppState {
    /// Create the production state: HTTP backend, hosted payment script and
    /// pages loaded from `content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the pages
    /// directory cannot be read.
    pub fn new(config: StorefrontConfig, content_dir: &Path) -> Result<Self, StateError> {
        let api: Arc<dyn ShopApi> = Arc::new(HttpShopApi::new(&config.api)?);
        let widget: Arc<dyn PaymentWidget> = Arc::new(HostedCheckoutScript::new(&config.payment)?);
        let content = ContentStore::load(content_dir)?;
        Ok(Self::with_backend(config, api, widget, content))
    }

    /// Create a state over any backend and payment widget.
    #[must_use]
    pub fn with_backend(
        config: StorefrontConfig,
        api: Arc<dyn ShopApi>,
        widget: Arc<dyn PaymentWidget>,
        content: ContentStore,
    ) -> Self {
        let client = ShopClient::new(api, config.api.cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                client,
                widget,
                content,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn client(&self) -> &ShopClient {
        &self.inner.client
    }

    #[must_use]
    pub fn widget(&self) -> &dyn PaymentWidget {
        self.inner.widget.as_ref()
    }

    /// Info pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }
}
