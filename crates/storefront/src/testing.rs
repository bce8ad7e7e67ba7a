//! In-memory fakes for tests.
//!
//! [`FakeShopApi`] records every [`Endpoint`] it receives and answers from
//! a per-route script, so tests can assert on exactly which calls were made
//! and what they carried. [`test_state`] wires the fakes into an
//! [`AppState`] for router-level tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use crate::api::{ApiError, ApiReply, BackendCredentials, Endpoint, ShopApi};
use crate::config::{ApiConfig, PaymentConfig, StorefrontConfig};
use crate::content::ContentStore;
use crate::services::PaymentWidget;
use crate::services::checkout::WidgetError;
use crate::state::AppState;

/// Session secret for tests: long enough for a signing key.
const TEST_SESSION_SECRET: &str =
    "k3Vq9ZpL2wXe7RtYb5NcHf8JmUa4GdSo1QiKv6BnTx0PzEyWrMh2LsCj9DuAg7Fo";

const TEST_FAQ: &str = "---\ntitle: FAQ\n---\n\n## How do I pay?\n\nCash or online.\n";

#[derive(Debug, Clone)]
enum FakeReply {
    Ok(ApiReply),
    Status(u16, String),
}

impl FakeReply {
    fn into_result(self) -> Result<ApiReply, ApiError> {
        match self {
            Self::Ok(reply) => Ok(reply),
            Self::Status(status, body) => Err(ApiError::from_status(status, &body)),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    once: VecDeque<FakeReply>,
    sticky: Option<FakeReply>,
}

/// Recording backend fake.
///
/// Routes are `"METHOD /path"` strings as produced by [`Endpoint::route`].
/// Unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct FakeShopApi {
    calls: Mutex<Vec<Endpoint>>,
    scripts: Mutex<HashMap<String, Script>>,
}

impl FakeShopApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, route: &str, reply: FakeReply, once: bool) {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let script = scripts.entry(route.to_string()).or_default();
        if once {
            script.once.push_back(reply);
        } else {
            script.sticky = Some(reply);
        }
    }

    /// Answer `route` with `body` from now on.
    pub fn respond(&self, route: &str, body: &str) {
        self.script(route, FakeReply::Ok(ApiReply::json(body)), false);
    }

    /// Answer `route` with `body` and `Set-Cookie` headers.
    pub fn respond_with_cookies(&self, route: &str, body: &str, cookies: &[&str]) {
        let reply = ApiReply {
            body: body.to_string(),
            set_cookies: cookies.iter().map(ToString::to_string).collect(),
        };
        self.script(route, FakeReply::Ok(reply), false);
    }

    /// Answer the next call to `route` with `body`, ahead of sticky replies.
    pub fn respond_once(&self, route: &str, body: &str) {
        self.script(route, FakeReply::Ok(ApiReply::json(body)), true);
    }

    /// Fail `route` with `status` from now on.
    pub fn fail(&self, route: &str, status: u16, body: &str) {
        self.script(route, FakeReply::Status(status, body.to_string()), false);
    }

    /// Fail the next call to `route`, ahead of sticky replies.
    pub fn fail_once(&self, route: &str, status: u16, body: &str) {
        self.script(route, FakeReply::Status(status, body.to_string()), true);
    }

    /// Every endpoint received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Endpoint> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls whose route equals `route`.
    #[must_use]
    pub fn calls_to(&self, route: &str) -> Vec<Endpoint> {
        self.calls()
            .into_iter()
            .filter(|e| e.route() == route)
            .collect()
    }

    /// Forget recorded calls, keeping scripts.
    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl ShopApi for FakeShopApi {
    async fn call(
        &self,
        _credentials: &BackendCredentials,
        endpoint: Endpoint,
    ) -> Result<ApiReply, ApiError> {
        let route = endpoint.route();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(endpoint);

        let reply = {
            let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
            scripts
                .get_mut(&route)
                .and_then(|s| s.once.pop_front().or_else(|| s.sticky.clone()))
        };

        reply.map_or(Err(ApiError::NotFound), FakeReply::into_result)
    }
}

/// Payment widget fake that counts load attempts.
#[derive(Debug)]
pub struct FakePaymentWidget {
    available: bool,
    loads: AtomicUsize,
}

impl FakePaymentWidget {
    /// A widget whose script loads.
    #[must_use]
    pub const fn available() -> Self {
        Self {
            available: true,
            loads: AtomicUsize::new(0),
        }
    }

    /// A widget whose script fails to load.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            available: false,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times `load` was called.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentWidget for FakePaymentWidget {
    async fn load(&self) -> Result<(), WidgetError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(())
        } else {
            Err(WidgetError::Unreachable("simulated network failure".to_string()))
        }
    }

    fn script_url(&self) -> &str {
        "https://checkout.example.test/v1/checkout.js"
    }
}

/// Configuration pointing at nothing; every backend call goes to a fake.
///
/// # Panics
///
/// Never in practice; the URLs are constants.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from(TEST_SESSION_SECRET),
        api: ApiConfig {
            base_url: Url::parse("http://backend.test/").expect("valid URL"),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(30),
        },
        payment: PaymentConfig {
            script_url: Url::parse("https://checkout.example.test/v1/checkout.js")
                .expect("valid URL"),
            merchant_name: "O2 Shop".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Application state over the given fakes, with a single FAQ page.
///
/// # Panics
///
/// Never in practice; the bundled page is well-formed.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_state(api: Arc<FakeShopApi>, widget: Arc<FakePaymentWidget>) -> AppState {
    let content = ContentStore::from_sources([("faq", TEST_FAQ)]).expect("valid page");
    AppState::with_backend(test_config(), api, widget, content)
}
