//! Session-related types.
//!
//! Types stored in the session for authentication state and page-to-page
//! messages.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use o2_shop_core::{Profile, Role};

/// Session-stored user identity.
///
/// Minimal data stored in the session to render the navbar and gate
/// seller pages. The backend remains the authority on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// Display name, if the profile has one.
    pub name: Option<String>,
    /// Login email.
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// Identity from a freshly loaded profile.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            role: profile.role,
        }
    }

    /// Name for the navbar greeting.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    #[must_use]
    pub const fn is_seller(&self) -> bool {
        self.role.is_seller()
    }
}

/// Flash message severity; doubles as the CSS modifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    /// Queue this message for the next page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn push(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::FLASH, self).await
    }

    /// Take the queued message, if any.
    ///
    /// A session read failure is logged and treated as no message.
    pub async fn take(session: &Session) -> Option<Self> {
        match session.remove::<Self>(keys::FLASH).await {
            Ok(flash) => flash,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read flash message");
                None
            }
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the backend cookies forwarded on every API call.
    pub const BACKEND_CREDENTIALS: &str = "backend_credentials";

    /// Key for the cart mirror.
    pub const CART: &str = "cart";

    /// Key for the seller's order list mirror.
    pub const SELLER_ORDERS: &str = "seller_orders";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}
