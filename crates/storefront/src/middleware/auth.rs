//! Authentication extractors.
//!
//! A visitor counts as signed in when the session holds both a
//! [`CurrentUser`] and the backend cookies issued at login. The backend
//! still checks every call; these extractors only decide whether to try.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::BackendCredentials;
use crate::error::LOGIN_PATH;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user of any role.
///
/// If the visitor is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth { user, credentials }: RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth {
    pub user: CurrentUser,
    pub credentials: BackendCredentials,
}

/// Extractor that requires a signed-in seller.
///
/// Shoppers are sent to their dashboard rather than the login page.
pub struct RequireSeller {
    pub user: CurrentUser,
    pub credentials: BackendCredentials,
}

/// Error returned when authentication is required but the visitor is not
/// logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Signed in, wrong role: back to the user's own home.
    RedirectHome(&'static str),
    /// No session layer in front of the handler.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::RedirectHome(path) => Redirect::to(path).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn signed_in(parts: &Parts) -> Result<(CurrentUser, BackendCredentials), AuthRejection> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::MissingSession)?;

    let user: CurrentUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or(AuthRejection::RedirectToLogin)?;

    let credentials: BackendCredentials = session
        .get(session_keys::BACKEND_CREDENTIALS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    Ok((user, credentials))
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, credentials) = signed_in(parts).await?;
        Ok(Self { user, credentials })
    }
}

impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (user, credentials) = signed_in(parts).await?;
        if !user.is_seller() {
            return Err(AuthRejection::RedirectHome(user.role.home_path()));
        }
        Ok(Self { user, credentials })
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the visitor is
/// not logged in. Credentials are anonymous for guests.
pub struct OptionalAuth {
    pub user: Option<CurrentUser>,
    pub credentials: BackendCredentials,
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match signed_in(parts).await {
            Ok((user, credentials)) => Self {
                user: Some(user),
                credentials,
            },
            Err(_) => Self {
                user: None,
                credentials: BackendCredentials::anonymous(),
            },
        })
    }
}

/// Record a successful login in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    user: &CurrentUser,
    credentials: &BackendCredentials,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    session
        .insert(session_keys::BACKEND_CREDENTIALS, credentials)
        .await
}

/// Drop everything the session holds (logout, or stale backend cookies).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
