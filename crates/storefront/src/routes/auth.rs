//! Authentication route handlers.
//!
//! Handles login, signup, logout and Google sign-in against the backend.
//! The backend's session cookies are kept in the storefront session and
//! never reach the browser through the storefront.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use o2_shop_core::{Email, Role};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::BackendCredentials;
use crate::api::wire::{LoginRequest, SignUpRequest};
use crate::error::{LOGIN_PATH, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::middleware::{OptionalAuth, sign_in, sign_out};
use crate::models::{CurrentUser, Flash};
use crate::routes::{Nav, redirect_with};
use crate::state::AppState;

/// Shortest password the signup form accepts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form data.
#[derive(Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub email: String,
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub error: Option<String>,
}

// =============================================================================
// Login
// =============================================================================

/// Display login page. Signed-in visitors go to their home page.
#[instrument(skip(session, auth))]
pub async fn login_page(session: Session, auth: OptionalAuth) -> Response {
    if let Some(user) = auth.user {
        return Redirect::to(user.role.home_path()).into_response();
    }
    LoginTemplate {
        nav: Nav::new(&session, None).await,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the backend cookies and the profile identity are stored in
/// the session and the user lands on their role's home page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    if email.is_empty() || form.password.is_empty() {
        return Ok(login_error(&session, email, "Please enter your email and password.").await);
    }

    let outcome = match state
        .client()
        .login(LoginRequest {
            gmail: email.clone(),
            pass: form.password,
        })
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::info!(error = %e, "Login refused");
            let message = e.user_message("Login failed. Please check your credentials.");
            return Ok(login_error(&session, email, &message).await);
        }
    };

    // The login reply carries only the role; the profile has the name
    let user = match state.client().profile(&outcome.credentials).await {
        Ok(profile) => CurrentUser::from_profile(&profile),
        Err(e) => {
            tracing::warn!(error = %e, "Profile unavailable after login");
            CurrentUser {
                name: None,
                email,
                role: outcome.role.unwrap_or_default(),
            }
        }
    };

    sign_in(&session, &user, &outcome.credentials).await?;
    set_sentry_user(&user.email, user.role.as_str());
    tracing::info!(role = %user.role, "Login successful");

    Ok(Redirect::to(user.role.home_path()).into_response())
}

async fn login_error(session: &Session, email: String, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        LoginTemplate {
            nav: Nav::new(session, None).await,
            email,
            error: Some(message.to_string()),
        },
    )
        .into_response()
}

// =============================================================================
// Signup
// =============================================================================

/// Display signup page.
#[instrument(skip(session))]
pub async fn signup_page(session: Session) -> SignupTemplate {
    SignupTemplate {
        nav: Nav::new(&session, None).await,
        name: String::new(),
        email: String::new(),
        role: Role::User,
        error: None,
    }
}

/// Check the signup form before calling the backend.
fn validate_signup(form: &SignupForm) -> std::result::Result<Email, &'static str> {
    if form.name.trim().is_empty() {
        return Err("Please enter your name.");
    }
    let email = Email::parse(&form.email).map_err(|_| "Please enter a valid email address.")?;
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters.");
    }
    Ok(email)
}

/// Handle signup form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip(state, session, form), fields(email = %form.email, role = %form.role))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let result = match validate_signup(&form) {
        Ok(email) => state
            .client()
            .sign_up(SignUpRequest {
                name: form.name.trim().to_string(),
                email: email.into_inner(),
                password: form.password.clone(),
                role: form.role,
            })
            .await
            .map_err(|e| e.user_message("Signup failed. Please try again.")),
        Err(message) => Err(message.to_string()),
    };

    match result {
        Ok(()) => {
            tracing::info!("Account created");
            Ok(redirect_with(
                &session,
                Flash::success("Account created! Please log in."),
                LOGIN_PATH,
            )
            .await)
        }
        Err(message) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            SignupTemplate {
                nav: Nav::new(&session, None).await,
                name: form.name,
                email: form.email,
                role: form.role,
                error: Some(message),
            },
        )
            .into_response()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The backend is told first; a failure there is logged and the local
/// session is cleared anyway.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
#[instrument(skip(state, session, auth))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Response> {
    if !auth.credentials.is_empty()
        && let Err(e) = state.client().logout(&auth.credentials).await
    {
        tracing::warn!(error = %e, "Backend logout failed");
    }

    sign_out(&session).await?;
    clear_sentry_user();

    Ok(redirect_with(&session, Flash::info("You have been logged out."), "/").await)
}

// =============================================================================
// Google sign-in
// =============================================================================

/// Send the browser to the backend's Google OAuth flow.
#[instrument(skip(state))]
pub async fn google(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.config().api.oauth_url("google"))
}

/// Finish Google sign-in.
///
/// The backend's OAuth success redirect points here. Its session cookies are
/// visible on this request when the backend shares the storefront's cookie
/// domain; they are adopted as this session's backend credentials.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip(state, session, headers))]
pub async fn google_complete(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let cookie_header = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let credentials = BackendCredentials::from_cookie_header(&cookie_header, SESSION_COOKIE_NAME);

    if credentials.is_empty() {
        return Ok(redirect_with(
            &session,
            Flash::error("Google sign-in did not complete. Please try again."),
            LOGIN_PATH,
        )
        .await);
    }

    match state.client().profile(&credentials).await {
        Ok(profile) => {
            let user = CurrentUser::from_profile(&profile);
            sign_in(&session, &user, &credentials).await?;
            set_sentry_user(&user.email, user.role.as_str());
            tracing::info!(role = %user.role, "Google login successful");
            Ok(Redirect::to(user.role.home_path()).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Google sign-in could not load profile");
            Ok(redirect_with(
                &session,
                Flash::error("Google sign-in did not complete. Please try again."),
                LOGIN_PATH,
            )
            .await)
        }
    }
}
