//! Profile route handlers.
//!
//! Shows the backend profile with role-specific shortcuts and lets the user
//! change their name and avatar.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use o2_shop_core::Profile;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::wire::ProfileUpdate;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, sign_in};
use crate::models::{CurrentUser, Flash};
use crate::routes::{Nav, UploadForm, redirect_with};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub profile: Profile,
}

#[derive(Template, WebTemplate)]
#[template(path = "profile/edit.html")]
pub struct EditProfileTemplate {
    pub nav: Nav,
    pub profile: Profile,
    pub error: Option<String>,
}

/// Display the profile.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<ProfileTemplate> {
    let profile = state.client().profile(&auth.credentials).await?;
    Ok(ProfileTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        profile,
    })
}

/// Display the edit form.
///
/// # Errors
///
/// Redirects to login when the backend rejects the session.
#[instrument(skip(state, session, auth))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<EditProfileTemplate> {
    let profile = state.client().profile(&auth.credentials).await?;
    Ok(EditProfileTemplate {
        nav: Nav::new(&session, Some(auth.user)).await,
        profile,
        error: None,
    })
}

/// Save name and avatar.
///
/// The avatar is sent as a data URI. Fields left blank are not changed.
///
/// # Errors
///
/// Returns an error for a malformed upload or a stale backend session.
#[instrument(skip(state, session, auth, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = UploadForm::read(multipart).await?;

    let photo = match form.photos.first() {
        Some(photo) => match photo.validate() {
            Ok(()) => Some(photo.to_data_uri()),
            Err(e) => return edit_error(&state, &session, auth, e.to_string()).await,
        },
        None => None,
    };
    let update = ProfileUpdate {
        name: form.text("name").map(str::to_string),
        photo,
    };

    if update.name.is_none() && update.photo.is_none() {
        return Ok(redirect_with(&session, Flash::info("Nothing to update."), "/profile").await);
    }

    if let Err(e) = state
        .client()
        .update_profile(&auth.credentials, update.clone())
        .await
    {
        if e.needs_login() {
            return Err(e.into());
        }
        tracing::warn!(error = %e, "Profile update refused");
        let message = e.user_message("Failed to update profile");
        return edit_error(&state, &session, auth, message).await;
    }

    // Keep the navbar name in step
    if let Some(name) = update.name {
        let user = CurrentUser {
            name: Some(name),
            ..auth.user
        };
        sign_in(&session, &user, &auth.credentials).await?;
    }

    Ok(redirect_with(&session, Flash::success("Profile updated successfully!"), "/profile").await)
}

async fn edit_error(
    state: &AppState,
    session: &Session,
    auth: RequireAuth,
    message: String,
) -> Result<Response> {
    let profile = state.client().profile(&auth.credentials).await?;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        EditProfileTemplate {
            nav: Nav::new(session, Some(auth.user)).await,
            profile,
            error: Some(message),
        },
    )
        .into_response())
}
