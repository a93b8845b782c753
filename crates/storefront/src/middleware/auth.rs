//! Authentication extractors.
//!
//! The signed-in user's [`AuthSession`] is kept in the server-side session.
//! Extractors refresh it when the access token is about to expire; a failed
//! refresh signs the user out.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use digimart_supabase::{AdminCapability, AuthSession};
use tower_sessions::Session;

use crate::models::session_keys;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, redirects to the sign-in page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.display_name())
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Error returned when authentication is required but nobody is signed in.
pub enum AuthRejection {
    /// Redirect to the sign-in page.
    RedirectToLogin,
    /// The session layer is missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        current_auth(session, state)
            .await
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject the request.
pub struct OptionalAuth(pub Option<AuthSession>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => current_auth(session, state).await,
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Load the auth session, refreshing it when the token is about to expire.
async fn current_auth(session: &Session, state: &AppState) -> Option<AuthSession> {
    let auth: AuthSession = session
        .get(session_keys::AUTH_SESSION)
        .await
        .ok()
        .flatten()?;

    if !auth.needs_refresh(Utc::now()) {
        return Some(auth);
    }

    let Some(refresh_token) = auth.refresh_token.as_ref() else {
        tracing::info!(user_id = %auth.user.id, "Session expired without refresh token");
        let _ = clear_auth_session(session).await;
        return None;
    };

    match state.auth().refresh(refresh_token).await {
        Ok(refreshed) => {
            if let Err(e) = set_auth_session(session, &refreshed).await {
                tracing::warn!(error = %e, "Failed to store refreshed session");
            }
            Some(refreshed)
        }
        Err(e) => {
            tracing::info!(user_id = %auth.user.id, error = %e, "Session refresh failed");
            let _ = clear_auth_session(session).await;
            None
        }
    }
}

/// Helper to store the auth session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Helper to remember that the signed-in user is an admin.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_admin_capability(
    session: &Session,
    capability: &AdminCapability,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::ADMIN, capability).await
}

/// Whether the session holds an admin capability for `auth`.
pub async fn is_admin(session: &Session, auth: &AuthSession) -> bool {
    session
        .get::<AdminCapability>(session_keys::ADMIN)
        .await
        .ok()
        .flatten()
        .is_some_and(|cap| cap.matches(auth))
}

/// Helper to drop the auth session and admin capability.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AuthSession>(session_keys::AUTH_SESSION)
        .await?;
    session
        .remove::<AdminCapability>(session_keys::ADMIN)
        .await?;
    Ok(())
}
