//! Authentication extractors for admin.
//!
//! Every back-office page takes [`RequireAdmin`]. The stored capability must
//! match the stored auth session; an access token close to expiry is
//! refreshed in place and a failed refresh signs the admin out.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name())
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when the request has no valid admin session.
pub enum AdminAuthRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// The session layer is missing.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = current_admin(session, state)
            .await
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        tracing::Span::current().record("admin_id", tracing::field::display(admin.auth.user.id));
        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the signed-in admin.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl FromRequestParts<AppState> for OptionalAdmin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => current_admin(session, state).await,
            None => None,
        };

        Ok(Self(admin))
    }
}

async fn current_admin(session: &Session, state: &AppState) -> Option<CurrentAdmin> {
    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()?;

    if !admin.is_valid() {
        tracing::warn!(user_id = %admin.auth.user.id, "Capability does not match session user");
        let _ = clear_current_admin(session).await;
        return None;
    }

    if !admin.auth.needs_refresh(Utc::now()) {
        return Some(admin);
    }

    let Some(refresh_token) = admin.auth.refresh_token.as_ref() else {
        let _ = clear_current_admin(session).await;
        return None;
    };

    match state.auth().refresh(refresh_token).await {
        Ok(auth) if admin.capability.matches(&auth) => {
            let refreshed = CurrentAdmin {
                auth,
                capability: admin.capability,
            };
            if let Err(e) = set_current_admin(session, &refreshed).await {
                tracing::warn!(error = %e, "Failed to store refreshed admin session");
            }
            Some(refreshed)
        }
        Ok(_) => {
            tracing::warn!("Refreshed session belongs to a different user");
            let _ = clear_current_admin(session).await;
            None
        }
        Err(e) => {
            tracing::info!(error = %e, "Admin session refresh failed");
            let _ = clear_current_admin(session).await;
            None
        }
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}
