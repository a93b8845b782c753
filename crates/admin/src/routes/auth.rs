//! Authentication route handlers for admin.
//!
//! Admins sign in with the same email and password as on the storefront.
//! A successful sign-in without the `admin` role is revoked immediately.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use digimart_core::validation::{self, FieldErrors};
use digimart_supabase::{AuthError, AuthSession};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdmin, set_current_admin};
use crate::models::{CurrentAdmin, Flash, push_flash, take_flashes};
use crate::state::AppState;

/// Shown when the credentials are valid but the account is not an admin.
pub const NOT_AN_ADMIN: &str = "This account does not have admin access";

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub email: String,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub flashes: Vec<Flash>,
}

impl LoginPageTemplate {
    fn new(email: String, flashes: Vec<Flash>) -> Self {
        Self {
            email,
            email_error: None,
            password_error: None,
            flashes,
        }
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Render the login page.
///
/// GET /login
#[instrument(skip_all)]
async fn login_page(session: Session, OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginPageTemplate::new(String::new(), take_flashes(&session).await).into_response()
}

/// Sign in and check the admin role.
///
/// POST /login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let mut errors = FieldErrors::new();
    let email = errors.check("email", validation::email(&form.email));
    errors.check("password", validation::password(&form.password));

    let Some(email) = email.filter(|_| errors.is_empty()) else {
        let mut template = LoginPageTemplate::new(form.email, Vec::new());
        template.email_error = errors.get("email");
        template.password_error = errors.get("password");
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    };

    let auth = match state.auth().sign_in(&email, &form.password).await {
        Ok(auth) => auth,
        Err(e) => {
            let (status, message) = sign_in_failure(&e);
            let template = LoginPageTemplate::new(form.email, vec![Flash::error(message)]);
            return Ok((status, template).into_response());
        }
    };

    let capability = match state.auth().resolve_admin(&auth).await {
        Ok(Some(capability)) => capability,
        Ok(None) => {
            tracing::warn!(user_id = %auth.user.id, "Non-admin sign-in refused");
            revoke(&state, &auth).await;
            let template = LoginPageTemplate::new(form.email, vec![Flash::error(NOT_AN_ADMIN)]);
            return Ok((StatusCode::FORBIDDEN, template).into_response());
        }
        Err(e) => {
            tracing::error!(error = %e, "Admin role lookup failed");
            revoke(&state, &auth).await;
            let template = LoginPageTemplate::new(
                form.email,
                vec![Flash::error("Could not verify admin access, please try again")],
            );
            return Ok((StatusCode::BAD_GATEWAY, template).into_response());
        }
    };

    session.cycle_id().await?;
    set_sentry_user(&auth.user.id, auth.user.email.as_deref());
    tracing::info!(user_id = %auth.user.id, "Admin signed in");
    set_current_admin(&session, &CurrentAdmin { auth, capability }).await?;

    Ok(Redirect::to("/").into_response())
}

/// Logout and clear session.
///
/// POST /logout
#[instrument(skip_all)]
async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAdmin(admin): OptionalAdmin,
) -> Result<Redirect> {
    if let Some(admin) = admin {
        revoke(&state, &admin.auth).await;
        tracing::info!(user_id = %admin.auth.user.id, "Admin signed out");
    }

    session.flush().await?;
    clear_sentry_user();
    push_flash(&session, Flash::success("Signed out")).await?;

    Ok(Redirect::to("/login"))
}

async fn revoke(state: &AppState, auth: &AuthSession) {
    if let Err(e) = state.auth().sign_out(&auth.access_token).await {
        tracing::warn!(error = %e, "Failed to revoke session token");
    }
}

fn sign_in_failure(e: &AuthError) -> (StatusCode, String) {
    match e {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
        _ => {
            tracing::warn!(error = %e, "Admin sign-in failed");
            (
                StatusCode::BAD_GATEWAY,
                "Sign-in failed, please try again".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_are_shown() {
        let (status, message) = sign_in_failure(&AuthError::InvalidCredentials);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Invalid email or password");
    }

    #[test]
    fn test_upstream_failure_is_generic() {
        let (status, message) = sign_in_failure(&AuthError::Api {
            status: 503,
            message: "upstream timeout".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!message.contains("upstream"));
    }
}
