//! Authentication route handlers.
//!
//! Sign-in and sign-up share one page with two tabs. Input is validated
//! locally before the auth API is called; field errors render inline and
//! remote failures become flash notifications.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use digimart_core::validation::{self, FieldErrors};
use digimart_supabase::{AuthError, AuthSession, SignUpOutcome};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, set_admin_capability, set_auth_session};
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::views::PageContext;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `/auth` query parameters.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub tab: Option<String>,
}

/// Which tab is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTab {
    SignIn,
    SignUp,
}

impl AuthTab {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("register") => Self::SignUp,
            _ => Self::SignIn,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in / sign-up page template.
///
/// Passwords are never echoed back.
#[derive(Template, WebTemplate)]
#[template(path = "auth/index.html")]
pub struct AuthTemplate {
    pub page: PageContext,
    pub sign_up: bool,
    pub login_email: String,
    pub register_email: String,
    pub register_name: String,
    pub errors: HashMap<&'static str, String>,
}

impl AuthTemplate {
    fn new(page: PageContext, tab: AuthTab) -> Self {
        Self {
            page,
            sign_up: tab == AuthTab::SignUp,
            login_email: String::new(),
            register_email: String::new(),
            register_name: String::new(),
            errors: HashMap::new(),
        }
    }

    fn with_errors(mut self, errors: &FieldErrors) -> Self {
        self.errors = errors.iter().map(|(field, e)| (field, e.to_string())).collect();
        self
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the sign-in / sign-up page. Signed-in users go home.
#[instrument(skip(state, session, auth))]
pub async fn page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<AuthQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }

    let page = PageContext::load(&state, &session, None).await;
    AuthTemplate::new(page, AuthTab::parse(query.tab.as_deref())).into_response()
}

/// Handle sign-in form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let mut errors = FieldErrors::new();
    let email = errors.check("login_email", validation::email(&form.email));
    errors.check("login_password", validation::password(&form.password));

    let Some(email) = email.filter(|_| errors.is_empty()) else {
        let page = PageContext::load(&state, &session, None).await;
        let mut template = AuthTemplate::new(page, AuthTab::SignIn).with_errors(&errors);
        template.login_email = form.email;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    };

    match state.auth().sign_in(&email, &form.password).await {
        Ok(auth) => {
            start_session(&state, &session, &auth).await?;
            push_flash(&session, Flash::success("Signed in").with_message("Welcome back!")).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            let page = PageContext::load(&state, &session, None).await;
            let mut template = AuthTemplate::new(page, AuthTab::SignIn);
            template.login_email = form.email;
            template.page.flashes.push(sign_in_failure(&e));
            Ok((status_for(&e), template).into_response())
        }
    }
}

/// Handle sign-up form submission.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let mut errors = FieldErrors::new();
    let full_name = errors.check("register_name", validation::required(&form.full_name));
    let email = errors.check("register_email", validation::email(&form.email));
    errors.check("register_password", validation::password(&form.password));

    let render_form = |page: PageContext, errors: &FieldErrors| {
        let mut template = AuthTemplate::new(page, AuthTab::SignUp).with_errors(errors);
        template.register_email.clone_from(&form.email);
        template.register_name.clone_from(&form.full_name);
        template
    };

    let (Some(full_name), Some(email), true) = (full_name, email, errors.is_empty()) else {
        let page = PageContext::load(&state, &session, None).await;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, render_form(page, &errors)).into_response());
    };

    match state.auth().sign_up(&email, &form.password, &full_name).await {
        Ok(SignUpOutcome::SignedIn(auth)) => {
            start_session(&state, &session, &auth).await?;
            push_flash(
                &session,
                Flash::success("Account created").with_message("Welcome to DigiMart!"),
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Ok(SignUpOutcome::ConfirmationRequired { email }) => {
            push_flash(
                &session,
                Flash::info("Account created")
                    .with_message(format!("Check {email} for a confirmation link, then sign in.")),
            )
            .await?;
            Ok(Redirect::to("/auth").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            let page = PageContext::load(&state, &session, None).await;
            let mut template = render_form(page, &FieldErrors::new());
            template
                .page
                .flashes
                .push(Flash::error("Sign-up failed").with_message(e.to_string()));
            Ok((status_for(&e), template).into_response())
        }
    }
}

/// Handle sign-out.
///
/// The whole session is flushed, which also discards the cart.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Redirect> {
    if let Some(auth) = auth {
        if let Err(e) = state.auth().sign_out(&auth.access_token).await {
            tracing::warn!(error = %e, "Failed to revoke session token");
        }
        tracing::info!(user_id = %auth.user.id, "User signed out");
    }

    session.flush().await?;
    clear_sentry_user();

    push_flash(&session, Flash::info("Signed out")).await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the auth session under a fresh session id and note admin access.
async fn start_session(state: &AppState, session: &Session, auth: &AuthSession) -> Result<()> {
    session.cycle_id().await?;
    set_auth_session(session, auth).await?;

    match state.auth().resolve_admin(auth).await {
        Ok(Some(capability)) => set_admin_capability(session, &capability).await?,
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to resolve admin role"),
    }

    set_sentry_user(&auth.user.id, auth.user.email.as_deref());
    Ok(())
}

fn sign_in_failure(e: &AuthError) -> Flash {
    match e {
        AuthError::InvalidCredentials => Flash::error("Sign-in failed").with_message(e.to_string()),
        _ => {
            tracing::warn!(error = %e, "Sign-in failed");
            Flash::error("Sign-in failed").with_message("Please try again in a moment.")
        }
    }
}

const fn status_for(e: &AuthError) -> StatusCode {
    match e {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::WeakPassword(_) | AuthError::InvalidEmail => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::Gateway(_) | AuthError::Api { .. } => StatusCode::BAD_GATEWAY,
    }
}
