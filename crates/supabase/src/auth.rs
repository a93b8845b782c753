//! GoTrue auth API client.
//!
//! Sign-in, sign-up and sign-out are delegated to `{SUPABASE_URL}/auth/v1`.
//! The resulting [`AuthSession`] is stored in the server-side session by the
//! web binaries. Admin access is resolved once, right after sign-in, into an
//! [`AdminCapability`] that only this module can create.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use digimart_core::{AppRole, Email, UserId};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::SupabaseConfig;
use crate::error::AuthError;
use crate::rest::{GatewayClient, Select};
use crate::types::UserRole;

/// Refresh tokens this long before they expire.
const EXPIRY_LEEWAY_SECS: i64 = 60;

// =============================================================================
// Tokens and sessions
// =============================================================================

/// A bearer token issued by the auth API.
///
/// `Debug` is redacted. The token serializes as a plain string so it can be
/// kept in the server-side session store; it is never sent to the browser.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token for an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// The signed-in user as reported by the auth API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl AuthUser {
    /// Name to show in the header: full name, then email, then "Account".
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Account")
    }
}

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: AccessToken,
    pub refresh_token: Option<AccessToken>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Whether the access token expires within the refresh leeway.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|exp| exp - Duration::seconds(EXPIRY_LEEWAY_SECS) <= now)
    }
}

/// Proof that a user held the `admin` role when they signed in.
///
/// Fields are private and the only constructor is
/// [`AuthClient::resolve_admin`]. It derives `Deserialize` only so it can be
/// restored from the server-side session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCapability {
    user_id: UserId,
}

impl AdminCapability {
    /// Whether this capability belongs to `session`.
    #[must_use]
    pub fn matches(&self, session: &AuthSession) -> bool {
        self.user_id == session.user.id
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account is active and signed in.
    SignedIn(AuthSession),
    /// The backend requires email confirmation before sign-in.
    ConfirmationRequired { email: String },
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: UserId,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    full_name: &'a str,
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.user_metadata.full_name,
        }
    }
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));

        AuthSession {
            access_token: AccessToken(self.access_token),
            refresh_token: self.refresh_token.map(AccessToken),
            expires_at,
            user: self.user.into(),
        }
    }
}

// =============================================================================
// AuthClient
// =============================================================================

/// Client for `{SUPABASE_URL}/auth/v1`.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    auth_url: String,
    api_key: String,
    gateway: GatewayClient,
}

impl AuthClient {
    /// Create a client. Role lookups go through `gateway`.
    #[must_use]
    pub fn new(config: &SupabaseConfig, gateway: GatewayClient) -> Self {
        Self::with_http_client(config, gateway, reqwest::Client::new())
    }

    /// Create a client that shares an existing connection pool.
    #[must_use]
    pub fn with_http_client(
        config: &SupabaseConfig,
        gateway: GatewayClient,
        client: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(AuthClientInner {
                client,
                auth_url: config.auth_url(),
                api_key: config.api_key().to_string(),
                gateway,
            }),
        }
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, AuthError> {
        let response = self
            .inner
            .client
            .post(format!("{}/{path}", self.inner.auth_url))
            .header("apikey", &self.inner.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| AuthError::Api {
            status: status.as_u16(),
            message: format!("Unexpected auth response: {e}"),
        })
    }

    fn parse_token(value: serde_json::Value) -> Result<AuthSession, AuthError> {
        let token: TokenResponse = serde_json::from_value(value).map_err(|e| AuthError::Api {
            status: StatusCode::OK.as_u16(),
            message: format!("Unexpected auth response: {e}"),
        })?;
        Ok(token.into_session(Utc::now()))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for a wrong email/password.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, AuthError> {
        let value = self
            .post_json(
                "token?grant_type=password",
                &PasswordGrant {
                    email: email.as_str(),
                    password,
                },
            )
            .await?;
        let session = Self::parse_token(value)?;
        info!(user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    /// Create an account. `full_name` is stored in the user metadata.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserAlreadyExists`] if the email is taken.
    #[instrument(skip(self, password, full_name), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let value = self
            .post_json(
                "signup",
                &SignUpRequest {
                    email: email.as_str(),
                    password,
                    data: SignUpData { full_name },
                },
            )
            .await?;

        // Without auto-confirm the response is the bare user object
        if value.get("access_token").is_some() {
            let session = Self::parse_token(value)?;
            info!(user_id = %session.user.id, "User signed up");
            Ok(SignUpOutcome::SignedIn(session))
        } else {
            info!("User signed up, confirmation pending");
            Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            })
        }
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is invalid or revoked.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &AccessToken) -> Result<AuthSession, AuthError> {
        let value = self
            .post_json(
                "token?grant_type=refresh_token",
                &RefreshGrant {
                    refresh_token: refresh_token.expose(),
                },
            )
            .await?;
        Self::parse_token(value)
    }

    /// Fetch the user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn get_user(&self, token: &AccessToken) -> Result<AuthUser, AuthError> {
        let response = self
            .inner
            .client
            .get(format!("{}/user", self.inner.auth_url))
            .header("apikey", &self.inner.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose()))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status, &text));
        }

        let user: UserResponse = serde_json::from_str(&text).map_err(|e| AuthError::Api {
            status: status.as_u16(),
            message: format!("Unexpected auth response: {e}"),
        })?;
        Ok(user.into())
    }

    /// Revoke the session's tokens.
    ///
    /// A token that is already expired or revoked counts as signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth API cannot be reached.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthError> {
        let response = self
            .inner
            .client
            .post(format!("{}/logout", self.inner.auth_url))
            .header("apikey", &self.inner.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose()))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
        {
            return Ok(());
        }

        let text = response.text().await?;
        Err(classify_error(status, &text))
    }

    /// Check the `user_roles` table for an `admin` row for this user.
    ///
    /// The query runs with the user's own token, so it only succeeds when
    /// row-level policy lets the user see their own roles.
    ///
    /// # Errors
    ///
    /// Returns an error if the role lookup fails.
    #[instrument(skip_all, fields(user_id = %session.user.id))]
    pub async fn resolve_admin(
        &self,
        session: &AuthSession,
    ) -> Result<Option<AdminCapability>, AuthError> {
        let roles = self
            .inner
            .gateway
            .as_user(&session.access_token)
            .select::<UserRole>(
                &Select::new()
                    .eq("user_id", session.user.id)
                    .eq("role", AppRole::Admin),
            )
            .await?;

        if roles.is_empty() {
            debug!("User has no admin role");
            return Ok(None);
        }

        Ok(Some(AdminCapability {
            user_id: session.user.id,
        }))
    }
}

/// Map an auth API error body to an [`AuthError`].
fn classify_error(status: StatusCode, body: &str) -> AuthError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.error_code.clone());
    let message = parsed
        .and_then(|e| e.error_description.or(e.msg).or(e.message))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Authentication failed")
                .to_string()
        });

    let lower = message.to_lowercase();
    match code.as_deref() {
        Some("invalid_credentials") => return AuthError::InvalidCredentials,
        Some("user_already_exists" | "email_exists") => return AuthError::UserAlreadyExists,
        Some("weak_password") => return AuthError::WeakPassword(message),
        Some("email_address_invalid" | "validation_failed") if lower.contains("email") => {
            return AuthError::InvalidEmail;
        }
        _ => {}
    }

    if lower.contains("invalid login credentials") {
        AuthError::InvalidCredentials
    } else if lower.contains("already registered") {
        AuthError::UserAlreadyExists
    } else if lower.contains("password should be") {
        AuthError::WeakPassword(message)
    } else if lower.contains("validate email") || lower.contains("invalid email") {
        AuthError::InvalidEmail
    } else {
        warn!(status = %status, message = %message, "Auth API error");
        AuthError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_invalid_credentials() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, body),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_classify_by_error_code() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert!(matches!(
            classify_error(StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthError::UserAlreadyExists
        ));
    }

    #[test]
    fn test_classify_already_registered_message() {
        let body = r#"{"msg":"User already registered"}"#;
        assert!(matches!(
            classify_error(StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthError::UserAlreadyExists
        ));
    }

    #[test]
    fn test_classify_weak_password() {
        let body = r#"{"msg":"Password should be at least 6 characters."}"#;
        assert!(matches!(
            classify_error(StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthError::WeakPassword(_)
        ));
    }

    #[test]
    fn test_classify_invalid_email() {
        let body = r#"{"msg":"Unable to validate email address: invalid format"}"#;
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, body),
            AuthError::InvalidEmail
        ));
    }

    #[test]
    fn test_classify_unknown_falls_back_to_message() {
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, r#"{"message":"Rate limit exceeded"}"#);
        assert_eq!(err.to_string(), "Rate limit exceeded");

        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[test]
    fn test_token_response_into_session() {
        let json = serde_json::json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": {
                "id": "8f14e45f-ceea-467a-9575-2b3c1d0e5a77",
                "email": "shopper@example.com",
                "user_metadata": { "full_name": "Nguyen Van A" }
            }
        });
        let token: TokenResponse = serde_json::from_value(json).unwrap();
        let now = Utc::now();
        let session = token.into_session(now);

        assert_eq!(session.access_token.expose(), "at");
        assert_eq!(session.user.display_name(), "Nguyen Van A");
        assert_eq!(session.expires_at, Some(now + Duration::seconds(3600)));
        assert!(!session.needs_refresh(now));
        assert!(session.needs_refresh(now + Duration::seconds(3590)));
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let json = serde_json::json!({
            "id": "8f14e45f-ceea-467a-9575-2b3c1d0e5a77",
            "email": "shopper@example.com"
        });
        let user: AuthUser = serde_json::from_value::<UserResponse>(json).unwrap().into();
        assert_eq!(user.display_name(), "shopper@example.com");
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret".to_string());
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let session = AuthSession {
            access_token: AccessToken::new("at".to_string()),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: UserId::generate(),
                email: None,
                full_name: None,
            },
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: AuthSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user, session.user);
        assert!(!back.needs_refresh(Utc::now()));
    }
}
