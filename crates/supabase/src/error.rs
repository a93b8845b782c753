//! Error types for the REST gateway and the auth API.

use thiserror::Error;

/// Errors from the REST data gateway.
///
/// `Display` is the human-readable message shown to users in notifications.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("Could not reach the data service: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` from the error body, or the status text.
        message: String,
    },

    /// A row failed to decode or validate.
    #[error("Invalid {table} row: {reason}")]
    Decode {
        /// Table the row came from.
        table: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A single-row lookup matched nothing.
    #[error("Not found in {0}")]
    NotFound(&'static str),
}

impl GatewayError {
    /// HTTP status reported by the gateway, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from the auth API.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This email is already registered")]
    UserAlreadyExists,

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Gateway(GatewayError::Http(e))
    }
}

/// A row value failed validation during conversion to a domain type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct RowError {
    pub field: &'static str,
    pub reason: String,
}

impl RowError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn into_gateway(self, table: &'static str) -> GatewayError {
        GatewayError::Decode {
            table,
            reason: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_message() {
        let err = GatewayError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_decode_error_names_table_and_field() {
        let err = RowError::new("price", "must not be negative").into_gateway("products");
        assert_eq!(
            err.to_string(),
            "Invalid products row: price: must not be negative"
        );
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(GatewayError::NotFound("orders").to_string(), "Not found in orders");
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        let wrapped = AuthError::from(GatewayError::NotFound("user_roles"));
        assert_eq!(wrapped.to_string(), "Not found in user_roles");
    }
}
