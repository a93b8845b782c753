//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the back office
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_ANON_KEY` - Supabase anon key (validated for placeholders and entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `STOREFRONT_BASE_URL` - Shop URL, linked from the sidebar
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: development)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! The admin binary never holds the service-role key. Every gateway call is
//! made with the signed-in admin's own access token, so row-level policy
//! decides what an admin may read and write.

use std::net::{IpAddr, SocketAddr};

use digimart_supabase::SupabaseConfig;
use digimart_supabase::config::{
    get_env_or_default, get_optional_env, get_parsed_env, get_required_url, load_dotenv,
};
use url::Url;

pub use digimart_supabase::ConfigError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match get_optional_env("LOG_FORMAT").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the back office
    pub base_url: Url,
    /// Shop URL for the "View shop" link
    pub storefront_url: Option<Url>,
    /// Supabase project settings
    pub supabase: SupabaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: String,
    pub log_format: LogFormat,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file first if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let storefront_url = match get_optional_env("STOREFRONT_BASE_URL") {
            Some(_) => Some(get_required_url("STOREFRONT_BASE_URL")?),
            None => None,
        };

        Ok(Self {
            host: get_parsed_env::<IpAddr>("ADMIN_HOST", "127.0.0.1")?,
            port: get_parsed_env::<u16>("ADMIN_PORT", "3001")?,
            base_url: get_required_url("ADMIN_BASE_URL")?,
            storefront_url,
            supabase: SupabaseConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_env_or_default("SENTRY_ENVIRONMENT", "development"),
            log_format: LogFormat::from_env(),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: Url::parse("http://localhost:3001").expect("static url"),
            storefront_url: None,
            supabase: SupabaseConfig {
                url: Url::parse("https://abcd.supabase.co").expect("static url"),
                api_key: secrecy::SecretString::from("anon-key-for-tests"),
            },
            sentry_dsn: None,
            sentry_environment: "test".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let addr = AdminConfig::for_tests().socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        let mut config = AdminConfig::for_tests();
        assert!(!config.is_https());
        config.base_url = Url::parse("https://admin.digimart.vn").unwrap();
        assert!(config.is_https());
    }
}
