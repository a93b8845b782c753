//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_ANON_KEY` - Supabase anon key (validated for placeholders and entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `ADMIN_BASE_URL` - Back-office URL, linked from the header for admins
//! - `CHECKOUT_SIMULATED_DELAY_MS` - Simulated payment processing time (default: 2000)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: development)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Back-office URL shown to admins
    pub admin_base_url: Option<Url>,
    /// How long checkout pretends to talk to a payment provider
    pub checkout_delay: Duration,
    /// Catalog cache time-to-live
    pub catalog_ttl: Duration,
    /// Supabase project settings
    pub supabase: SupabaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: String,
    pub log_format: LogFormat,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file first if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Supabase key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let host = get_parsed_env::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_url("STOREFRONT_BASE_URL")?;
        let admin_base_url = match get_optional_env("ADMIN_BASE_URL") {
            Some(_) => Some(get_required_url("ADMIN_BASE_URL")?),
            None => None,
        };
        let checkout_delay =
            Duration::from_millis(get_parsed_env::<u64>("CHECKOUT_SIMULATED_DELAY_MS", "2000")?);
        let catalog_ttl =
            Duration::from_secs(get_parsed_env::<u64>("CATALOG_CACHE_TTL_SECS", "60")?);

        let supabase = SupabaseConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            admin_base_url,
            checkout_delay,
            catalog_ttl,
            supabase,
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

    /// Local settings with no payment delay.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").expect("static url"),
            admin_base_url: None,
            checkout_delay: Duration::ZERO,
            catalog_ttl: Duration::from_secs(60),
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
        let addr = StorefrontConfig::for_tests().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_https() {
        let mut config = StorefrontConfig::for_tests();
        assert!(!config.is_https());
        config.base_url = Url::parse("https://shop.digimart.vn").unwrap();
        assert!(config.is_https());
    }

    #[test]
    fn test_debug_redacts_supabase_key() {
        let output = format!("{:?}", StorefrontConfig::for_tests());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("anon-key-for-tests"));
    }
}
