//! Environment configuration shared by every DigiMart binary.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Project URL (e.g., `https://abcd.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public anon key, sent as `apikey` on every request
//!
//! The CLI uses `SUPABASE_SERVICE_ROLE_KEY` in place of the anon key.
//!
//! The helper functions are public so each binary's own config module can
//! read its variables with the same error type and secret checks.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Connection settings for a Supabase project.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project base URL, without a trailing path
    pub url: Url,
    /// Key sent as `apikey` (anon key for the web apps, service role for the CLI)
    pub api_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseConfig {
    /// Load `SUPABASE_URL` and the anon key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if either variable is missing, the URL does not
    /// parse, or the key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_key("SUPABASE_ANON_KEY")
    }

    /// Load `SUPABASE_URL` and the key stored in `key_var`.
    ///
    /// # Errors
    ///
    /// Same as [`SupabaseConfig::from_env`].
    pub fn from_env_with_key(key_var: &str) -> Result<Self, ConfigError> {
        let url = get_required_url("SUPABASE_URL")?;
        let api_key = get_validated_secret(key_var)?;
        Ok(Self { url, api_key })
    }

    /// `{url}/rest/v1/`
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url.as_str().trim_end_matches('/'))
    }

    /// `{url}/auth/v1/`
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url.as_str().trim_end_matches('/'))
    }

    /// The API key as a plain string for request headers.
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Load a `.env` file if present.
pub fn load_dotenv() {
    // Missing file is the normal case in production
    let _ = dotenvy::dotenv();
}

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` when the value does not parse.
pub fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required absolute `http(s)` URL.
///
/// # Errors
///
/// Returns `ConfigError` if missing or not an http(s) URL.
pub fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(key)?;
    parse_http_url(key, &raw)
}

fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the project settings."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
///
/// # Errors
///
/// Returns `ConfigError` if missing, a placeholder, or low entropy.
pub fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
