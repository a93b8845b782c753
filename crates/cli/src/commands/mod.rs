//! Subcommand implementations.

pub mod roles;
pub mod seed;

use digimart_supabase::{ConfigError, GatewayClient, SupabaseConfig};

/// Environment variable holding the service-role key.
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Gateway client authenticated with the service-role key.
///
/// # Errors
///
/// Returns an error if `SUPABASE_URL` or the service key is missing.
pub fn service_gateway() -> Result<GatewayClient, ConfigError> {
    digimart_supabase::config::load_dotenv();
    let config = SupabaseConfig::from_env_with_key(SERVICE_KEY_VAR)?;
    Ok(GatewayClient::new(&config))
}
