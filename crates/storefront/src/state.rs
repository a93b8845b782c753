//! Application state shared across handlers.

use std::sync::Arc;

use digimart_supabase::{AuthClient, GatewayClient};

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the Supabase clients, the catalog cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    gateway: GatewayClient,
    auth: AuthClient,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// All clients share one HTTP connection pool.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let http = reqwest::Client::new();
        let gateway = GatewayClient::with_http_client(&config.supabase, http.clone());
        let auth = AuthClient::with_http_client(&config.supabase, gateway.clone(), http);
        let catalog = Catalog::new(gateway.clone(), config.catalog_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                auth,
                catalog,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Gateway client authorized with the anon key.
    ///
    /// Use [`GatewayClient::as_user`] for writes on behalf of a signed-in user.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    /// Get a reference to the auth client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the cached catalog reader.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
