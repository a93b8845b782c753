//! Application state shared across handlers.

use std::sync::Arc;

use digimart_supabase::{AuthClient, GatewayClient};

use crate::config::AdminConfig;
use crate::models::CurrentAdmin;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    gateway: GatewayClient,
    auth: AuthClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        let http = reqwest::Client::new();
        let gateway = GatewayClient::with_http_client(&config.supabase, http.clone());
        let auth = AuthClient::with_http_client(&config.supabase, gateway.clone(), http);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                auth,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Gateway client authorized with the anon key only.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    /// Gateway client acting as the signed-in admin.
    #[must_use]
    pub fn gateway_for(&self, admin: &CurrentAdmin) -> GatewayClient {
        self.inner.gateway.as_user(&admin.auth.access_token)
    }

    /// Get a reference to the auth client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }
}
