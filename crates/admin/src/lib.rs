//! DigiMart admin library.
//!
//! This crate provides the back office as a library, allowing it to be
//! tested and reused.
//!
//! # Security
//!
//! The admin binary holds no service-role key. Each request acts with the
//! signed-in admin's own access token, and every page except `/login` and
//! `/health*` requires an [`AdminCapability`](digimart_supabase::AdminCapability)
//! minted at sign-in.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod views;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::from_fn,
    routing::get,
};
use digimart_supabase::Select;
use digimart_supabase::types::Product;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing::field::Empty;

use crate::state::AppState;

/// Directory with the compiled-in static assets.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full admin router with all middleware.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .with_state(state)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = Empty,
                        admin_id = Empty,
                        status = Empty,
                        latency_ms = Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the gateway is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.gateway().count::<Product>(&Select::new()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app(AppState::new(AdminConfig::for_tests()));
        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_pages_require_admin() {
        for uri in ["/", "/products", "/orders", "/reviews", "/returns", "/defective", "/users"] {
            let app = app(AppState::new(AdminConfig::for_tests()));
            let response = app.oneshot(get(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()["location"], "/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let app = app(AppState::new(AdminConfig::for_tests()));
        let response = app.oneshot(get("/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mutations_require_admin() {
        let app = app(AppState::new(AdminConfig::for_tests()));
        let request = Request::builder()
            .method("POST")
            .uri("/users/8f14e45f-ceea-467a-9575-2b3c1d0e5a77/admin")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
