//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing, status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (no scripts, no framing)
//! 5. Session layer (tower-sessions with in-memory store, SameSite=Strict)
//!
//! Authentication is an extractor ([`RequireAdmin`]) rather than a layer so
//! `/login` and `/health` stay reachable.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdmin, RequireAdmin, clear_current_admin, set_current_admin};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
