//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness check (gateway reachable)
//!
//! # Auth (email + password, admin role required)
//! GET  /login                     - Login page
//! POST /login                     - Sign in
//! POST /logout                    - Sign out
//!
//! # Dashboard
//! GET  /                          - Counts and paid revenue
//!
//! # Products
//! GET  /products                  - Product listing (?q=)
//! GET  /products/new              - Create form
//! POST /products                  - Create product
//! GET  /products/{id}/edit        - Edit form
//! POST /products/{id}             - Update product
//! POST /products/{id}/delete      - Delete product
//!
//! # Orders
//! GET  /orders                    - Order listing (?q= &status=)
//! GET  /orders/{id}               - Order detail with items
//! POST /orders/{id}/status        - Change status
//!
//! # Reviews
//! GET  /reviews                   - Review moderation (?q= &status=pending|approved|all)
//! POST /reviews/{id}/approve      - Approve
//! POST /reviews/{id}/reject       - Delete
//!
//! # Returns
//! GET  /returns                   - Return requests (?q= &status=)
//! GET  /returns/{id}              - Detail with review form
//! POST /returns/{id}              - Set status, notes and refund
//! GET  /defective                 - Returns flagged defective (?q=)
//!
//! # Users
//! GET  /users                     - Profiles with roles (?q=)
//! POST /users/{user_id}/admin     - Grant or revoke the admin role
//! ```

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod returns;
pub mod reviews;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(reviews::router())
        .merge(returns::router())
        .merge(users::router())
}
