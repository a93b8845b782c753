//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (gateway reachable)
//!
//! # Products
//! GET  /products               - Catalog (?type= &category= &sort=)
//! GET  /product/{id}           - Product detail
//! POST /product/{id}/reviews   - Submit a review (requires auth)
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Update quantity
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty the cart
//!
//! # Checkout
//! GET  /checkout               - Checkout form
//! POST /checkout               - Place order
//!
//! # Auth
//! GET  /auth                   - Sign-in / sign-up page
//! POST /auth/login             - Sign in
//! POST /auth/register          - Sign up
//! POST /auth/logout            - Sign out
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Credential posts get the strict rate limit.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/", get(auth::page))
        .route("/logout", post(auth::logout))
        .merge(credentials)
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .layer(form_rate_limiter());

    Router::new().route("/", get(cart::show)).merge(mutations)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        .route(
            "/product/{id}/reviews",
            post(products::submit_review).layer(form_rate_limiter()),
        )
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::submit).layer(form_rate_limiter())),
        )
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
}
