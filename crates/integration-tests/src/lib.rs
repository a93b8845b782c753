//! Integration tests for DigiMart.
//!
//! # Running Tests
//!
//! ```bash
//! # Start both binaries against a test project
//! cargo run -p digimart-storefront &
//! cargo run -p digimart-admin &
//!
//! # Run the live tests
//! cargo test -p digimart-integration-tests -- --ignored
//! ```
//!
//! Tests that talk to running servers are `#[ignore]`d so the default test
//! run stays offline.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - defaults to `http://localhost:3000`
//! - `ADMIN_TEST_URL` - defaults to `http://localhost:3001`

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::redirect::Policy;
use reqwest::{Client, Response};

/// Shared setup for live tests.
///
/// Each context owns its own cookie jar, so one context is one browser
/// session.
pub struct TestContext {
    pub client: Client,
    pub storefront_url: String,
    pub admin_url: String,
}

impl TestContext {
    /// Build a context from the environment.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        dotenvy::dotenv().ok();

        // Redirects are asserted on, never followed
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            storefront_url: env_url("STOREFRONT_TEST_URL", "http://localhost:3000"),
            admin_url: env_url("ADMIN_TEST_URL", "http://localhost:3001"),
        }
    }

    /// GET a storefront path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn storefront_get(&self, path: &str) -> reqwest::Result<Response> {
        self.client
            .get(format!("{}{path}", self.storefront_url))
            .send()
            .await
    }

    /// POST a form to a storefront path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn storefront_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Result<Response> {
        self.client
            .post(format!("{}{path}", self.storefront_url))
            .form(form)
            .send()
            .await
    }

    /// GET an admin path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn admin_get(&self, path: &str) -> reqwest::Result<Response> {
        self.client
            .get(format!("{}{path}", self.admin_url))
            .send()
            .await
    }

    /// POST a form to an admin path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn admin_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Result<Response> {
        self.client
            .post(format!("{}{path}", self.admin_url))
            .form(form)
            .send()
            .await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn env_url(var: &str, default: &str) -> String {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Product ids linked from a rendered page, in page order.
///
/// Looks for `/product/{uuid}` links.
#[must_use]
pub fn product_ids(html: &str) -> Vec<uuid::Uuid> {
    const PREFIX: &str = "/product/";
    const UUID_LEN: usize = 36;

    html.match_indices(PREFIX)
        .filter_map(|(i, _)| {
            let start = i + PREFIX.len();
            html.get(start..start + UUID_LEN)
        })
        .filter_map(|candidate| candidate.parse().ok())
        .fold(Vec::new(), |mut ids, id| {
            if !ids.contains(&id) {
                ids.push(id);
            }
            ids
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ids_dedupes_in_order() {
        let html = r#"
            <a href="/product/5b0c3a7e-2f4e-4c1b-9d8a-1e2f3a4b5c6d">A</a>
            <a href="/product/5b0c3a7e-2f4e-4c1b-9d8a-1e2f3a4b5c6d/reviews">A</a>
            <a href="/product/0f9e8d7c-6b5a-4c3d-8e1f-a2b3c4d5e6f7">B</a>
            <a href="/products?type=digital">All</a>
        "#;
        let ids = product_ids(html);
        assert_eq!(ids.len(), 2);
        assert_eq!(
            ids.first().unwrap().to_string(),
            "5b0c3a7e-2f4e-4c1b-9d8a-1e2f3a4b5c6d"
        );
    }

    #[test]
    fn test_env_url_trims_slash() {
        assert_eq!(
            env_url("DIGIMART_UNSET_TEST_VAR", "http://localhost:3000/"),
            "http://localhost:3000"
        );
    }
}
