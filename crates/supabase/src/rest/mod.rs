//! PostgREST data gateway client.
//!
//! Direct CRUD against the hosted tables. There is no retry, pagination or
//! caching at this layer; callers re-fetch after every mutation.

mod query;

pub use query::{Select, parse_content_range_total};

use std::fmt::Display;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_RANGE, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::auth::AccessToken;
use crate::config::SupabaseConfig;
use crate::error::{GatewayError, RowError};

/// A remote table and the domain type its rows decode into.
pub trait Table: Sized {
    /// Table name in the `public` schema.
    const NAME: &'static str;

    /// Wire representation of one row.
    type Row: DeserializeOwned;

    /// Validate a decoded row.
    ///
    /// # Errors
    ///
    /// Returns a [`RowError`] naming the offending field.
    fn from_row(row: Self::Row) -> Result<Self, RowError>;
}

/// Error body returned by PostgREST.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Client for `{SUPABASE_URL}/rest/v1`.
///
/// Cloning is cheap. By default requests are authorized with the API key;
/// [`GatewayClient::as_user`] returns a client that sends a signed-in user's
/// access token instead, so row-level policies apply to that user.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
    bearer: Option<AccessToken>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl GatewayClient {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Create a client that shares an existing connection pool.
    #[must_use]
    pub fn with_http_client(config: &SupabaseConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(GatewayClientInner {
                client,
                rest_url: config.rest_url(),
                api_key: config.api_key().to_string(),
            }),
            bearer: None,
        }
    }

    /// A copy of this client that authenticates as the given user.
    #[must_use]
    pub fn as_user(&self, token: &AccessToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            bearer: Some(token.clone()),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self
            .bearer
            .as_ref()
            .map_or(self.inner.api_key.as_str(), AccessToken::expose);

        self.inner
            .client
            .request(method, format!("{}/{table}", self.inner.rest_url))
            .header("apikey", &self.inner.api_key)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, table: &'static str, request: RequestBuilder) -> Result<String, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(table, status, &body));
        }

        Ok(body)
    }

    /// Decode a JSON array of rows.
    fn decode_rows<R: DeserializeOwned>(table: &'static str, body: &str) -> Result<Vec<R>, GatewayError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                table,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse gateway response"
            );
            GatewayError::Decode {
                table,
                reason: e.to_string(),
            }
        })
    }

    fn convert<T: Table>(rows: Vec<T::Row>) -> Result<Vec<T>, GatewayError> {
        rows.into_iter()
            .map(|row| T::from_row(row).map_err(|e| e.into_gateway(T::NAME)))
            .collect()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any row fails validation.
    #[instrument(skip(self, query), fields(table = T::NAME))]
    pub async fn select<T: Table>(&self, query: &Select) -> Result<Vec<T>, GatewayError> {
        let rows = self.select_as::<T::Row>(T::NAME, query).await?;
        debug!(rows = rows.len(), "Fetched rows");
        Self::convert(rows)
    }

    /// Fetch rows into an arbitrary shape, e.g. a projection of a few columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    pub async fn select_as<R: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &Select,
    ) -> Result<Vec<R>, GatewayError> {
        let request = self
            .request(Method::GET, table)
            .query(&query.to_query_pairs());
        let body = self.execute(table, request).await?;
        Self::decode_rows(table, &body)
    }

    /// Fetch the first row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if nothing matches.
    pub async fn select_one<T: Table>(&self, query: Select) -> Result<T, GatewayError> {
        self.select::<T>(&query.limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound(T::NAME))
    }

    /// Fetch one row by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the id does not exist.
    pub async fn find<T: Table>(&self, id: impl Display) -> Result<T, GatewayError> {
        self.select_one::<T>(Select::new().eq("id", id)).await
    }

    /// Count rows matching `query` without fetching them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no usable
    /// `Content-Range` header.
    #[instrument(skip(self, query), fields(table = T::NAME))]
    pub async fn count<T: Table>(&self, query: &Select) -> Result<u64, GatewayError> {
        let response = self
            .request(Method::HEAD, T::NAME)
            .header("Prefer", "count=exact")
            .query(&query.to_query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // HEAD responses carry no body
            return Err(api_error(T::NAME, status, ""));
        }

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| GatewayError::Decode {
                table: T::NAME,
                reason: "missing Content-Range total".to_string(),
            })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected or the echoed row is invalid.
    #[instrument(skip(self, row), fields(table = T::NAME))]
    pub async fn insert<T: Table, B: Serialize + Sync>(&self, row: &B) -> Result<T, GatewayError> {
        let request = self
            .request(Method::POST, T::NAME)
            .header("Prefer", "return=representation")
            .json(row);
        let body = self.execute(T::NAME, request).await?;
        Self::convert::<T>(Self::decode_rows(T::NAME, &body)?)?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound(T::NAME))
    }

    /// Insert several rows in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected. PostgREST inserts a batch
    /// atomically, so either every row is stored or none is.
    #[instrument(skip(self, rows), fields(table = T::NAME, count = rows.len()))]
    pub async fn insert_many<T: Table, B: Serialize + Sync>(
        &self,
        rows: &[B],
    ) -> Result<Vec<T>, GatewayError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .request(Method::POST, T::NAME)
            .header("Prefer", "return=representation")
            .json(rows);
        let body = self.execute(T::NAME, request).await?;
        Self::convert(Self::decode_rows(T::NAME, &body)?)
    }

    /// Patch the row with primary key `id` and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no row has that id (or row-level
    /// policy hides it).
    #[instrument(skip_all, fields(table = T::NAME, id = %id))]
    pub async fn update<T: Table, B: Serialize + Sync>(
        &self,
        id: impl Display,
        changes: &B,
    ) -> Result<T, GatewayError> {
        let request = self
            .request(Method::PATCH, T::NAME)
            .header("Prefer", "return=representation")
            .query(&Select::new().eq("id", id).filter_pairs())
            .json(changes);
        let body = self.execute(T::NAME, request).await?;
        Self::convert::<T>(Self::decode_rows(T::NAME, &body)?)?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound(T::NAME))
    }

    /// Delete the row with primary key `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected.
    #[instrument(skip_all, fields(table = T::NAME, id = %id))]
    pub async fn delete<T: Table>(&self, id: impl Display) -> Result<(), GatewayError> {
        self.delete_where::<T>(&Select::new().eq("id", id)).await
    }

    /// Delete every row matching the filters of `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected.
    pub async fn delete_where<T: Table>(&self, query: &Select) -> Result<(), GatewayError> {
        let filters = query.filter_pairs();
        if filters.is_empty() {
            // PostgREST refuses unfiltered deletes; fail locally with the same message
            return Err(GatewayError::Api {
                status: StatusCode::BAD_REQUEST.as_u16(),
                message: "DELETE requires a WHERE clause".to_string(),
            });
        }
        let request = self.request(Method::DELETE, T::NAME).query(&filters);
        self.execute(T::NAME, request).await?;
        Ok(())
    }
}

/// Build a [`GatewayError::Api`] from a non-success response.
fn api_error(table: &'static str, status: StatusCode, body: &str) -> GatewayError {
    tracing::warn!(
        table,
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Gateway returned non-success status"
    );

    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| {
            if let Some(code) = &b.code {
                debug!(code, details = ?b.details, hint = ?b.hint, "Gateway error detail");
            }
            b.message
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    GatewayError::Api {
        status: status.as_u16(),
        message,
    }
}
