//! DigiMart Supabase - clients for the hosted data and auth APIs.
//!
//! # Architecture
//!
//! - The hosted database is the source of truth; there is no local sync
//! - [`rest::GatewayClient`] speaks PostgREST (`/rest/v1`) for table CRUD
//! - [`auth::AuthClient`] speaks GoTrue (`/auth/v1`) for sessions
//! - [`types`] holds one wire struct and one validated domain struct per table
//!
//! # Example
//!
//! ```rust,ignore
//! use digimart_supabase::{GatewayClient, SupabaseConfig, rest::Select, types::Product};
//!
//! let config = SupabaseConfig::from_env()?;
//! let gateway = GatewayClient::new(&config);
//!
//! let featured: Vec<Product> = gateway
//!     .select(&Select::newest().eq("featured", true))
//!     .await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod rest;
pub mod types;

pub use auth::{AccessToken, AdminCapability, AuthClient, AuthSession, AuthUser, SignUpOutcome};
pub use config::{ConfigError, SupabaseConfig};
pub use error::{AuthError, GatewayError, RowError};
pub use rest::{GatewayClient, Select, Table};
