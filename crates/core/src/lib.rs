//! DigiMart Core - Shared domain types.
//!
//! This crate provides the types used across all DigiMart components:
//! - `storefront` - Public catalog, cart and checkout
//! - `admin` - Back-office for products, orders, reviews and returns
//! - `cli` - Catalog seeding and role management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. The hosted data and auth APIs are reached through the
//! `digimart-supabase` crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`cart`] - The session-scoped cart container
//! - [`validation`] - Form checks applied before any remote call

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine, CartProduct};
pub use types::*;
