//! Core types for DigiMart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use category::Category;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError, discount_percent};
pub use status::*;
