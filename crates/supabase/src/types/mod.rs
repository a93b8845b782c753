//! Typed rows for the hosted tables.
//!
//! Each table has a wire struct (`*Row`) that mirrors the columns exactly and
//! a domain struct built from it through a fallible conversion. Insert and
//! update payloads are separate structs so only writable columns are sent.

mod order;
mod product;
mod profile;
mod returns;
mod review;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderItemRow, OrderRow, OrderStatusUpdate};
pub use product::{Product, ProductInput, ProductRow};
pub use profile::{NewUserRole, Profile, ProfileRow, UserRole, UserRoleRow};
pub use returns::{ReturnRequest, ReturnRow, ReturnUpdate};
pub use review::{NewReview, Review, ReviewApproval, ReviewRow};

use std::str::FromStr;

use digimart_core::Price;
use rust_decimal::Decimal;

use crate::error::RowError;

fn non_empty(field: &'static str, value: String) -> Result<String, RowError> {
    if value.trim().is_empty() {
        return Err(RowError::new(field, "must not be empty"));
    }
    Ok(value)
}

fn price(field: &'static str, value: Decimal) -> Result<Price, RowError> {
    Price::new(value).map_err(|e| RowError::new(field, e.to_string()))
}

fn optional_price(field: &'static str, value: Option<Decimal>) -> Result<Option<Price>, RowError> {
    value.map(|v| price(field, v)).transpose()
}

fn wire_enum<T>(field: &'static str, value: &str) -> Result<T, RowError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| RowError::new(field, e.to_string()))
}

fn count(field: &'static str, value: Option<i64>) -> Result<Option<u32>, RowError> {
    value
        .map(|v| u32::try_from(v).map_err(|_| RowError::new(field, format!("out of range: {v}"))))
        .transpose()
}

/// Blank strings from the database are treated as missing.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use digimart_core::OrderStatus;

    #[test]
    fn test_non_empty() {
        assert!(non_empty("name", "x".to_string()).is_ok());
        assert_eq!(
            non_empty("name", "  ".to_string()).unwrap_err().to_string(),
            "name: must not be empty"
        );
    }

    #[test]
    fn test_price_rejects_negative() {
        assert!(price("price", Decimal::from(-5)).is_err());
        assert!(optional_price("original_price", None).unwrap().is_none());
    }

    #[test]
    fn test_wire_enum() {
        let status: OrderStatus = wire_enum("status", "shipped").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        let err = wire_enum::<OrderStatus>("status", "lost").unwrap_err();
        assert_eq!(err.to_string(), "status: invalid order status: lost");
    }

    #[test]
    fn test_count() {
        assert_eq!(count("quantity", Some(3)).unwrap(), Some(3));
        assert!(count("quantity", Some(-1)).is_err());
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some(" ".to_string())), None);
        assert_eq!(blank_to_none(Some("a".to_string())), Some("a".to_string()));
    }
}
