//! `returns` table.

use chrono::{DateTime, Utc};
use digimart_core::{OrderId, OrderItemId, Price, ReturnId, ReturnStatus, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{blank_to_none, non_empty, optional_price, wire_enum};
use crate::error::RowError;
use crate::rest::Table;

/// A `returns` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRow {
    pub id: ReturnId,
    pub order_id: OrderId,
    pub order_item_id: Option<OrderItemId>,
    pub user_id: Option<UserId>,
    pub reason: String,
    pub status: String,
    pub is_defective: Option<bool>,
    pub refund_amount: Option<Decimal>,
    pub admin_notes: Option<String>,
    pub images: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A return / refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnRequest {
    pub id: ReturnId,
    pub order_id: OrderId,
    pub order_item_id: Option<OrderItemId>,
    pub user_id: Option<UserId>,
    pub reason: String,
    pub status: ReturnStatus,
    pub is_defective: bool,
    pub refund_amount: Option<Price>,
    pub admin_notes: Option<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReturnRow> for ReturnRequest {
    type Error = RowError;

    fn try_from(row: ReturnRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            order_item_id: row.order_item_id,
            user_id: row.user_id,
            reason: non_empty("reason", row.reason)?,
            status: wire_enum("status", &row.status)?,
            is_defective: row.is_defective.unwrap_or(false),
            refund_amount: optional_price("refund_amount", row.refund_amount)?,
            admin_notes: blank_to_none(row.admin_notes),
            images: row.images.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Table for ReturnRequest {
    const NAME: &'static str = "returns";
    type Row = ReturnRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

/// Admin decision on a return.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnUpdate {
    pub status: ReturnStatus,
    pub admin_notes: Option<String>,
    pub refund_amount: Option<Price>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn return_json() -> serde_json::Value {
        serde_json::json!({
            "id": "3c2b1a09-8f7e-4d6c-9b5a-493827160514",
            "order_id": "0b6f3f5e-8d8a-4a51-9a6e-3c1b2f1d9c11",
            "order_item_id": null,
            "user_id": null,
            "reason": "Left earcup crackles at high volume",
            "status": "requested",
            "is_defective": true,
            "refund_amount": null,
            "admin_notes": null,
            "images": null,
            "created_at": "2025-03-01T09:00:00+00:00",
            "updated_at": "2025-03-01T09:00:00+00:00"
        })
    }

    #[test]
    fn test_decode_return() {
        let r = ReturnRequest::try_from(serde_json::from_value::<ReturnRow>(return_json()).unwrap())
            .unwrap();
        assert_eq!(r.status, ReturnStatus::Requested);
        assert!(r.is_defective);
        assert!(r.images.is_empty());
    }

    #[test]
    fn test_negative_refund_rejected() {
        let mut json = return_json();
        json["refund_amount"] = serde_json::json!(-100);
        let err = ReturnRequest::try_from(serde_json::from_value::<ReturnRow>(json).unwrap())
            .unwrap_err();
        assert_eq!(err.field, "refund_amount");
    }

    #[test]
    fn test_update_clears_refund_with_null() {
        let update = ReturnUpdate {
            status: ReturnStatus::Rejected,
            admin_notes: Some("Outside the return window".to_string()),
            refund_amount: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "rejected");
        assert!(json["refund_amount"].is_null());
    }
}
