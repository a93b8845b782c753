//! `orders` and `order_items` tables.

use chrono::{DateTime, Utc};
use digimart_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId,
    ProductType, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{blank_to_none, count, non_empty, price, wire_enum};
use crate::error::RowError;
use crate::rest::Table;

/// An `orders` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub status: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    /// Free text on the wire; see [`Order::payment_method_label`].
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RowError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: blank_to_none(row.customer_phone),
            shipping_address: blank_to_none(row.shipping_address),
            notes: blank_to_none(row.notes),
            payment_method: blank_to_none(row.payment_method),
            payment_status: blank_to_none(row.payment_status),
            status: wire_enum("status", &row.status)?,
            total_amount: price("total_amount", row.total_amount)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Table for Order {
    const NAME: &'static str = "orders";
    type Row = OrderRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

impl Order {
    /// Known payment methods by label, anything else verbatim.
    #[must_use]
    pub fn payment_method_label(&self) -> String {
        self.payment_method.as_deref().map_or_else(
            || "-".to_string(),
            |m| {
                m.parse::<PaymentMethod>()
                    .map_or_else(|_| m.to_string(), |pm| pm.label().to_string())
            },
        )
    }

    /// Known payment statuses by label, anything else verbatim.
    #[must_use]
    pub fn payment_status_label(&self) -> String {
        self.payment_status.as_deref().map_or_else(
            || "-".to_string(),
            |s| {
                s.parse::<PaymentStatus>()
                    .map_or_else(|_| s.to_string(), |ps| ps.label().to_string())
            },
        )
    }

    /// Whether the order counts toward revenue.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some(PaymentStatus::Paid.as_str())
    }
}

/// An `order_items` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub product_type: String,
    pub price: Decimal,
    pub quantity: i64,
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One line of a placed order, snapshotted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub product_type: ProductType,
    pub price: Price,
    pub quantity: u32,
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RowError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = count("quantity", Some(row.quantity))?.unwrap_or(0);
        if quantity < 1 {
            return Err(RowError::new("quantity", "must be at least 1"));
        }

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: non_empty("product_name", row.product_name)?,
            product_image: blank_to_none(row.product_image),
            product_type: wire_enum("product_type", &row.product_type)?,
            price: price("price", row.price)?,
            quantity,
            download_url: blank_to_none(row.download_url),
            created_at: row.created_at,
        })
    }
}

impl Table for OrderItem {
    const NAME: &'static str = "order_items";
    type Row = OrderItemRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

impl OrderItem {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Insert payload for `orders`.
///
/// The id is generated before the insert so a retried request conflicts on
/// the primary key instead of creating a second order.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub total_amount: Price,
}

/// Insert payload for `order_items`.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub product_type: ProductType,
    pub price: Price,
    pub quantity: u32,
    pub download_url: Option<String>,
}

/// Update payload for an order's status.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "id": "0b6f3f5e-8d8a-4a51-9a6e-3c1b2f1d9c11",
            "user_id": null,
            "customer_name": "Nguyen Van A",
            "customer_email": "a@example.com",
            "customer_phone": "0901234567",
            "shipping_address": "",
            "notes": null,
            "payment_method": "momo",
            "payment_status": "paid",
            "status": "processing",
            "total_amount": 598000,
            "created_at": "2025-02-01T10:00:00+00:00",
            "updated_at": "2025-02-01T10:00:00+00:00"
        })
    }

    fn item_json() -> serde_json::Value {
        serde_json::json!({
            "id": "9a1b3c5d-7e9f-4a1b-8c3d-5e7f9a1b3c5d",
            "order_id": "0b6f3f5e-8d8a-4a51-9a6e-3c1b2f1d9c11",
            "product_id": null,
            "product_name": "Premium UI Kit Collection",
            "product_image": null,
            "product_type": "digital",
            "price": 299000,
            "quantity": 2,
            "download_url": null,
            "created_at": "2025-02-01T10:00:00+00:00"
        })
    }

    #[test]
    fn test_decode_order() {
        let row: OrderRow = serde_json::from_value(order_json()).unwrap();
        let order = Order::try_from(row).unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.shipping_address, None);
        assert_eq!(order.payment_method_label(), "MoMo");
        assert!(order.is_paid());
    }

    #[test]
    fn test_unknown_payment_values_shown_verbatim() {
        let mut json = order_json();
        json["payment_method"] = serde_json::json!("bank_transfer");
        json["payment_status"] = serde_json::json!("refunded");
        let order = Order::try_from(serde_json::from_value::<OrderRow>(json).unwrap()).unwrap();
        assert_eq!(order.payment_method_label(), "bank_transfer");
        assert_eq!(order.payment_status_label(), "refunded");
        assert!(!order.is_paid());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut json = order_json();
        json["status"] = serde_json::json!("lost");
        let err = Order::try_from(serde_json::from_value::<OrderRow>(json).unwrap()).unwrap_err();
        assert_eq!(err.field, "status");
    }

    #[test]
    fn test_decode_item_and_total() {
        let item =
            OrderItem::try_from(serde_json::from_value::<OrderItemRow>(item_json()).unwrap())
                .unwrap();
        assert_eq!(item.line_total(), Price::from_dong(598_000));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut json = item_json();
        json["quantity"] = serde_json::json!(0);
        let err = OrderItem::try_from(serde_json::from_value::<OrderItemRow>(json).unwrap())
            .unwrap_err();
        assert_eq!(err.field, "quantity");
    }

    #[test]
    fn test_new_order_wire_shape() {
        let order = NewOrder {
            id: OrderId::generate(),
            user_id: None,
            customer_name: "A".to_string(),
            customer_email: "a@example.com".to_string(),
            customer_phone: None,
            shipping_address: None,
            notes: None,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Paid,
            status: OrderStatus::Pending,
            total_amount: Price::from_dong(100_000),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["payment_method"], "card");
        assert_eq!(json["payment_status"], "paid");
        assert_eq!(json["status"], "pending");
    }
}
