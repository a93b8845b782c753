//! `products` table.

use chrono::{DateTime, Utc};
use digimart_core::{CartProduct, Price, ProductId, ProductType, discount_percent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{blank_to_none, count, non_empty, optional_price, price, wire_enum};
use crate::error::RowError;
use crate::rest::Table;

/// Highest rating a product can carry.
const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// A `products` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: String,
    pub category: String,
    pub rating: Option<Decimal>,
    pub reviews_count: Option<i64>,
    pub in_stock: Option<bool>,
    pub stock_quantity: Option<i64>,
    pub featured: Option<bool>,
    pub download_url: Option<String>,
    pub file_size: Option<String>,
    pub file_format: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub image: String,
    pub product_type: ProductType,
    pub category: String,
    /// Average rating in `0..=5`.
    pub rating: Decimal,
    pub reviews_count: u32,
    pub in_stock: bool,
    pub stock_quantity: Option<u32>,
    pub featured: bool,
    pub download_url: Option<String>,
    pub file_size: Option<String>,
    pub file_format: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RowError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let rating = row.rating.unwrap_or_default();
        if rating < Decimal::ZERO || rating > MAX_RATING {
            return Err(RowError::new("rating", format!("out of range: {rating}")));
        }

        Ok(Self {
            id: row.id,
            name: non_empty("name", row.name)?,
            description: row.description.unwrap_or_default(),
            price: price("price", row.price)?,
            original_price: optional_price("original_price", row.original_price)?,
            image: row.image.unwrap_or_default(),
            product_type: wire_enum("type", &row.product_type)?,
            category: non_empty("category", row.category)?,
            rating,
            reviews_count: count("reviews_count", row.reviews_count)?.unwrap_or(0),
            in_stock: row.in_stock.unwrap_or(true),
            stock_quantity: count("stock_quantity", row.stock_quantity)?,
            featured: row.featured.unwrap_or(false),
            download_url: blank_to_none(row.download_url),
            file_size: blank_to_none(row.file_size),
            file_format: blank_to_none(row.file_format),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Table for Product {
    const NAME: &'static str = "products";
    type Row = ProductRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

impl Product {
    /// Percent saved against the original price, when there is one.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.original_price
            .and_then(|original| discount_percent(self.price, original))
    }

    #[must_use]
    pub const fn is_digital(&self) -> bool {
        matches!(self.product_type, ProductType::Digital)
    }

    /// Whether any digital-file metadata is present.
    #[must_use]
    pub const fn has_file_info(&self) -> bool {
        self.file_size.is_some() || self.file_format.is_some()
    }

    /// Snapshot for adding to the cart.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            product_id: self.id,
            name: self.name.clone(),
            unit_price: self.price,
            original_unit_price: self.original_price,
            image: self.image.clone(),
            product_type: self.product_type,
        }
    }
}

/// Writable product columns for insert and update.
///
/// Also the shape of entries in the CLI seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub category: String,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub file_format: Option<String>,
    /// Only set by seeding; admin edits leave the stored value alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u32>,
}

const fn default_true() -> bool {
    true
}

impl From<&Product> for ProductInput {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            description: Some(p.description.clone()).filter(|d| !d.is_empty()),
            price: p.price,
            original_price: p.original_price,
            image: Some(p.image.clone()).filter(|i| !i.is_empty()),
            product_type: p.product_type,
            category: p.category.clone(),
            in_stock: p.in_stock,
            stock_quantity: p.stock_quantity,
            featured: p.featured,
            download_url: p.download_url.clone(),
            file_size: p.file_size.clone(),
            file_format: p.file_format.clone(),
            rating: None,
            reviews_count: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row_json() -> serde_json::Value {
        serde_json::json!({
            "id": "5d0c6f3a-1d7e-4b55-8d0f-0e7a4a3e9b11",
            "name": "Premium UI Kit Collection",
            "description": "500+ UI components for Figma and Sketch.",
            "price": 299000,
            "original_price": 499000,
            "image": "https://images.unsplash.com/photo-1561070791-2526d30994b5?w=600",
            "type": "digital",
            "category": "design",
            "rating": 4.9,
            "reviews_count": 234,
            "in_stock": true,
            "stock_quantity": null,
            "featured": true,
            "download_url": null,
            "file_size": "2.5 GB",
            "file_format": "Figma, Sketch, XD",
            "created_at": "2025-01-15T08:30:00.123456+00:00",
            "updated_at": "2025-01-15T08:30:00+00:00"
        })
    }

    fn decode(json: serde_json::Value) -> Result<Product, RowError> {
        let row: ProductRow = serde_json::from_value(json).unwrap();
        Product::try_from(row)
    }

    #[test]
    fn test_decode_valid_row() {
        let product = decode(row_json()).unwrap();
        assert_eq!(product.price, Price::from_dong(299_000));
        assert_eq!(product.product_type, ProductType::Digital);
        assert_eq!(product.discount_percent(), Some(40));
        assert!(product.is_digital());
        assert!(product.has_file_info());
        assert_eq!(product.rating.to_string(), "4.9");
    }

    #[test]
    fn test_nullable_columns_default() {
        let mut json = row_json();
        json["in_stock"] = serde_json::Value::Null;
        json["featured"] = serde_json::Value::Null;
        json["reviews_count"] = serde_json::Value::Null;
        json["description"] = serde_json::Value::Null;
        let product = decode(json).unwrap();
        assert!(product.in_stock);
        assert!(!product.featured);
        assert_eq!(product.reviews_count, 0);
        assert_eq!(product.description, "");
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut json = row_json();
        json["price"] = serde_json::json!(-1);
        assert_eq!(decode(json).unwrap_err().field, "price");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut json = row_json();
        json["name"] = serde_json::json!("");
        assert_eq!(decode(json).unwrap_err().field, "name");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut json = row_json();
        json["type"] = serde_json::json!("service");
        assert_eq!(decode(json).unwrap_err().field, "type");
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut json = row_json();
        json["rating"] = serde_json::json!(7.5);
        assert_eq!(decode(json).unwrap_err().field, "rating");
    }

    #[test]
    fn test_cart_product_snapshot() {
        let product = decode(row_json()).unwrap();
        let snapshot = product.to_cart_product();
        assert_eq!(snapshot.product_id, product.id);
        assert_eq!(snapshot.original_unit_price, Some(Price::from_dong(499_000)));
    }

    #[test]
    fn test_input_serializes_type_column() {
        let product = decode(row_json()).unwrap();
        let input = ProductInput::from(&product);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["type"], "digital");
        assert!(json.get("rating").is_none());
    }

    #[test]
    fn test_input_from_seed_yaml_shape() {
        let json = serde_json::json!({
            "name": "Wireless Headphones",
            "price": 1290000,
            "type": "physical",
            "category": "electronics"
        });
        let input: ProductInput = serde_json::from_value(json).unwrap();
        assert!(input.in_stock);
        assert!(!input.featured);
        assert_eq!(input.price, Price::from_dong(1_290_000));
    }
}
