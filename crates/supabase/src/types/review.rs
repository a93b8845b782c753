//! `reviews` table.

use chrono::{DateTime, Utc};
use digimart_core::validation::RATING_RANGE;
use digimart_core::{ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

use super::{blank_to_none, non_empty};
use crate::error::RowError;
use crate::rest::Table;

/// A `reviews` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub user_name: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub is_approved: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A product review. New reviews wait for moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub user_name: String,
    /// `1..=5`
    pub rating: u8,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RowError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .ok()
            .filter(|r| RATING_RANGE.contains(r))
            .ok_or_else(|| RowError::new("rating", format!("out of range: {}", row.rating)))?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            user_name: non_empty("user_name", row.user_name)?,
            rating,
            comment: blank_to_none(row.comment),
            is_approved: row.is_approved.unwrap_or(false),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Table for Review {
    const NAME: &'static str = "reviews";
    type Row = ReviewRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

impl Review {
    /// Filled and empty stars, e.g. `★★★★☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating);
        let mut s = "★".repeat(filled);
        s.push_str(&"☆".repeat(5_usize.saturating_sub(filled)));
        s
    }
}

/// Insert payload for `reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub user_name: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub is_approved: bool,
}

/// Update payload for moderation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReviewApproval {
    pub is_approved: bool,
}
