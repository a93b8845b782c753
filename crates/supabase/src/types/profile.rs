//! `profiles` and `user_roles` tables.

use chrono::{DateTime, Utc};
use digimart_core::{AppRole, ProfileId, UserId, UserRoleId};
use serde::{Deserialize, Serialize};

use super::{blank_to_none, wire_enum};
use crate::error::RowError;
use crate::rest::Table;

/// A `profiles` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub id: ProfileId,
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Public profile data for a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RowError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            full_name: blank_to_none(row.full_name),
            email: blank_to_none(row.email),
            phone: blank_to_none(row.phone),
            address: blank_to_none(row.address),
            avatar_url: blank_to_none(row.avatar_url),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Table for Profile {
    const NAME: &'static str = "profiles";
    type Row = ProfileRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

/// A `user_roles` row as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleRow {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A role grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRole {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role: AppRole,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRoleRow> for UserRole {
    type Error = RowError;

    fn try_from(row: UserRoleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            role: wire_enum("role", &row.role)?,
            created_at: row.created_at,
        })
    }
}

impl Table for UserRole {
    const NAME: &'static str = "user_roles";
    type Row = UserRoleRow;

    fn from_row(row: Self::Row) -> Result<Self, RowError> {
        Self::try_from(row)
    }
}

/// Insert payload for `user_roles`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NewUserRole {
    pub user_id: UserId,
    pub role: AppRole,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_role() {
        let json = serde_json::json!({
            "id": "1f0e2d3c-4b5a-4968-8776-655443322110",
            "user_id": "8f14e45f-ceea-467a-9575-2b3c1d0e5a77",
            "role": "moderator",
            "created_at": "2025-01-01T00:00:00+00:00"
        });
        let role = UserRole::try_from(serde_json::from_value::<UserRoleRow>(json).unwrap()).unwrap();
        assert_eq!(role.role, AppRole::Moderator);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = serde_json::json!({
            "id": "1f0e2d3c-4b5a-4968-8776-655443322110",
            "user_id": "8f14e45f-ceea-467a-9575-2b3c1d0e5a77",
            "role": "owner",
            "created_at": "2025-01-01T00:00:00+00:00"
        });
        let err = UserRole::try_from(serde_json::from_value::<UserRoleRow>(json).unwrap()).unwrap_err();
        assert_eq!(err.field, "role");
    }

    #[test]
    fn test_profile_blank_fields() {
        let json = serde_json::json!({
            "id": "2a3b4c5d-6e7f-4081-9a2b-3c4d5e6f7081",
            "user_id": "8f14e45f-ceea-467a-9575-2b3c1d0e5a77",
            "full_name": "",
            "email": "b@example.com",
            "phone": null,
            "address": null,
            "avatar_url": null,
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": "2025-01-01T00:00:00+00:00"
        });
        let profile = Profile::try_from(serde_json::from_value::<ProfileRow>(json).unwrap()).unwrap();
        assert_eq!(profile.full_name, None);
        assert_eq!(profile.email.as_deref(), Some("b@example.com"));
    }
}
