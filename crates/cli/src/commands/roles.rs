//! Role management commands.
//!
//! # Usage
//!
//! ```bash
//! dm-cli roles grant --user-id 6f1c... --role admin
//! dm-cli roles revoke --user-id 6f1c... --role moderator
//! ```
//!
//! Both commands are idempotent: granting an existing role or revoking a
//! missing one succeeds without changes.

use digimart_core::{AppRole, UserId};
use digimart_supabase::types::{NewUserRole, UserRole};
use digimart_supabase::{ConfigError, GatewayClient, GatewayError, Select};
use thiserror::Error;

use super::service_gateway;

/// Errors that can occur during role operations.
#[derive(Debug, Error)]
pub enum RoleError {
    /// Missing environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Gateway request failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Filter matching one user's grant of one role.
fn grant_filter(user_id: UserId, role: AppRole) -> Select {
    Select::new().eq("user_id", user_id).eq("role", role)
}

async fn has_role(gateway: &GatewayClient, user_id: UserId, role: AppRole) -> Result<bool, GatewayError> {
    let count = gateway
        .count::<UserRole>(&grant_filter(user_id, role))
        .await?;
    Ok(count > 0)
}

/// Grant `role` to the user.
///
/// # Errors
///
/// Returns an error if the environment is not configured or the gateway
/// rejects the request (for example an unknown user id).
pub async fn grant(user_id: UserId, role: AppRole) -> Result<(), RoleError> {
    let gateway = service_gateway()?;

    if has_role(&gateway, user_id, role).await? {
        tracing::info!(%user_id, %role, "User already has this role");
        return Ok(());
    }

    let grant: UserRole = gateway.insert(&NewUserRole { user_id, role }).await?;
    tracing::info!(%user_id, %role, grant_id = %grant.id, "Role granted");
    Ok(())
}

/// Revoke `role` from the user.
///
/// # Errors
///
/// Returns an error if the environment is not configured or the gateway
/// rejects the request.
pub async fn revoke(user_id: UserId, role: AppRole) -> Result<(), RoleError> {
    let gateway = service_gateway()?;

    if !has_role(&gateway, user_id, role).await? {
        tracing::info!(%user_id, %role, "User does not have this role");
        return Ok(());
    }

    gateway
        .delete_where::<UserRole>(&grant_filter(user_id, role))
        .await?;
    tracing::info!(%user_id, %role, "Role revoked");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_filter_targets_one_role() {
        let user_id: UserId = "8b7e3f2a-1c4d-4e5f-9a6b-7c8d9e0f1a2b".parse().unwrap();
        let pairs = grant_filter(user_id, AppRole::Moderator).filter_pairs();

        assert_eq!(
            pairs,
            vec![
                (
                    "user_id".to_string(),
                    "eq.8b7e3f2a-1c4d-4e5f-9a6b-7c8d9e0f1a2b".to_string()
                ),
                ("role".to_string(), "eq.moderator".to_string()),
            ]
        );
    }
}
