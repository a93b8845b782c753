//! User and role management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use digimart_core::{AppRole, UserId};
use digimart_supabase::types::{NewUserRole, Profile, UserRole};
use digimart_supabase::{GatewayClient, GatewayError, Select};
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{ListQuery, matches_search};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::views::{PageContext, UserView};

/// Users list template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub page: PageContext,
    pub users: Vec<UserView>,
    pub q: String,
    /// The signed-in admin, whose own toggle is hidden.
    pub self_id: String,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/{user_id}/admin", post(toggle_admin))
}

/// Merge profiles with roles and keep those matching email or name.
fn merge_users(profiles: &[Profile], roles: &[UserRole], needle: Option<&str>) -> Vec<UserView> {
    profiles
        .iter()
        .filter(|p| {
            matches_search(
                needle,
                &[
                    p.email.as_deref().unwrap_or_default(),
                    p.full_name.as_deref().unwrap_or_default(),
                ],
            )
        })
        .map(|p| UserView::new(p, roles))
        .collect()
}

/// Users list.
///
/// GET /users
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> UsersIndexTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/users").await;
    let gateway = state.gateway_for(&admin);

    let profiles_query = Select::newest();
    let roles_query = Select::new();
    let (profiles, roles) = tokio::join!(
        gateway.select::<Profile>(&profiles_query),
        gateway.select::<UserRole>(&roles_query)
    );
    let profiles = profiles.unwrap_or_else(|e| {
        page.gateway_failure("profiles", &e);
        Vec::new()
    });
    let roles = roles.unwrap_or_else(|e| {
        page.gateway_failure("roles", &e);
        Vec::new()
    });

    UsersIndexTemplate {
        page,
        users: merge_users(&profiles, &roles, query.needle().as_deref()),
        q: query.q,
        self_id: admin.auth.user.id.to_string(),
    }
}

/// Grant the admin role, or revoke it if already held.
///
/// POST /users/{user_id}/admin
#[instrument(skip(admin, state, session))]
async fn toggle_admin(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<UserId>,
) -> Result<Redirect> {
    let flash = if user_id == admin.auth.user.id {
        Flash::error("You cannot change your own admin access")
    } else {
        match toggle(&state.gateway_for(&admin), user_id).await {
            Ok(true) => {
                add_breadcrumb("users", "Granted admin role", &user_id);
                tracing::info!(user_id = %user_id, "Admin role granted");
                Flash::success("Admin access granted")
            }
            Ok(false) => {
                add_breadcrumb("users", "Revoked admin role", &user_id);
                tracing::info!(user_id = %user_id, "Admin role revoked");
                Flash::success("Admin access removed")
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to change admin role");
                Flash::error(format!("Could not change admin access: {e}"))
            }
        }
    };

    push_flash(&session, flash).await?;
    Ok(Redirect::to("/users"))
}

/// Flip the admin role. Returns whether the user is now an admin.
async fn toggle(gateway: &GatewayClient, user_id: UserId) -> std::result::Result<bool, GatewayError> {
    let held = Select::new()
        .eq("user_id", user_id)
        .eq("role", AppRole::Admin);

    if gateway.count::<UserRole>(&held).await? > 0 {
        gateway.delete_where::<UserRole>(&held).await?;
        Ok(false)
    } else {
        gateway
            .insert::<UserRole, _>(&NewUserRole {
                user_id,
                role: AppRole::Admin,
            })
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use digimart_core::{ProfileId, UserRoleId};

    use super::*;

    fn profile(name: Option<&str>, email: Option<&str>) -> Profile {
        Profile {
            id: ProfileId::generate(),
            user_id: UserId::generate(),
            full_name: name.map(String::from),
            email: email.map(String::from),
            phone: None,
            address: None,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_search_by_email_or_name() {
        let profiles = vec![
            profile(Some("Pham Quang D"), Some("d@digimart.vn")),
            profile(None, Some("e@example.com")),
            profile(Some("Vo Thi E"), None),
        ];

        assert_eq!(merge_users(&profiles, &[], Some("digimart")).len(), 1);
        assert_eq!(merge_users(&profiles, &[], Some("vo thi")).len(), 1);
        assert_eq!(merge_users(&profiles, &[], None).len(), 3);
    }

    #[test]
    fn test_admin_flag_from_roles() {
        let profiles = vec![profile(Some("Admin"), None), profile(Some("Shopper"), None)];
        let roles = vec![UserRole {
            id: UserRoleId::generate(),
            user_id: profiles[0].user_id,
            role: AppRole::Admin,
            created_at: Utc::now(),
        }];

        let users = merge_users(&profiles, &roles, None);
        assert!(users[0].is_admin);
        assert!(!users[1].is_admin);
    }
}
