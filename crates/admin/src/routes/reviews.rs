//! Review moderation route handlers.

use std::collections::HashMap;
use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use digimart_core::{ProductId, ReviewId};
use digimart_supabase::types::{Review, ReviewApproval};
use digimart_supabase::Select;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{FilterOption, ListQuery, StatusFilter, matches_search};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::views::{PageContext, ReviewView};

/// Moderation state used by the status dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Pending,
    Approved,
}

impl Moderation {
    const CHOICES: [(&'static str, &'static str); 2] =
        [("pending", "Pending"), ("approved", "Approved")];

    const fn of(review: &Review) -> Self {
        if review.is_approved {
            Self::Approved
        } else {
            Self::Pending
        }
    }
}

impl FromStr for Moderation {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductName {
    id: ProductId,
    name: String,
}

/// Reviews list template.
#[derive(Template, WebTemplate)]
#[template(path = "reviews/index.html")]
pub struct ReviewsIndexTemplate {
    pub page: PageContext,
    pub reviews: Vec<ReviewView>,
    pub q: String,
    pub status_options: Vec<FilterOption>,
}

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(index))
        .route("/reviews/{id}/approve", post(approve))
        .route("/reviews/{id}/reject", post(reject))
}

/// Keep reviews matching the search term (reviewer or comment) and
/// moderation filter.
fn filter_reviews(
    reviews: &[Review],
    names: &HashMap<ProductId, String>,
    query: &ListQuery,
) -> Vec<ReviewView> {
    let needle = query.needle();
    let status: StatusFilter<Moderation> = query.status_filter();
    reviews
        .iter()
        .filter(|r| status.accepts(&Moderation::of(r)))
        .filter(|r| {
            matches_search(
                needle.as_deref(),
                &[r.user_name.as_str(), r.comment.as_deref().unwrap_or_default()],
            )
        })
        .map(|r| ReviewView::new(r, names.get(&r.product_id).map(String::as_str)))
        .collect()
}

/// Reviews list.
///
/// GET /reviews
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> ReviewsIndexTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/reviews").await;
    let gateway = state.gateway_for(&admin);

    let names_query = Select::new().columns("id,name");
    let reviews_query = Select::newest();
    let (reviews, names) = tokio::join!(
        gateway.select::<Review>(&reviews_query),
        gateway.select_as::<ProductName>("products", &names_query)
    );

    let reviews = reviews.unwrap_or_else(|e| {
        page.gateway_failure("reviews", &e);
        Vec::new()
    });
    // Reviews still render without product names
    let names: HashMap<ProductId, String> = names
        .map(|rows| rows.into_iter().map(|p| (p.id, p.name)).collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load product names");
            HashMap::new()
        });

    ReviewsIndexTemplate {
        page,
        reviews: filter_reviews(&reviews, &names, &query),
        status_options: FilterOption::list(Moderation::CHOICES, query.status_value(), true),
        q: query.q,
    }
}

/// Approve a review.
///
/// POST /reviews/{id}/approve
#[instrument(skip(admin, state, session))]
async fn approve(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    let flash = match state
        .gateway_for(&admin)
        .update::<Review, _>(id, &ReviewApproval { is_approved: true })
        .await
    {
        Ok(_) => {
            add_breadcrumb("reviews", "Approved review", &id);
            Flash::success("Review approved")
        }
        Err(e) => {
            tracing::error!(review_id = %id, error = %e, "Failed to approve review");
            Flash::error(format!("Could not approve review: {e}"))
        }
    };
    push_flash(&session, flash).await?;
    Ok(Redirect::to("/reviews"))
}

/// Reject a review by deleting it.
///
/// POST /reviews/{id}/reject
#[instrument(skip(admin, state, session))]
async fn reject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReviewId>,
) -> Result<Redirect> {
    let flash = match state.gateway_for(&admin).delete::<Review>(id).await {
        Ok(()) => {
            add_breadcrumb("reviews", "Deleted review", &id);
            Flash::success("Review deleted")
        }
        Err(e) => {
            tracing::error!(review_id = %id, error = %e, "Failed to delete review");
            Flash::error(format!("Could not delete review: {e}"))
        }
    };
    push_flash(&session, flash).await?;
    Ok(Redirect::to("/reviews"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn review(user_name: &str, comment: Option<&str>, is_approved: bool) -> Review {
        Review {
            id: ReviewId::generate(),
            product_id: ProductId::generate(),
            user_id: None,
            user_name: user_name.to_string(),
            rating: 4,
            comment: comment.map(String::from),
            is_approved,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn query(q: &str, status: Option<&str>) -> ListQuery {
        ListQuery {
            q: q.to_string(),
            status: status.map(String::from),
        }
    }

    #[test]
    fn test_moderation_filter() {
        let reviews = vec![
            review("Minh", Some("Great pack"), true),
            review("Lan", None, false),
        ];
        let names = HashMap::new();

        assert_eq!(filter_reviews(&reviews, &names, &query("", None)).len(), 2);
        let pending = filter_reviews(&reviews, &names, &query("", Some("pending")));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user_name, "Lan");
    }

    #[test]
    fn test_search_covers_comment() {
        let reviews = vec![
            review("Minh", Some("Great PACK"), true),
            review("Lan", None, false),
        ];
        let found = filter_reviews(&reviews, &HashMap::new(), &query("pack", Some("all")));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_name, None);
    }

    #[test]
    fn test_product_name_lookup() {
        let r = review("Minh", None, true);
        let names = HashMap::from([(r.product_id, "Lo-fi Beats".to_string())]);
        let found = filter_reviews(&[r], &names, &query("", None));
        assert_eq!(found[0].product_name.as_deref(), Some("Lo-fi Beats"));
    }
}
