//! Return request route handlers, including the defective-goods view.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use digimart_core::validation::{self, FieldErrors};
use digimart_core::{ReturnId, ReturnStatus};
use digimart_supabase::types::{ReturnRequest, ReturnUpdate};
use digimart_supabase::{GatewayClient, GatewayError, Select};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{FilterOption, ListQuery, StatusFilter, matches_search};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::views::{PageContext, ReturnView};

/// Return review form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReturnForm {
    pub status: String,
    pub admin_notes: String,
    pub refund_amount: String,
}

impl ReturnForm {
    /// Validate into an update payload.
    ///
    /// A blank refund amount clears it.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> std::result::Result<ReturnUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let status = errors.check(
            "status",
            self.status
                .parse::<ReturnStatus>()
                .map_err(|_| validation::ValidationError::Required),
        );
        let refund_amount = errors.check(
            "refund_amount",
            validation::optional_price(&self.refund_amount),
        );

        match (status, refund_amount) {
            (Some(status), Some(refund_amount)) if errors.is_empty() => Ok(ReturnUpdate {
                status,
                admin_notes: validation::optional(&self.admin_notes),
                refund_amount,
            }),
            _ => Err(errors),
        }
    }
}

/// Returns list template.
#[derive(Template, WebTemplate)]
#[template(path = "returns/index.html")]
pub struct ReturnsIndexTemplate {
    pub page: PageContext,
    pub returns: Vec<ReturnView>,
    pub q: String,
    pub status_options: Vec<FilterOption>,
}

/// Defective goods template.
#[derive(Template, WebTemplate)]
#[template(path = "returns/defective.html")]
pub struct DefectiveTemplate {
    pub page: PageContext,
    pub returns: Vec<ReturnView>,
    pub q: String,
}

/// Return detail template.
#[derive(Template, WebTemplate)]
#[template(path = "returns/show.html")]
pub struct ReturnShowTemplate {
    pub page: PageContext,
    pub ret: ReturnView,
    pub form: ReturnForm,
    pub errors: HashMap<&'static str, String>,
    pub status_options: Vec<FilterOption>,
}

impl ReturnShowTemplate {
    fn new(page: PageContext, ret: &ReturnRequest, form: ReturnForm) -> Self {
        Self {
            page,
            ret: ReturnView::from(ret),
            status_options: FilterOption::list(status_choices(), &form.status, false),
            form,
            errors: HashMap::new(),
        }
    }
}

impl From<&ReturnRequest> for ReturnForm {
    fn from(r: &ReturnRequest) -> Self {
        let view = ReturnView::from(r);
        Self {
            status: view.status.to_string(),
            admin_notes: view.admin_notes,
            refund_amount: view.refund_input,
        }
    }
}

/// Build the returns router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/returns", get(index))
        .route("/returns/{id}", get(show).post(update))
        .route("/defective", get(defective))
}

fn status_choices() -> impl Iterator<Item = (&'static str, &'static str)> {
    ReturnStatus::ALL.iter().map(|s| (s.as_str(), s.label()))
}

/// Keep returns whose reason or order id matches the search term and whose
/// status passes the filter.
fn filter_returns(
    returns: &[ReturnRequest],
    needle: Option<&str>,
    status: StatusFilter<ReturnStatus>,
) -> Vec<ReturnView> {
    returns
        .iter()
        .filter(|r| status.accepts(&r.status))
        .filter(|r| matches_search(needle, &[r.reason.as_str(), r.order_id.to_string().as_str()]))
        .map(ReturnView::from)
        .collect()
}

async fn load_returns(
    gateway: &GatewayClient,
    page: &mut PageContext,
    query: &Select,
) -> Vec<ReturnRequest> {
    gateway
        .select::<ReturnRequest>(query)
        .await
        .unwrap_or_else(|e| {
            page.gateway_failure("return requests", &e);
            Vec::new()
        })
}

/// Returns list.
///
/// GET /returns
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> ReturnsIndexTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/returns").await;
    let returns = load_returns(&state.gateway_for(&admin), &mut page, &Select::newest()).await;

    ReturnsIndexTemplate {
        page,
        returns: filter_returns(&returns, query.needle().as_deref(), query.status_filter()),
        status_options: FilterOption::list(status_choices(), query.status_value(), true),
        q: query.q,
    }
}

/// Returns flagged as defective.
///
/// GET /defective
#[instrument(skip(admin, state, session))]
async fn defective(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> DefectiveTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/defective").await;
    let returns = load_returns(
        &state.gateway_for(&admin),
        &mut page,
        &Select::newest().eq("is_defective", true),
    )
    .await;

    DefectiveTemplate {
        page,
        returns: filter_returns(&returns, query.needle().as_deref(), StatusFilter::All),
        q: query.q,
    }
}

/// Return detail with the review form.
///
/// GET /returns/{id}
#[instrument(skip(admin, state, session))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReturnId>,
) -> Result<ReturnShowTemplate> {
    let ret = find_return(&state.gateway_for(&admin), id).await?;
    let page = PageContext::load(&state, &session, &admin, "/returns").await;
    Ok(ReturnShowTemplate::new(page, &ret, ReturnForm::from(&ret)))
}

/// Set status, notes and refund amount.
///
/// POST /returns/{id}
#[instrument(skip(admin, state, session, form))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ReturnId>,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    let gateway = state.gateway_for(&admin);

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => {
            let ret = find_return(&gateway, id).await?;
            let page = PageContext::load(&state, &session, &admin, "/returns").await;
            let mut template = ReturnShowTemplate::new(page, &ret, form);
            template.errors = errors.iter().map(|(f, e)| (f, e.to_string())).collect();
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    let flash = match gateway.update::<ReturnRequest, _>(id, &changes).await {
        Ok(ret) => {
            add_breadcrumb("returns", "Updated return request", &id);
            tracing::info!(return_id = %id, status = %ret.status, "Return request updated");
            Flash::success(format!("Return #{} is now {}", ret.id.short(), ret.status.label()))
        }
        Err(GatewayError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("return {id}")));
        }
        Err(e) => {
            tracing::error!(return_id = %id, error = %e, "Failed to update return request");
            Flash::error(format!("Could not update return request: {e}"))
        }
    };
    push_flash(&session, flash).await?;
    Ok(Redirect::to(&format!("/returns/{id}")).into_response())
}

async fn find_return(gateway: &GatewayClient, id: ReturnId) -> Result<ReturnRequest> {
    gateway
        .find::<ReturnRequest>(id)
        .await
        .map_err(|e| match e {
            GatewayError::NotFound(_) => AppError::NotFound(format!("return {id}")),
            other => other.into(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use digimart_core::{OrderId, Price};

    use super::*;

    fn ret(reason: &str, status: ReturnStatus, is_defective: bool) -> ReturnRequest {
        ReturnRequest {
            id: ReturnId::generate(),
            order_id: OrderId::generate(),
            order_item_id: None,
            user_id: None,
            reason: reason.to_string(),
            status,
            is_defective,
            refund_amount: None,
            admin_notes: None,
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_form_validation() {
        let form = ReturnForm {
            status: "refunded".to_string(),
            admin_notes: "  Refunded to MoMo wallet ".to_string(),
            refund_amount: "350000".to_string(),
        };
        let update = form.validate().unwrap();
        assert_eq!(update.status, ReturnStatus::Refunded);
        assert_eq!(update.admin_notes.as_deref(), Some("Refunded to MoMo wallet"));
        assert_eq!(update.refund_amount, Some(Price::from_dong(350_000)));
    }

    #[test]
    fn test_form_rejects_bad_input() {
        let form = ReturnForm {
            status: "archived".to_string(),
            admin_notes: String::new(),
            refund_amount: "-10".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("status").is_some());
        assert!(errors.get("refund_amount").is_some());
    }

    #[test]
    fn test_blank_refund_clears_amount() {
        let form = ReturnForm {
            status: "rejected".to_string(),
            ..ReturnForm::default()
        };
        let update = form.validate().unwrap();
        assert_eq!(update.refund_amount, None);
        assert_eq!(update.admin_notes, None);
    }

    #[test]
    fn test_filter_returns() {
        let returns = vec![
            ret("Cracked screen on arrival", ReturnStatus::Requested, true),
            ret("Wrong size", ReturnStatus::Approved, false),
        ];
        assert_eq!(filter_returns(&returns, Some("screen"), StatusFilter::All).len(), 1);
        assert_eq!(
            filter_returns(&returns, None, StatusFilter::Only(ReturnStatus::Approved)).len(),
            1
        );
        assert!(filter_returns(&returns, Some("size"), StatusFilter::Only(ReturnStatus::Refunded)).is_empty());
    }
}
