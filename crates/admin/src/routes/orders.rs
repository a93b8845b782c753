//! Order management route handlers.
//!
//! Any status can move to any other; concurrent edits resolve as last
//! write wins.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use digimart_core::{OrderId, OrderStatus};
use digimart_supabase::types::{Order, OrderItem, OrderStatusUpdate};
use digimart_supabase::{GatewayError, Select};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{FilterOption, ListQuery, StatusFilter, matches_search};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::views::{OrderItemView, OrderView, PageContext};

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    /// Page to return to; only `list` is recognised, anything else goes to
    /// the order's detail page.
    #[serde(default)]
    pub back: Option<String>,
}

/// Orders list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
    pub q: String,
    pub status_options: Vec<FilterOption>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
    pub status_options: Vec<FilterOption>,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
}

fn status_choices() -> impl Iterator<Item = (&'static str, &'static str)> {
    OrderStatus::ALL.iter().map(|s| (s.as_str(), s.label()))
}

/// Keep orders matching the search term (customer name, email or id) and
/// status filter.
fn filter_orders(orders: &[Order], query: &ListQuery) -> Vec<OrderView> {
    let needle = query.needle();
    let status: StatusFilter<OrderStatus> = query.status_filter();
    orders
        .iter()
        .filter(|o| status.accepts(&o.status))
        .filter(|o| {
            matches_search(
                needle.as_deref(),
                &[
                    o.customer_name.as_str(),
                    o.customer_email.as_str(),
                    o.id.to_string().as_str(),
                ],
            )
        })
        .map(OrderView::from)
        .collect()
}

/// Orders list.
///
/// GET /orders
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> OrdersIndexTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/orders").await;

    let orders = state
        .gateway_for(&admin)
        .select::<Order>(&Select::newest())
        .await
        .unwrap_or_else(|e| {
            page.gateway_failure("orders", &e);
            Vec::new()
        });

    OrdersIndexTemplate {
        page,
        orders: filter_orders(&orders, &query),
        status_options: FilterOption::list(status_choices(), query.status_value(), true),
        q: query.q,
    }
}

/// Order detail with items.
///
/// GET /orders/{id}
#[instrument(skip(admin, state, session))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate> {
    let gateway = state.gateway_for(&admin);
    let items_query = Select::new().eq("order_id", id).order_asc("created_at");
    let (order, items) = tokio::join!(
        gateway.find::<Order>(id),
        gateway.select::<OrderItem>(&items_query)
    );

    let order = order.map_err(|e| match e {
        GatewayError::NotFound(_) => AppError::NotFound(format!("order {id}")),
        other => other.into(),
    })?;

    let mut page = PageContext::load(&state, &session, &admin, "/orders").await;
    let items = items.unwrap_or_else(|e| {
        page.gateway_failure("order items", &e);
        Vec::new()
    });

    Ok(OrderShowTemplate {
        page,
        status_options: FilterOption::list(status_choices(), order.status.as_str(), false),
        order: OrderView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
    })
}

/// Set an order's status.
///
/// POST /orders/{id}/status
#[instrument(skip(admin, state, session, form))]
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|e| AppError::BadRequest(format!("{e}")))?;

    let flash = match state
        .gateway_for(&admin)
        .update::<Order, _>(id, &OrderStatusUpdate { status })
        .await
    {
        Ok(order) => {
            add_breadcrumb("orders", "Changed order status", &id);
            tracing::info!(order_id = %id, status = %order.status, "Order status updated");
            Flash::success(format!(
                "Order #{} is now {}",
                order.id.short(),
                order.status.label()
            ))
        }
        Err(e) => {
            tracing::error!(order_id = %id, error = %e, "Failed to update order status");
            Flash::error(format!("Could not update order: {e}"))
        }
    };
    push_flash(&session, flash).await?;

    let target = match form.back.as_deref() {
        Some("list") => "/orders".to_string(),
        _ => format!("/orders/{id}"),
    };
    Ok(Redirect::to(&target))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use digimart_core::Price;

    use super::*;

    fn order(name: &str, email: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::generate(),
            user_id: None,
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            customer_phone: None,
            shipping_address: None,
            notes: None,
            payment_method: Some("momo".to_string()),
            payment_status: Some("paid".to_string()),
            status,
            total_amount: Price::from_dong(299_000),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn query(q: &str, status: &str) -> ListQuery {
        ListQuery {
            q: q.to_string(),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn test_filter_by_search_and_status() {
        let orders = vec![
            order("Nguyen Van A", "a@example.com", OrderStatus::Pending),
            order("Tran Thi B", "b@example.com", OrderStatus::Shipped),
            order("Le Van C", "nguyen.c@example.com", OrderStatus::Shipped),
        ];

        assert_eq!(filter_orders(&orders, &query("nguyen", "all")).len(), 2);
        assert_eq!(filter_orders(&orders, &query("NGUYEN", "shipped")).len(), 1);
        assert_eq!(filter_orders(&orders, &query("", "cancelled")).len(), 0);
    }

    #[test]
    fn test_search_by_order_id() {
        let orders = vec![order("A", "a@example.com", OrderStatus::Pending)];
        let prefix = orders[0].id.short();
        let found = filter_orders(&orders, &query(&prefix.to_uppercase(), "all"));
        assert_eq!(found.len(), 1);
    }
}
