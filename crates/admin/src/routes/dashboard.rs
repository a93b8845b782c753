//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use digimart_core::{OrderStatus, PaymentStatus, Price, ReturnStatus};
use digimart_supabase::types::{Order, Product, ReturnRequest, Review};
use digimart_supabase::{GatewayClient, GatewayError, Select};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::views::{OrderView, PageContext};

/// How many recent orders the dashboard lists.
const RECENT_ORDERS: usize = 5;

/// Dashboard metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub products: u64,
    pub orders: u64,
    pub pending_orders: u64,
    pub reviews: u64,
    pub pending_reviews: u64,
    pub returns: u64,
    pub requested_returns: u64,
    pub revenue: Price,
}

#[derive(Debug, Deserialize)]
struct AmountRow {
    total_amount: Decimal,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub metrics: DashboardMetrics,
    pub revenue: String,
    pub recent_orders: Vec<OrderView>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Fetch every dashboard figure concurrently.
async fn load_metrics(gateway: &GatewayClient) -> Result<DashboardMetrics, GatewayError> {
    let all = Select::new();
    let pending_orders = Select::new().eq("status", OrderStatus::Pending);
    let pending_reviews = Select::new().is_not_true("is_approved");
    let requested_returns = Select::new().eq("status", ReturnStatus::Requested);
    let paid = Select::new()
        .columns("total_amount")
        .eq("payment_status", PaymentStatus::Paid);

    let (
        products,
        orders,
        pending_orders,
        reviews,
        pending_reviews,
        returns,
        requested_returns,
        paid,
    ) = tokio::try_join!(
        gateway.count::<Product>(&all),
        gateway.count::<Order>(&all),
        gateway.count::<Order>(&pending_orders),
        gateway.count::<Review>(&all),
        gateway.count::<Review>(&pending_reviews),
        gateway.count::<ReturnRequest>(&all),
        gateway.count::<ReturnRequest>(&requested_returns),
        gateway.select_as::<AmountRow>("orders", &paid),
    )?;

    Ok(DashboardMetrics {
        products,
        orders,
        pending_orders,
        reviews,
        pending_reviews,
        returns,
        requested_returns,
        revenue: revenue(&paid),
    })
}

/// Sum of paid order totals. Negative amounts are ignored.
fn revenue(rows: &[AmountRow]) -> Price {
    rows.iter()
        .filter_map(|r| Price::new(r.total_amount).ok())
        .sum()
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip_all)]
async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> DashboardTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/").await;
    let gateway = state.gateway_for(&admin);

    let recent = Select::newest().limit(RECENT_ORDERS);
    let (metrics, recent_orders) = tokio::join!(
        load_metrics(&gateway),
        gateway.select::<Order>(&recent)
    );

    let metrics = metrics.unwrap_or_else(|e| {
        page.gateway_failure("dashboard figures", &e);
        DashboardMetrics::default()
    });
    let recent_orders = recent_orders.unwrap_or_else(|e| {
        page.gateway_failure("recent orders", &e);
        Vec::new()
    });

    DashboardTemplate {
        page,
        revenue: metrics.revenue.display(),
        metrics,
        recent_orders: recent_orders.iter().map(OrderView::from).collect(),
    }
}
