//! Display data for admin templates.

use chrono::{DateTime, Utc};
use digimart_core::{AppRole, Price};
use digimart_supabase::types::{
    Order, OrderItem, Product, Profile, ReturnRequest, Review, UserRole,
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, Flash, take_flashes};
use crate::state::AppState;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name().to_string(),
            email: admin.email().to_string(),
        }
    }
}

/// Sidebar and notification data shared by every signed-in page.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub storefront_url: Option<String>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Build the page chrome and consume pending flash notifications.
    pub async fn load(
        state: &AppState,
        session: &Session,
        admin: &CurrentAdmin,
        current_path: &'static str,
    ) -> Self {
        Self {
            admin_user: AdminUserView::from(admin),
            current_path,
            storefront_url: state.config().storefront_url.as_ref().map(ToString::to_string),
            flashes: take_flashes(session).await,
        }
    }

    /// Show a load failure on this page instead of failing the request.
    pub fn gateway_failure(&mut self, what: &str, error: &impl std::fmt::Display) {
        tracing::error!(error = %error, "Failed to load {what}");
        self.flashes
            .push(Flash::error(format!("Could not load {what}: {error}")));
    }
}

/// `dd/mm/yyyy hh:mm` in UTC.
#[must_use]
pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Product row in the products table.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub category: String,
    pub type_label: &'static str,
    pub price: String,
    pub original_price: Option<String>,
    pub in_stock: bool,
    pub stock_quantity: Option<u32>,
    pub featured: bool,
}

impl From<&Product> for ProductRowView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            image: p.image.clone(),
            category: p.category.clone(),
            type_label: p.product_type.label(),
            price: p.price.display(),
            original_price: p.original_price.map(|o| o.display()),
            in_stock: p.in_stock,
            stock_quantity: p.stock_quantity,
            featured: p.featured,
        }
    }
}

/// Order summary for tables.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub short_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub is_paid: bool,
    pub status: &'static str,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub total: String,
    pub created_at: String,
}

impl From<&Order> for OrderView {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id.to_string(),
            short_id: o.id.short(),
            customer_name: o.customer_name.clone(),
            customer_email: o.customer_email.clone(),
            customer_phone: opt(o.customer_phone.as_deref()),
            shipping_address: opt(o.shipping_address.as_deref()),
            notes: o.notes.clone(),
            payment_method: o.payment_method_label(),
            payment_status: o.payment_status_label(),
            is_paid: o.is_paid(),
            status: o.status.as_str(),
            status_label: o.status.label(),
            status_badge: o.status.badge(),
            total: o.total_amount.display(),
            created_at: format_datetime(o.created_at),
        }
    }
}

/// One line of an order's detail page.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub image: Option<String>,
    pub type_label: &'static str,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
    pub download_url: Option<String>,
}

impl From<&OrderItem> for OrderItemView {
    fn from(i: &OrderItem) -> Self {
        Self {
            name: i.product_name.clone(),
            image: i.product_image.clone(),
            type_label: i.product_type.label(),
            price: i.price.display(),
            quantity: i.quantity,
            line_total: i.line_total().display(),
            download_url: i.download_url.clone(),
        }
    }
}

/// Review row in the moderation table.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub id: String,
    pub product_id: String,
    /// Product name, when the product still exists.
    pub product_name: Option<String>,
    pub user_name: String,
    pub stars: String,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: String,
}

impl ReviewView {
    pub fn new(review: &Review, product_name: Option<&str>) -> Self {
        Self {
            id: review.id.to_string(),
            product_id: review.product_id.to_string(),
            product_name: product_name.map(String::from),
            user_name: review.user_name.clone(),
            stars: review.stars(),
            comment: review.comment.clone().unwrap_or_default(),
            is_approved: review.is_approved,
            created_at: format_datetime(review.created_at),
        }
    }
}

/// Return request for tables and the detail page.
#[derive(Debug, Clone)]
pub struct ReturnView {
    pub id: String,
    pub short_id: String,
    pub order_id: String,
    pub order_short_id: String,
    pub reason: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub is_defective: bool,
    pub refund_amount: Option<String>,
    /// Raw refund amount for the edit form.
    pub refund_input: String,
    pub admin_notes: String,
    pub images: Vec<String>,
    pub created_at: String,
}

impl From<&ReturnRequest> for ReturnView {
    fn from(r: &ReturnRequest) -> Self {
        Self {
            id: r.id.to_string(),
            short_id: r.id.short(),
            order_id: r.order_id.to_string(),
            order_short_id: r.order_id.short(),
            reason: r.reason.clone(),
            status: r.status.as_str(),
            status_label: r.status.label(),
            status_badge: r.status.badge(),
            is_defective: r.is_defective,
            refund_amount: r.refund_amount.map(|p| p.display()),
            refund_input: r
                .refund_amount
                .map(|p: Price| p.amount().normalize().to_string())
                .unwrap_or_default(),
            admin_notes: r.admin_notes.clone().unwrap_or_default(),
            images: r.images.clone(),
            created_at: format_datetime(r.created_at),
        }
    }
}

/// A profile merged with the user's roles.
#[derive(Debug, Clone)]
pub struct UserView {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub roles: Vec<&'static str>,
    pub is_admin: bool,
    pub created_at: String,
}

impl UserView {
    /// Merge a profile with the roles granted to the same user.
    pub fn new(profile: &Profile, roles: &[UserRole]) -> Self {
        let mine: Vec<AppRole> = roles
            .iter()
            .filter(|r| r.user_id == profile.user_id)
            .map(|r| r.role)
            .collect();

        Self {
            user_id: profile.user_id.to_string(),
            full_name: opt(profile.full_name.as_deref()),
            email: opt(profile.email.as_deref()),
            phone: opt(profile.phone.as_deref()),
            is_admin: mine.contains(&AppRole::Admin),
            roles: mine.iter().map(AppRole::label).collect(),
            created_at: format_datetime(profile.created_at),
        }
    }
}
