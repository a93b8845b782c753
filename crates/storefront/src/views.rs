//! Display data for templates.
//!
//! Templates never format prices or ratings themselves; these views carry
//! ready-to-print strings.

use digimart_core::{Cart, CartLine, Category, ProductType};
use digimart_supabase::AuthSession;
use digimart_supabase::types::{Product, Review};
use rust_decimal::{Decimal, RoundingStrategy};
use tower_sessions::Session;

use crate::middleware::is_admin;
use crate::models::{Flash, load_cart, take_flashes};
use crate::state::AppState;

/// Shared header/footer data for every full page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Display name of the signed-in user.
    pub user_name: Option<String>,
    /// Back-office link, only for admins.
    pub admin_url: Option<String>,
    pub cart_count: u32,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Build the page chrome and consume pending flash notifications.
    pub async fn load(state: &AppState, session: &Session, auth: Option<&AuthSession>) -> Self {
        let admin_url = match (auth, &state.config().admin_base_url) {
            (Some(auth), Some(url)) if is_admin(session, auth).await => Some(url.to_string()),
            _ => None,
        };

        Self {
            user_name: auth.map(|a| a.user.display_name().to_string()),
            admin_url,
            cart_count: load_cart(session).await.item_count(),
            flashes: take_flashes(session).await,
        }
    }
}

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub image: String,
    pub is_digital: bool,
    pub type_label: &'static str,
    pub category: String,
    pub category_label: String,
    pub rating: String,
    pub reviews_count: u32,
    pub in_stock: bool,
    pub featured: bool,
    pub file_size: Option<String>,
    pub file_format: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price.display(),
            original_price: p
                .discount_percent()
                .and(p.original_price)
                .map(|o| o.display()),
            discount_percent: p.discount_percent(),
            image: p.image.clone(),
            is_digital: p.is_digital(),
            type_label: type_label(p.product_type),
            category: p.category.clone(),
            category_label: category_label(&p.category),
            rating: format_rating(p.rating),
            reviews_count: p.reviews_count,
            in_stock: p.in_stock,
            featured: p.featured,
            file_size: p.file_size.clone(),
            file_format: p.file_format.clone(),
        }
    }
}

/// Map a product list to views.
pub fn product_views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(ProductView::from).collect()
}

/// Review display data for templates.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub user_name: String,
    pub rating: u8,
    pub stars: String,
    pub comment: Option<String>,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(r: &Review) -> Self {
        Self {
            user_name: r.user_name.clone(),
            rating: r.rating,
            stars: r.stars(),
            comment: r.comment.clone(),
            date: r.created_at.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub is_digital: bool,
    pub type_label: &'static str,
    pub quantity: u32,
    pub unit_price: String,
    pub original_unit_price: Option<String>,
    pub line_total: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            image: line.image.clone(),
            is_digital: matches!(line.product_type, ProductType::Digital),
            type_label: type_label(line.product_type),
            quantity: line.quantity,
            unit_price: line.unit_price.display(),
            original_unit_price: line
                .original_unit_price
                .filter(|o| *o > line.unit_price)
                .map(|o| o.display()),
            line_total: line.line_total().display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub requires_shipping: bool,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal().display(),
            requires_shipping: cart.requires_shipping(),
        }
    }
}

/// Category tile on the home page.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub slug: &'static str,
    pub label: &'static str,
    pub is_digital: bool,
}

impl From<Category> for CategoryView {
    fn from(c: Category) -> Self {
        Self {
            slug: c.as_str(),
            label: c.label(),
            is_digital: matches!(c.product_type(), ProductType::Digital),
        }
    }
}

const fn type_label(product_type: ProductType) -> &'static str {
    match product_type {
        ProductType::Digital => "Digital",
        ProductType::Physical => "Physical",
    }
}

/// Known categories by label, anything else verbatim.
fn category_label(category: &str) -> String {
    category
        .parse::<Category>()
        .map_or_else(|_| category.to_string(), |c| c.label().to_string())
}

/// One decimal place, e.g. `4.8`.
fn format_rating(rating: Decimal) -> String {
    format!(
        "{:.1}",
        rating.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use digimart_core::Price;

    use super::*;
    use crate::catalog::listing::tests::product;

    #[test]
    fn test_product_view_discount() {
        let mut p = product("UI Kit", ProductType::Digital, 100_000);
        p.original_price = Some(Price::from_dong(150_000));
        p.rating = Decimal::new(48, 1);

        let view = ProductView::from(&p);
        assert_eq!(view.price, "100.000 ₫");
        assert_eq!(view.original_price.as_deref(), Some("150.000 ₫"));
        assert_eq!(view.discount_percent, Some(33));
        assert_eq!(view.rating, "4.8");
        assert_eq!(view.category_label, "Design");
        assert!(view.is_digital);
    }

    #[test]
    fn test_original_price_hidden_without_discount() {
        let mut p = product("Tee", ProductType::Physical, 350_000);
        p.original_price = Some(Price::from_dong(300_000));
        p.category = "vinyl".to_string();

        let view = ProductView::from(&p);
        assert_eq!(view.original_price, None);
        assert_eq!(view.discount_percent, None);
        assert_eq!(view.category_label, "vinyl");
        assert_eq!(view.rating, "0.0");
    }

    #[test]
    fn test_cart_view() {
        let mut cart = Cart::new();
        cart.add_item(product("Beats", ProductType::Digital, 50_000).to_cart_product(), 1);
        cart.add_item(product("Lamp", ProductType::Physical, 70_000).to_cart_product(), 2);

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "190.000 ₫");
        assert!(view.requires_shipping);
        assert_eq!(view.items[1].line_total, "140.000 ₫");
    }
}
