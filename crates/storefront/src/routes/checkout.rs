//! Checkout handlers.
//!
//! Payment is simulated: after a configurable delay it always succeeds and
//! the order is recorded through the gateway.
//!
//! The order id is reserved in the session once per cart, so resubmitting
//! after a failure targets the same order instead of creating another.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use digimart_core::validation::{self, FieldErrors};
use digimart_core::{Cart, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId};
use digimart_supabase::types::{NewOrder, NewOrderItem, Order, OrderItem};
use digimart_supabase::{AuthSession, GatewayClient, GatewayError, Select};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Flash, checkout_order_id, load_cart, push_flash, store_cart};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub payment_method: String,
}

impl CheckoutForm {
    /// Prefill contact fields from the signed-in account.
    fn prefilled(auth: Option<&AuthSession>) -> Self {
        let Some(auth) = auth else {
            return Self {
                payment_method: PaymentMethod::Card.as_str().to_string(),
                ..Self::default()
            };
        };

        let (first_name, last_name) = auth
            .user
            .full_name
            .as_deref()
            .map(split_name)
            .unwrap_or_default();

        Self {
            first_name,
            last_name,
            email: auth.user.email.clone().unwrap_or_default(),
            payment_method: PaymentMethod::Card.as_str().to_string(),
            ..Self::default()
        }
    }
}

/// Payment method radio button.
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: HashMap<&'static str, String>,
    pub payment_options: Vec<PaymentOption>,
}

/// Validated checkout data, ready to become an order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckoutDetails {
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    shipping_address: Option<String>,
    notes: Option<String>,
    payment_method: PaymentMethod,
}

/// Display the checkout form.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let page = PageContext::load(&state, &session, auth.as_ref()).await;
    render(page, &cart, CheckoutForm::prefilled(auth.as_ref()), &FieldErrors::new()).into_response()
}

/// Place the order.
///
/// Validation errors re-render the form with 422. A failed insert keeps the
/// cart and shows the gateway message.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let details = match validate(&form, cart.requires_shipping()) {
        Ok(details) => details,
        Err(errors) => {
            let page = PageContext::load(&state, &session, auth.as_ref()).await;
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                render(page, &cart, form, &errors),
            )
                .into_response());
        }
    };

    let order_id = checkout_order_id(&session).await?;

    // Simulated payment processing
    tokio::time::sleep(state.config().checkout_delay).await;

    match place_order(&state, auth.as_ref(), order_id, &cart, details).await {
        Ok(order_id) => {
            let mut cart = cart;
            cart.clear();
            store_cart(&session, &cart).await?;

            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", &order_id.to_string())]),
            );
            push_flash(
                &session,
                Flash::success("Order placed!").with_message("Thanks for your purchase"),
            )
            .await?;

            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to record order");
            let mut page = PageContext::load(&state, &session, auth.as_ref()).await;
            page.flashes
                .push(Flash::error("Could not place order").with_message(e.to_string()));
            Ok((
                StatusCode::BAD_GATEWAY,
                render(page, &cart, form, &FieldErrors::new()),
            )
                .into_response())
        }
    }
}

fn render(page: PageContext, cart: &Cart, form: CheckoutForm, errors: &FieldErrors) -> CheckoutTemplate {
    let selected = form.payment_method.parse::<PaymentMethod>().ok();
    let payment_options = PaymentMethod::ALL
        .iter()
        .map(|method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            checked: selected == Some(*method),
        })
        .collect();

    CheckoutTemplate {
        page,
        cart: CartView::from(cart),
        form,
        errors: errors.iter().map(|(field, e)| (field, e.to_string())).collect(),
        payment_options,
    }
}

/// Check the form. Shipping fields are only required for physical carts.
fn validate(form: &CheckoutForm, requires_shipping: bool) -> std::result::Result<CheckoutDetails, FieldErrors> {
    let mut errors = FieldErrors::new();

    let first_name = errors.check("first_name", validation::required(&form.first_name));
    let last_name = errors.check("last_name", validation::required(&form.last_name));
    let email = errors.check("email", validation::email(&form.email));
    let phone = errors.check("phone", validation::required(&form.phone));
    let payment_method = errors.check(
        "payment_method",
        form.payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| validation::ValidationError::Required),
    );

    let shipping_address = if requires_shipping {
        let address = errors.check("address", validation::required(&form.address));
        let district = errors.check("district", validation::required(&form.district));
        let city = errors.check("city", validation::required(&form.city));
        match (address, district, city) {
            (Some(address), Some(district), Some(city)) => Some(join_address(
                &address,
                &district,
                &city,
                validation::optional(&form.zipcode).as_deref(),
            )),
            _ => None,
        }
    } else {
        None
    };

    match (first_name, last_name, email, phone, payment_method) {
        (Some(first), Some(last), Some(email), Some(phone), Some(payment_method))
            if errors.is_empty() =>
        {
            Ok(CheckoutDetails {
                customer_name: format!("{first} {last}"),
                customer_email: email.into_inner(),
                customer_phone: phone,
                shipping_address,
                notes: validation::optional(&form.notes),
                payment_method,
            })
        }
        _ => Err(errors),
    }
}

/// Where orders and their lines are written.
trait OrderStore {
    async fn insert_order(&self, order: &NewOrder) -> std::result::Result<(), GatewayError>;
    async fn item_count(&self, order_id: OrderId) -> std::result::Result<u64, GatewayError>;
    async fn insert_items(&self, items: &[NewOrderItem]) -> std::result::Result<(), GatewayError>;
    async fn delete_order(&self, order_id: OrderId) -> std::result::Result<(), GatewayError>;
}

impl OrderStore for GatewayClient {
    async fn insert_order(&self, order: &NewOrder) -> std::result::Result<(), GatewayError> {
        self.insert::<Order, _>(order).await.map(drop)
    }

    async fn item_count(&self, order_id: OrderId) -> std::result::Result<u64, GatewayError> {
        self.count::<OrderItem>(&Select::new().eq("order_id", order_id))
            .await
    }

    async fn insert_items(&self, items: &[NewOrderItem]) -> std::result::Result<(), GatewayError> {
        self.insert_many::<OrderItem, _>(items).await.map(drop)
    }

    async fn delete_order(&self, order_id: OrderId) -> std::result::Result<(), GatewayError> {
        self.delete::<Order>(order_id).await
    }
}

/// Record the order and its lines.
async fn place_order(
    state: &AppState,
    auth: Option<&AuthSession>,
    order_id: OrderId,
    cart: &Cart,
    details: CheckoutDetails,
) -> std::result::Result<OrderId, GatewayError> {
    let gateway = auth.map_or_else(
        || state.gateway().clone(),
        |auth| state.gateway().as_user(&auth.access_token),
    );

    let order = NewOrder {
        id: order_id,
        user_id: auth.map(|a| a.user.id),
        customer_name: details.customer_name,
        customer_email: details.customer_email,
        customer_phone: Some(details.customer_phone),
        shipping_address: details.shipping_address,
        notes: details.notes,
        payment_method: details.payment_method,
        payment_status: PaymentStatus::Paid,
        status: OrderStatus::Pending,
        total_amount: cart.subtotal(),
    };

    let download_urls = download_urls(state, cart).await;
    let items = order_items(order.id, cart, &download_urls);
    record_order(&gateway, &order, &items).await?;

    tracing::info!(
        order_id = %order.id,
        total = %order.total_amount,
        items = items.len(),
        "Order placed"
    );
    Ok(order.id)
}

/// Write the order, then its lines.
///
/// A conflict on the order means an earlier attempt already stored it: if its
/// lines are there too the order is complete, otherwise the lines are written
/// now. When the lines fail the order row is removed again, so no order is
/// ever left without items.
async fn record_order<S: OrderStore>(
    store: &S,
    order: &NewOrder,
    items: &[NewOrderItem],
) -> std::result::Result<(), GatewayError> {
    match store.insert_order(order).await {
        Ok(()) => {}
        Err(e) if e.status() == Some(StatusCode::CONFLICT.as_u16()) => {
            if store.item_count(order.id).await? > 0 {
                tracing::info!(order_id = %order.id, "Order already recorded");
                return Ok(());
            }
        }
        Err(e) => return Err(e),
    }

    if let Err(e) = store.insert_items(items).await {
        if let Err(cleanup) = store.delete_order(order.id).await {
            tracing::error!(
                order_id = %order.id,
                error = %cleanup,
                "Failed to remove order without items"
            );
        }
        return Err(e);
    }

    Ok(())
}

/// Download links for the digital lines, from the catalog.
///
/// A catalog failure only loses the links; the order still goes through.
async fn download_urls(state: &AppState, cart: &Cart) -> HashMap<ProductId, String> {
    if !cart.lines().iter().any(|l| !l.product_type.requires_shipping()) {
        return HashMap::new();
    }

    match state.catalog().products().await {
        Ok(products) => products
            .iter()
            .filter_map(|p| p.download_url.clone().map(|url| (p.id, url)))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load download links");
            HashMap::new()
        }
    }
}

fn order_items(
    order_id: OrderId,
    cart: &Cart,
    download_urls: &HashMap<ProductId, String>,
) -> Vec<NewOrderItem> {
    cart.lines()
        .iter()
        .map(|line| NewOrderItem {
            order_id,
            product_id: Some(line.product_id),
            product_name: line.name.clone(),
            product_image: validation::optional(&line.image),
            product_type: line.product_type,
            price: line.unit_price,
            quantity: line.quantity,
            download_url: if line.product_type.requires_shipping() {
                None
            } else {
                download_urls.get(&line.product_id).cloned()
            },
        })
        .collect()
}

fn join_address(address: &str, district: &str, city: &str, zipcode: Option<&str>) -> String {
    let mut parts = vec![address, district, city];
    parts.extend(zipcode);
    parts.join(", ")
}

/// Split "Given Family Names" on the first space.
fn split_name(full_name: &str) -> (String, String) {
    let full_name = full_name.trim();
    match full_name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use digimart_core::{CartProduct, Price, ProductType};

    use super::*;

    /// In-memory order table: order id to number of stored lines.
    #[derive(Default)]
    struct MemoryOrders {
        orders: Mutex<HashMap<OrderId, u64>>,
        fail_items: AtomicBool,
    }

    impl MemoryOrders {
        fn set_fail_items(&self, fail: bool) {
            self.fail_items.store(fail, Ordering::SeqCst);
        }

        fn snapshot(&self) -> HashMap<OrderId, u64> {
            self.orders.lock().unwrap().clone()
        }
    }

    impl OrderStore for MemoryOrders {
        async fn insert_order(&self, order: &NewOrder) -> std::result::Result<(), GatewayError> {
            let mut orders = self.orders.lock().unwrap();
            if orders.contains_key(&order.id) {
                return Err(GatewayError::Api {
                    status: 409,
                    message: "duplicate key value violates unique constraint".to_string(),
                });
            }
            orders.insert(order.id, 0);
            Ok(())
        }

        async fn item_count(&self, order_id: OrderId) -> std::result::Result<u64, GatewayError> {
            Ok(self.orders.lock().unwrap().get(&order_id).copied().unwrap_or(0))
        }

        async fn insert_items(&self, items: &[NewOrderItem]) -> std::result::Result<(), GatewayError> {
            if self.fail_items.load(Ordering::SeqCst) {
                return Err(GatewayError::Api {
                    status: 500,
                    message: "insert failed".to_string(),
                });
            }
            let mut orders = self.orders.lock().unwrap();
            for item in items {
                *orders.entry(item.order_id).or_default() += 1;
            }
            Ok(())
        }

        async fn delete_order(&self, order_id: OrderId) -> std::result::Result<(), GatewayError> {
            self.orders.lock().unwrap().remove(&order_id);
            Ok(())
        }
    }

    fn new_order(cart: &Cart) -> NewOrder {
        NewOrder {
            id: OrderId::generate(),
            user_id: None,
            customer_name: "Van A Nguyen".to_string(),
            customer_email: "a@example.com".to_string(),
            customer_phone: Some("0901234567".to_string()),
            shipping_address: None,
            notes: None,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Paid,
            status: OrderStatus::Pending,
            total_amount: cart.subtotal(),
        }
    }

    fn two_line_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(cart_product(ProductType::Digital), 1);
        cart.add_item(cart_product(ProductType::Physical), 2);
        cart
    }

    #[tokio::test]
    async fn test_failed_items_remove_order_and_retry_records_once() {
        let store = MemoryOrders::default();
        let cart = two_line_cart();
        let order = new_order(&cart);
        let items = order_items(order.id, &cart, &HashMap::new());

        store.set_fail_items(true);
        assert!(record_order(&store, &order, &items).await.is_err());
        assert!(store.snapshot().is_empty());

        store.set_fail_items(false);
        record_order(&store, &order, &items).await.unwrap();
        assert_eq!(store.snapshot(), HashMap::from([(order.id, 2)]));
    }

    #[tokio::test]
    async fn test_resubmitting_a_recorded_order_adds_nothing() {
        let store = MemoryOrders::default();
        let cart = two_line_cart();
        let order = new_order(&cart);
        let items = order_items(order.id, &cart, &HashMap::new());

        record_order(&store, &order, &items).await.unwrap();
        record_order(&store, &order, &items).await.unwrap();

        assert_eq!(store.snapshot(), HashMap::from([(order.id, 2)]));
    }

    #[tokio::test]
    async fn test_order_left_without_items_gets_its_items_on_retry() {
        let store = MemoryOrders::default();
        let cart = two_line_cart();
        let order = new_order(&cart);
        let items = order_items(order.id, &cart, &HashMap::new());
        store.orders.lock().unwrap().insert(order.id, 0);

        record_order(&store, &order, &items).await.unwrap();

        assert_eq!(store.snapshot(), HashMap::from([(order.id, 2)]));
    }

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            first_name: "Van A".to_string(),
            last_name: "Nguyen".to_string(),
            email: "a@example.com".to_string(),
            phone: "0901234567".to_string(),
            payment_method: "momo".to_string(),
            ..CheckoutForm::default()
        }
    }

    fn cart_product(product_type: ProductType) -> CartProduct {
        CartProduct {
            product_id: ProductId::generate(),
            name: "Item".to_string(),
            unit_price: Price::from_dong(100_000),
            original_unit_price: None,
            image: String::new(),
            product_type,
        }
    }

    #[test]
    fn test_digital_checkout_needs_no_address() {
        let details = validate(&filled_form(), false).unwrap();
        assert_eq!(details.customer_name, "Van A Nguyen");
        assert_eq!(details.payment_method, PaymentMethod::Momo);
        assert_eq!(details.shipping_address, None);
        assert_eq!(details.notes, None);
    }

    #[test]
    fn test_physical_checkout_requires_address() {
        let errors = validate(&filled_form(), true).unwrap_err();
        assert!(errors.get("address").is_some());
        assert!(errors.get("city").is_some());
        assert!(errors.get("district").is_some());
        assert!(errors.get("zipcode").is_none());
    }

    #[test]
    fn test_shipping_address_joined() {
        let form = CheckoutForm {
            address: "12 Le Loi".to_string(),
            district: "District 1".to_string(),
            city: "Ho Chi Minh City".to_string(),
            zipcode: " 700000 ".to_string(),
            ..filled_form()
        };
        let details = validate(&form, true).unwrap();
        assert_eq!(
            details.shipping_address.as_deref(),
            Some("12 Le Loi, District 1, Ho Chi Minh City, 700000")
        );
    }

    #[test]
    fn test_invalid_fields_collected() {
        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            phone: "  ".to_string(),
            payment_method: "cash".to_string(),
            ..filled_form()
        };
        let errors = validate(&form, false).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("payment_method").is_some());
    }

    #[test]
    fn test_order_items_snapshot_cart() {
        let mut cart = Cart::new();
        let digital = cart_product(ProductType::Digital);
        let physical = cart_product(ProductType::Physical);
        let digital_id = digital.product_id;
        cart.add_item(digital, 1);
        cart.add_item(physical, 2);

        let urls = HashMap::from([(digital_id, "https://cdn.example/kit.zip".to_string())]);
        let order_id = OrderId::generate();
        let items = order_items(order_id, &cart, &urls);

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.order_id == order_id));
        assert_eq!(items[0].download_url.as_deref(), Some("https://cdn.example/kit.zip"));
        assert_eq!(items[1].download_url, None);
        assert_eq!(items[1].quantity, 2);
        assert_eq!(items[0].product_image, None);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Nguyen Van A"), ("Nguyen".to_string(), "Van A".to_string()));
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }
}
