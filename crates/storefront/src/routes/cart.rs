//! Cart route handlers.
//!
//! Each mutation loads the cart from the session, applies exactly one
//! operation and stores it back, then redirects (post/redirect/get).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use digimart_core::ProductId;
use digimart_supabase::GatewayError;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Flash, load_cart, push_flash, store_cart};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Add to cart form data.
///
/// `quantity` stays raw text so a blank or mistyped field never rejects the
/// whole form.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
    /// Local path to go back to, e.g. the product page.
    pub return_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    /// Zero or negative removes the line; blank or garbage changes nothing.
    #[serde(default)]
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> CartShowTemplate {
    let page = PageContext::load(&state, &session, auth.as_ref()).await;
    let cart = load_cart(&session).await;

    CartShowTemplate {
        page,
        cart: CartView::from(&cart),
    }
}

/// Add a product to the cart.
///
/// The product is fetched server-side so the cart never trusts a posted price.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;
    let return_to = safe_return_path(form.return_to.as_deref()).unwrap_or("/cart");

    let Some(quantity) = add_quantity(form.quantity.as_deref()) else {
        return Ok(Redirect::to(return_to).into_response());
    };

    let product = match state.catalog().product(product_id).await {
        Ok(product) => product,
        Err(GatewayError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("product {product_id}")));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load product for cart");
            push_flash(
                &session,
                Flash::error("Could not add to cart").with_message(e.to_string()),
            )
            .await?;
            return Ok(Redirect::to(return_to).into_response());
        }
    };

    if !product.in_stock {
        push_flash(&session, Flash::error(format!("\"{}\" is out of stock", product.name))).await?;
        return Ok(Redirect::to(return_to).into_response());
    }

    let mut cart = load_cart(&session).await;
    cart.add_item(product.to_cart_product(), quantity);
    store_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &product_id.to_string())]),
    );
    push_flash(&session, Flash::success(format!("Added \"{}\" to your cart", product.name))).await?;

    Ok(Redirect::to(return_to).into_response())
}

/// Change a line's quantity.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let product_id = parse_product_id(&form.product_id)?;

    if let Some(quantity) = update_quantity(&form.quantity) {
        let mut cart = load_cart(&session).await;
        cart.update_quantity(product_id, quantity);
        store_cart(&session, &cart).await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let product_id = parse_product_id(&form.product_id)?;

    let mut cart = load_cart(&session).await;
    if let Some(line) = cart.line(product_id) {
        let name = line.name.clone();
        cart.remove_item(product_id);
        store_cart(&session, &cart).await?;
        push_flash(&session, Flash::info(format!("Removed \"{name}\" from your cart"))).await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    let mut cart = load_cart(&session).await;
    cart.clear();
    store_cart(&session, &cart).await?;

    Ok(Redirect::to("/cart"))
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {raw}")))
}

/// Quantity to add. A missing or blank field means one; zero, negative or
/// unreadable input adds nothing.
fn add_quantity(raw: Option<&str>) -> Option<u32> {
    let raw = raw.map_or("", str::trim);
    if raw.is_empty() {
        return Some(1);
    }
    raw.parse::<u32>().ok().filter(|q| *q > 0)
}

/// New quantity for a line, or `None` when the input is blank or unreadable.
fn update_quantity(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Accept only same-site absolute paths, so the form cannot redirect offsite.
fn safe_return_path(path: Option<&str>) -> Option<&str> {
    path.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    const PRODUCT_ID: &str = "5d0c6f3a-1d7e-4b55-8d0f-0e7a4a3e9b11";

    fn form_post(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-real-ip", "127.0.0.1")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn test_add_quantity() {
        assert_eq!(add_quantity(None), Some(1));
        assert_eq!(add_quantity(Some("")), Some(1));
        assert_eq!(add_quantity(Some(" 3 ")), Some(3));
        assert_eq!(add_quantity(Some("0")), None);
        assert_eq!(add_quantity(Some("-2")), None);
        assert_eq!(add_quantity(Some("two")), None);
    }

    #[test]
    fn test_update_quantity() {
        assert_eq!(update_quantity("4"), Some(4));
        assert_eq!(update_quantity("-1"), Some(-1));
        assert_eq!(update_quantity(""), None);
        assert_eq!(update_quantity("1.5"), None);
    }

    #[tokio::test]
    async fn test_update_with_blank_quantity_redirects_to_cart() {
        let app = crate::app(AppState::new(StorefrontConfig::for_tests()));

        let response = app
            .oneshot(form_post(
                "/cart/update",
                format!("product_id={PRODUCT_ID}&quantity="),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/cart");
    }

    #[tokio::test]
    async fn test_add_with_negative_quantity_is_a_no_op() {
        let app = crate::app(AppState::new(StorefrontConfig::for_tests()));

        let response = app
            .oneshot(form_post(
                "/cart/add",
                format!("product_id={PRODUCT_ID}&quantity=-2&return_to=/products"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/products");
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/product/abc")), Some("/product/abc"));
        assert_eq!(safe_return_path(Some("//evil.example")), None);
        assert_eq!(safe_return_path(Some("https://evil.example")), None);
        assert_eq!(safe_return_path(Some("/\\evil.example")), None);
        assert_eq!(safe_return_path(None), None);
    }

    #[test]
    fn test_parse_product_id() {
        assert!(parse_product_id(" 5d0c6f3a-1d7e-4b55-8d0f-0e7a4a3e9b11 ").is_ok());
        assert!(matches!(
            parse_product_id("d1"),
            Err(AppError::BadRequest(_))
        ));
    }
}
