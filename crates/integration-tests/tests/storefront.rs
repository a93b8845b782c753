//! Live storefront tests.
//!
//! Require a running storefront with at least one in-stock product in the
//! catalog (`dm-cli seed products crates/cli/seed/products.yaml`).

use digimart_integration_tests::{TestContext, location, product_ids};
use reqwest::StatusCode;

/// First product linked from the catalog page.
async fn any_product_id(ctx: &TestContext) -> String {
    let html = ctx
        .storefront_get("/products")
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    product_ids(&html)
        .first()
        .expect("catalog has no products; seed it first")
        .to_string()
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let response = ctx.storefront_get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = ctx.storefront_get("/health/ready").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_home_and_catalog_render() {
    let ctx = TestContext::new();

    let response = ctx.storefront_get("/").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("DigiMart"));

    for path in [
        "/products",
        "/products?type=digital",
        "/products?type=physical&category=electronics",
        "/products?sort=price-low",
    ] {
        let response = ctx.storefront_get(path).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new();

    let path = format!("/product/{}", uuid::Uuid::new_v4());
    let response = ctx.storefront_get(&path).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx.storefront_get("/product/not-a-uuid").await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_cart_lifecycle() {
    let ctx = TestContext::new();
    let product_id = any_product_id(&ctx).await;

    let response = ctx
        .storefront_post("/cart/add", &[("product_id", &product_id), ("quantity", "2")])
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/cart"));

    let html = ctx.storefront_get("/cart").await.unwrap().text().await.unwrap();
    assert!(html.contains(&product_id));
    assert!(!html.contains("Your cart is empty."));

    // Quantity zero removes the line
    let response = ctx
        .storefront_post("/cart/update", &[("product_id", &product_id), ("quantity", "0")])
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = ctx.storefront_get("/cart").await.unwrap().text().await.unwrap();
    assert!(html.contains("Your cart is empty."));
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_checkout_requires_items_and_valid_details() {
    let ctx = TestContext::new();

    let response = ctx.storefront_get("/checkout").await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/cart"));

    let product_id = any_product_id(&ctx).await;
    ctx.storefront_post("/cart/add", &[("product_id", &product_id)])
        .await
        .unwrap();

    let response = ctx.storefront_get("/checkout").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .storefront_post("/checkout", &[("email", "not-an-email")])
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The cart survives a rejected checkout
    let html = ctx.storefront_get("/cart").await.unwrap().text().await.unwrap();
    assert!(html.contains(&product_id));

    ctx.storefront_post("/cart/clear", &[]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_sign_in_validates_locally() {
    let ctx = TestContext::new();

    let response = ctx.storefront_get("/auth").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .storefront_post("/auth/login", &[("email", "shopper@example.com"), ("password", "123")])
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "requires running storefront"]
async fn test_reviews_require_sign_in() {
    let ctx = TestContext::new();
    let product_id = any_product_id(&ctx).await;

    let response = ctx
        .storefront_post(
            &format!("/product/{product_id}/reviews"),
            &[("rating", "5"), ("comment", "Great")],
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).is_some_and(|l| l.starts_with("/auth")));
}
