//! Catalog and product detail handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use digimart_core::validation::{self, FieldErrors};
use digimart_core::{ProductId, ProductType};
use digimart_supabase::types::{NewReview, Review};
use digimart_supabase::{AuthSession, GatewayError};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::{CatalogFilter, SortKey, listing};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{Flash, push_flash};
use crate::state::AppState;
use crate::views::{PageContext, ProductView, ReviewView, product_views};

/// `/products` query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// A link in the filter bar.
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub title: String,
    pub products: Vec<ProductView>,
    pub type_options: Vec<FilterOption>,
    pub sort_options: Vec<FilterOption>,
    pub category: Option<String>,
    pub type_value: &'static str,
    pub sort_value: &'static str,
    pub is_filtered: bool,
}

/// Review form values and errors for re-rendering.
#[derive(Default)]
pub struct ReviewFormView {
    pub rating: String,
    pub comment: String,
    pub rating_error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductView,
    pub reviews: Vec<ReviewView>,
    pub related: Vec<ProductView>,
    pub signed_in: bool,
    pub review_form: ReviewFormView,
}

/// Product not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub page: PageContext,
}

/// Display product listing page.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> ProductsIndexTemplate {
    let mut page = PageContext::load(&state, &session, auth.as_ref()).await;
    let filter = CatalogFilter::from_query(
        query.product_type.as_deref(),
        query.category.as_deref(),
        query.sort.as_deref(),
    );

    let products = match state.catalog().products().await {
        Ok(products) => filter.apply(&products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load catalog");
            page.flashes
                .push(Flash::error("Could not load products").with_message(e.to_string()));
            Vec::new()
        }
    };

    let type_value = filter.product_type.map_or("all", |t| t.as_str());
    let type_options = [
        ("all", "All"),
        (ProductType::Digital.as_str(), "Digital"),
        (ProductType::Physical.as_str(), "Physical"),
    ]
    .into_iter()
    .map(|(value, label)| FilterOption {
        value,
        label,
        selected: value == type_value,
    })
    .collect();

    let sort_options = SortKey::ALL
        .iter()
        .map(|key| FilterOption {
            value: key.as_str(),
            label: key.label(),
            selected: *key == filter.sort,
        })
        .collect();

    ProductsIndexTemplate {
        page,
        title: filter.title(),
        products: product_views(&products),
        type_options,
        sort_options,
        type_value,
        sort_value: filter.sort.as_str(),
        is_filtered: filter.is_filtered(),
        category: filter.category,
    }
}

/// Display product detail page.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    render_show(&state, &session, auth.as_ref(), &id, ReviewFormView::default()).await
}

async fn render_show(
    state: &AppState,
    session: &Session,
    auth: Option<&AuthSession>,
    id: &str,
    review_form: ReviewFormView,
) -> Result<Response> {
    let mut page = PageContext::load(state, session, auth).await;

    let Ok(product_id) = id.parse::<ProductId>() else {
        return Ok(not_found(page));
    };

    let product = match state.catalog().product(product_id).await {
        Ok(product) => product,
        Err(GatewayError::NotFound(_)) => return Ok(not_found(page)),
        Err(e) => return Err(e.into()),
    };

    let reviews = state
        .catalog()
        .approved_reviews(product_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load reviews");
            page.flashes.push(Flash::error("Could not load reviews"));
            Vec::new()
        });

    let related = match state.catalog().products().await {
        Ok(products) => listing::related(&product, &products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load related products");
            Vec::new()
        }
    };

    Ok(ProductShowTemplate {
        page,
        product: ProductView::from(&product),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        related: product_views(&related),
        signed_in: auth.is_some(),
        review_form,
    }
    .into_response())
}

fn not_found(page: PageContext) -> Response {
    (StatusCode::NOT_FOUND, ProductNotFoundTemplate { page }).into_response()
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

/// Submit a review. Reviews wait for moderation before they are shown.
#[instrument(skip(state, session, auth, form), fields(user_id = %auth.user.id))]
pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let product_id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;

    let mut errors = FieldErrors::new();
    let rating = errors.check("rating", validation::rating(&form.rating));

    let Some(rating) = rating else {
        let review_form = ReviewFormView {
            rating_error: errors.get("rating"),
            rating: form.rating,
            comment: form.comment,
        };
        return render_show(&state, &session, Some(&auth), &id, review_form)
            .await
            .map(|r| (StatusCode::UNPROCESSABLE_ENTITY, r).into_response());
    };

    let review = NewReview {
        product_id,
        user_id: Some(auth.user.id),
        user_name: auth.user.display_name().to_string(),
        rating,
        comment: validation::optional(&form.comment),
        is_approved: false,
    };

    let flash = match state
        .gateway()
        .as_user(&auth.access_token)
        .insert::<Review, _>(&review)
        .await
    {
        Ok(_) => {
            tracing::info!(%product_id, rating, "Review submitted");
            Flash::success("Thanks for your review!")
                .with_message("It will appear once a moderator approves it.")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to submit review");
            Flash::error("Could not submit review").with_message(e.to_string())
        }
    };
    push_flash(&session, flash).await?;

    Ok(Redirect::to(&format!("/product/{product_id}")).into_response())
}
