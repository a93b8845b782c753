//! Product management route handlers.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use digimart_core::validation::{self, FieldErrors, ValidationError};
use digimart_core::{Category, ProductId, ProductType};
use digimart_supabase::types::{Product, ProductInput};
use digimart_supabase::{GatewayError, Select};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{FilterOption, ListQuery, matches_search};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, Flash, push_flash};
use crate::state::AppState;
use crate::views::{PageContext, ProductRowView};

/// Product form data.
///
/// Every field arrives as text; checkboxes are present only when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub original_price: String,
    pub image: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub category: String,
    pub in_stock: Option<String>,
    pub stock_quantity: String,
    pub featured: Option<String>,
    pub download_url: String,
    pub file_size: String,
    pub file_format: String,
}

impl ProductForm {
    /// Defaults for a new product.
    fn blank() -> Self {
        Self {
            product_type: ProductType::Digital.as_str().to_string(),
            in_stock: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// Validate into an insert/update payload.
    ///
    /// Name and category are required; prices must be non-negative.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> std::result::Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = errors.check("name", validation::required(&self.name));
        let category = errors.check("category", validation::required(&self.category));
        let price = errors.check("price", validation::price(&self.price));
        let original_price = errors.check(
            "original_price",
            validation::optional_price(&self.original_price),
        );
        let stock_quantity = errors.check(
            "stock_quantity",
            validation::optional_count(&self.stock_quantity),
        );
        let product_type = errors.check(
            "type",
            self.product_type
                .parse::<ProductType>()
                .map_err(|_| ValidationError::Required),
        );

        match (name, category, price, original_price, stock_quantity, product_type) {
            (
                Some(name),
                Some(category),
                Some(price),
                Some(original_price),
                Some(stock_quantity),
                Some(product_type),
            ) if errors.is_empty() => Ok(ProductInput {
                name,
                description: validation::optional(&self.description),
                price,
                original_price,
                image: validation::optional(&self.image),
                product_type,
                category: category.to_lowercase(),
                in_stock: self.in_stock.is_some(),
                stock_quantity,
                featured: self.featured.is_some(),
                download_url: validation::optional(&self.download_url),
                file_size: validation::optional(&self.file_size),
                file_format: validation::optional(&self.file_format),
                rating: None,
                reviews_count: None,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(p: &Product) -> Self {
        let text = |v: Option<&String>| v.cloned().unwrap_or_default();
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price.amount().normalize().to_string(),
            original_price: p
                .original_price
                .map(|o| o.amount().normalize().to_string())
                .unwrap_or_default(),
            image: p.image.clone(),
            product_type: p.product_type.as_str().to_string(),
            category: p.category.clone(),
            in_stock: p.in_stock.then(|| "on".to_string()),
            stock_quantity: p.stock_quantity.map(|q| q.to_string()).unwrap_or_default(),
            featured: p.featured.then(|| "on".to_string()),
            download_url: text(p.download_url.as_ref()),
            file_size: text(p.file_size.as_ref()),
            file_format: text(p.file_format.as_ref()),
        }
    }
}

/// Products list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductRowView>,
    pub q: String,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    /// `None` when creating.
    pub product_id: Option<String>,
    pub form: ProductForm,
    pub errors: HashMap<&'static str, String>,
    pub type_options: Vec<FilterOption>,
    pub category_options: Vec<FilterOption>,
}

impl ProductFormTemplate {
    fn new(page: PageContext, product_id: Option<ProductId>, form: ProductForm) -> Self {
        Self {
            page,
            product_id: product_id.map(|id| id.to_string()),
            type_options: FilterOption::list(
                ProductType::ALL.iter().map(|t| (t.as_str(), t.label())),
                &form.product_type,
                false,
            ),
            category_options: FilterOption::list(
                Category::ALL.iter().map(|c| (c.as_str(), c.label())),
                &form.category,
                false,
            ),
            form,
            errors: HashMap::new(),
        }
    }

    fn with_errors(mut self, errors: &FieldErrors) -> Self {
        self.errors = errors.iter().map(|(f, e)| (f, e.to_string())).collect();
        self
    }
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new_form))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit_form))
        .route("/products/{id}/delete", post(delete))
}

/// Products list, searchable by name and category.
///
/// GET /products
#[instrument(skip(admin, state, session))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> ProductsIndexTemplate {
    let mut page = PageContext::load(&state, &session, &admin, "/products").await;

    let products = match state
        .gateway_for(&admin)
        .select::<Product>(&Select::newest())
        .await
    {
        Ok(products) => products,
        Err(e) => {
            page.gateway_failure("products", &e);
            Vec::new()
        }
    };

    let needle = query.needle();
    ProductsIndexTemplate {
        page,
        products: products
            .iter()
            .filter(|p| matches_search(needle.as_deref(), &[p.name.as_str(), p.category.as_str()]))
            .map(ProductRowView::from)
            .collect(),
        q: query.q,
    }
}

/// GET /products/new
#[instrument(skip_all)]
async fn new_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> ProductFormTemplate {
    let page = PageContext::load(&state, &session, &admin, "/products").await;
    ProductFormTemplate::new(page, None, ProductForm::blank())
}

/// POST /products
#[instrument(skip_all)]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    save(&state, &session, &admin, None, form).await
}

/// GET /products/{id}/edit
#[instrument(skip(admin, state, session))]
async fn edit_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let product = state
        .gateway_for(&admin)
        .find::<Product>(id)
        .await
        .map_err(|e| not_found_or(e, id))?;

    let page = PageContext::load(&state, &session, &admin, "/products").await;
    Ok(ProductFormTemplate::new(page, Some(id), ProductForm::from(&product)))
}

/// POST /products/{id}
#[instrument(skip(admin, state, session, form))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    save(&state, &session, &admin, Some(id), form).await
}

/// POST /products/{id}/delete
#[instrument(skip(admin, state, session))]
async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let flash = match state.gateway_for(&admin).delete::<Product>(id).await {
        Ok(()) => {
            add_breadcrumb("products", "Deleted product", &id);
            tracing::info!(product_id = %id, "Product deleted");
            Flash::success("Product deleted")
        }
        Err(e) => {
            tracing::error!(product_id = %id, error = %e, "Failed to delete product");
            Flash::error(format!("Could not delete product: {e}"))
        }
    };

    push_flash(&session, flash).await?;
    Ok(Redirect::to("/products"))
}

/// Validate and insert or update, re-rendering the form on failure.
async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    id: Option<ProductId>,
    form: ProductForm,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = PageContext::load(state, session, admin, "/products").await;
            let template = ProductFormTemplate::new(page, id, form).with_errors(&errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    let gateway = state.gateway_for(admin);
    let result = match id {
        Some(id) => gateway
            .update::<Product, _>(id, &input)
            .await
            .map_err(|e| not_found_or(e, id)),
        None => gateway
            .insert::<Product, _>(&input)
            .await
            .map_err(AppError::from),
    };

    match result {
        Ok(product) => {
            let message = if id.is_some() {
                "Product updated"
            } else {
                "Product created"
            };
            add_breadcrumb("products", message, &product.id);
            tracing::info!(product_id = %product.id, "{message}");
            push_flash(session, Flash::success(format!("{message}: {}", product.name))).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e @ AppError::NotFound(_)) => Err(e),
        Err(e) => {
            tracing::error!(error = %e, "Failed to save product");
            let mut page = PageContext::load(state, session, admin, "/products").await;
            page.flashes
                .push(Flash::error(format!("Could not save product: {e}")));
            let template = ProductFormTemplate::new(page, id, form);
            Ok((StatusCode::BAD_GATEWAY, template).into_response())
        }
    }
}

fn not_found_or(e: GatewayError, id: ProductId) -> AppError {
    match e {
        GatewayError::NotFound(_) => AppError::NotFound(format!("product {id}")),
        other => other.into(),
    }
}
