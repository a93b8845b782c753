//! Home page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use digimart_core::Category;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::HomeSections;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::{CategoryView, PageContext, ProductView, product_views};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryView>,
    pub featured: Vec<ProductView>,
    pub digital: Vec<ProductView>,
    pub physical: Vec<ProductView>,
}

/// Display the home page.
///
/// A catalog failure still renders the page, with empty grids and an error
/// notification.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> HomeTemplate {
    let mut page = PageContext::load(&state, &session, auth.as_ref()).await;

    let sections = match state.catalog().products().await {
        Ok(products) => HomeSections::from_catalog(&products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load catalog for home page");
            page.flashes
                .push(Flash::error("Could not load products").with_message(e.to_string()));
            HomeSections::default()
        }
    };

    HomeTemplate {
        page,
        categories: Category::FEATURED.iter().copied().map(CategoryView::from).collect(),
        featured: product_views(&sections.featured),
        digital: product_views(&sections.digital),
        physical: product_views(&sections.physical),
    }
}
