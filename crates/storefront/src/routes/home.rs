//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use shopfront_core::{ProductQuery, SortOrder};

use super::views::{CategoryView, ProductCardView};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::SessionUser;
use crate::state::AppState;

/// Number of top-rated products featured on the home page.
const FEATURED_PRODUCT_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<SessionUser>,
    pub featured: Vec<ProductCardView>,
    pub featured_error: Option<String>,
    pub categories: Vec<CategoryView>,
    pub categories_error: Option<String>,
}

/// Display the home page.
///
/// Featured products and categories load independently; either can fail
/// without taking the other down.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<HomeTemplate> {
    let featured_query = ProductQuery {
        sort: SortOrder::Rating,
        ..ProductQuery::new(FEATURED_PRODUCT_COUNT)
    };

    let (products, categories) = tokio::join!(
        state.api().list_products(&featured_query),
        state.api().list_categories(),
    );

    let (featured, featured_error) = match products {
        Ok(page) => (page.products.iter().map(ProductCardView::from).collect(), None),
        Err(e) => (Vec::new(), Some(e.recoverable()?)),
    };

    let (categories, categories_error) = match categories {
        Ok(categories) => (categories.iter().map(CategoryView::from).collect(), None),
        Err(e) => (Vec::new(), Some(e.recoverable()?)),
    };

    Ok(HomeTemplate {
        user: current.map(|c| c.user),
        featured,
        featured_error,
        categories,
        categories_error,
    })
}
