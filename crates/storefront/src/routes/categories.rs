//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{CategoryId, ProductQuery};

use super::views::{CategoryView, PagerView, ProductCardView};
use super::{ErrorPageTemplate, NotFoundTemplate};
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::SessionUser;
use crate::state::AppState;

/// Category listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub user: Option<SessionUser>,
    pub categories: Vec<CategoryView>,
    pub error: Option<String>,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub user: Option<SessionUser>,
    pub category: CategoryView,
    pub products: Vec<ProductCardView>,
    pub pager: Option<PagerView>,
    pub products_error: Option<String>,
    pub retry_url: String,
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

fn category_href(id: CategoryId, page: u32) -> String {
    if page > 1 {
        format!("/categories/{id}?page={page}")
    } else {
        format!("/categories/{id}")
    }
}

/// Display all categories.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<CategoriesIndexTemplate> {
    let (categories, error) = match state.api().list_categories().await {
        Ok(categories) => (categories.iter().map(CategoryView::from).collect(), None),
        Err(e) => (Vec::new(), Some(e.recoverable()?)),
    };

    Ok(CategoriesIndexTemplate {
        user: current.map(|c| c.user),
        categories,
        error,
    })
}

/// Display one category and a page of its products.
#[instrument(skip(state, current), fields(category_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Path(id): Path<CategoryId>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let user = current.map(|c| c.user);

    let category = match state.api().get_category(id).await {
        Ok(category) => category,
        Err(ApiError::NotFound(_)) => {
            return Ok((
                StatusCode::NOT_FOUND,
                NotFoundTemplate {
                    user,
                    message: "This category doesn't exist.".to_string(),
                },
            )
                .into_response());
        }
        Err(e) => {
            let message = e.recoverable()?;
            return Ok((
                StatusCode::BAD_GATEWAY,
                ErrorPageTemplate {
                    user,
                    title: "Category unavailable".to_string(),
                    message,
                    retry_url: category_href(id, query.page()),
                },
            )
                .into_response());
        }
    };

    let product_query = ProductQuery {
        category: Some(id),
        page: query.page(),
        ..ProductQuery::new(state.config().catalog.page_size)
    };

    let (products, pager, products_error) = match state.api().list_products(&product_query).await
    {
        Ok(page) => (
            page.products.iter().map(ProductCardView::from).collect(),
            Some(PagerView::new(&page.pagination, |p| category_href(id, p)))
                .filter(PagerView::is_visible),
            None,
        ),
        Err(e) => (Vec::new(), None, Some(e.recoverable()?)),
    };

    Ok(CategoryShowTemplate {
        user,
        category: CategoryView::from(&category),
        products,
        pager,
        products_error,
        retry_url: category_href(id, query.page()),
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_href() {
        assert_eq!(category_href(CategoryId::new(3), 1), "/categories/3");
        assert_eq!(category_href(CategoryId::new(3), 2), "/categories/3?page=2");
    }

    #[test]
    fn test_page_query() {
        assert_eq!(PageQuery::default().page(), 1);
        assert_eq!(PageQuery { page: Some("0".to_string()) }.page(), 1);
        assert_eq!(PageQuery { page: Some("4".to_string()) }.page(), 4);
    }
}
