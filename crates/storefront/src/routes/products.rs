//! Product route handlers.
//!
//! The listing is a search form over an HTMX-refreshed grid. Typing in the
//! search box refetches the grid after a debounce delay; the sort and category
//! selects refetch on change. The form's URL is pushed to history so every
//! listing state is bookmarkable, and a full request to the same URL renders
//! the whole page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header::VARY},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{CategoryId, ProductId, ProductQuery, SortOrder};

use super::views::{
    CategoryOptionView, PagerView, ProductCardView, ProductDetailView, SortOptionView,
};
use super::{ErrorPageTemplate, NotFoundTemplate};
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::{HxRequest, OptionalAuth};
use crate::models::SessionUser;
use crate::state::AppState;

// =============================================================================
// Listing Parameters
// =============================================================================

/// Query string of `GET /products`.
///
/// Every field is a raw string so that a blank select (`category=`) or a
/// hand-edited URL degrades to the default instead of a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
}

impl ListingParams {
    /// Trimmed search text, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Requested sort order, defaulting to newest.
    #[must_use]
    pub fn sort(&self) -> SortOrder {
        self.sort
            .as_deref()
            .map(SortOrder::from_param)
            .unwrap_or_default()
    }

    /// Requested category filter; unparsable values mean "all".
    #[must_use]
    pub fn category(&self) -> Option<CategoryId> {
        self.category.as_deref().and_then(|c| c.parse().ok())
    }

    /// Requested page, at least 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// The API query for these parameters.
    #[must_use]
    pub fn to_query(&self, limit: u32) -> ProductQuery {
        ProductQuery {
            search: self.search().map(str::to_string),
            sort: self.sort(),
            category: self.category(),
            page: self.page(),
            limit,
        }
    }

    /// Canonical storefront URL for this listing at `page`, omitting defaults.
    #[must_use]
    pub fn href(&self, page: u32) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(search) = self.search() {
            query.append_pair("q", search);
        }
        if self.sort() != SortOrder::default() {
            query.append_pair("sort", self.sort().as_param());
        }
        if let Some(category) = self.category() {
            query.append_pair("category", &category.to_string());
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }

        let query = query.finish();
        if query.is_empty() {
            "/products".to_string()
        } else {
            format!("/products?{query}")
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// The product grid: results, pager, or an inline error.
#[derive(Debug, Clone)]
pub struct ProductGridView {
    pub products: Vec<ProductCardView>,
    pub pager: Option<PagerView>,
    pub error: Option<String>,
    /// URL that reloads this grid state.
    pub retry_url: String,
    pub searched: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub user: Option<SessionUser>,
    pub search: String,
    pub sort_options: Vec<SortOptionView>,
    pub category_options: Vec<CategoryOptionView>,
    pub debounce_ms: u32,
    pub grid: ProductGridView,
}

/// Product grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub grid: ProductGridView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub user: Option<SessionUser>,
    pub product: ProductDetailView,
    pub notice: Option<String>,
    pub cart_error: Option<String>,
}

/// Flash parameters set by the non-HTMX add-to-cart fallback.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFlashQuery {
    pub added: Option<String>,
    pub cart_error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Load one grid state from the API.
async fn load_grid(state: &AppState, params: &ListingParams) -> Result<ProductGridView> {
    let query = params.to_query(state.config().catalog.page_size);
    let retry_url = params.href(query.page);

    let grid = match state.api().list_products(&query).await {
        Ok(page) => ProductGridView {
            products: page.products.iter().map(ProductCardView::from).collect(),
            pager: Some(PagerView::new(&page.pagination, |p| params.href(p)))
                .filter(PagerView::is_visible),
            error: None,
            retry_url,
            searched: params.search().is_some() || params.category().is_some(),
        },
        Err(e) => ProductGridView {
            products: Vec::new(),
            pager: None,
            error: Some(e.recoverable()?),
            retry_url,
            searched: false,
        },
    };

    Ok(grid)
}

/// Display product listing page, or only its grid for HTMX requests.
#[instrument(skip(state, current))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    HxRequest(fragment): HxRequest,
    Query(params): Query<ListingParams>,
) -> Result<Response> {
    let grid = load_grid(&state, &params).await?;

    let mut response = if fragment {
        ProductGridTemplate { grid }.into_response()
    } else {
        // The filter select degrades to "all" when categories are unavailable
        let categories = state.api().list_categories().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load categories for filter");
            Vec::new()
        });

        ProductsIndexTemplate {
            user: current.map(|c| c.user),
            search: params.search().unwrap_or_default().to_string(),
            sort_options: SortOptionView::all(params.sort()),
            category_options: CategoryOptionView::all(&categories, params.category()),
            debounce_ms: state.config().catalog.search_debounce_ms,
            grid,
        }
        .into_response()
    };

    // Fragment and full page share a URL
    response
        .headers_mut()
        .insert(VARY, HeaderValue::from_static("HX-Request"));
    Ok(response)
}

/// Display product detail page.
#[instrument(skip(state, current, flash), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Path(id): Path<ProductId>,
    Query(flash): Query<ProductFlashQuery>,
) -> Result<Response> {
    let user = current.map(|c| c.user);

    match state.api().get_product(id).await {
        Ok(product) => Ok(ProductShowTemplate {
            user,
            product: ProductDetailView::from(&product),
            notice: flash
                .added
                .is_some()
                .then(|| "Added to your cart.".to_string()),
            cart_error: flash.cart_error.filter(|e| !e.trim().is_empty()),
        }
        .into_response()),
        Err(ApiError::NotFound(_)) => Ok((
            StatusCode::NOT_FOUND,
            NotFoundTemplate {
                user,
                message: "This product doesn't exist or is no longer available.".to_string(),
            },
        )
            .into_response()),
        Err(e) => {
            let message = e.recoverable()?;
            Ok((
                StatusCode::BAD_GATEWAY,
                ErrorPageTemplate {
                    user,
                    title: "Product unavailable".to_string(),
                    message,
                    retry_url: format!("/products/{id}"),
                },
            )
                .into_response())
        }
    }
}
