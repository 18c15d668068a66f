//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (API reachable)
//!
//! # Catalog
//! GET  /products               - Product listing (grid fragment for HTMX)
//! GET  /products/{id}          - Product detail
//! GET  /categories             - Category listing
//! GET  /categories/{id}        - Category detail with its products
//!
//! # Cart (requires auth, HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns result fragment, triggers cart-updated)
//! POST /cart/items/{id}        - Update quantity (returns cart_items fragment)
//! POST /cart/items/{id}/remove - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment, public)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action (rate limited)
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Profile
//! POST /account                - Update profile
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod home;
pub mod products;
pub mod views;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::filters;
use crate::middleware::{OptionalAuth, auth_rate_limiter};
use crate::models::SessionUser;
use crate::state::AppState;

// =============================================================================
// Shared Templates
// =============================================================================

/// Full-page error with a retry link.
#[derive(Template, WebTemplate)]
#[template(path = "errors/page.html")]
pub struct ErrorPageTemplate {
    pub user: Option<SessionUser>,
    pub title: String,
    pub message: String,
    pub retry_url: String,
}

/// Not found page.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub user: Option<SessionUser>,
    pub message: String,
}

/// Fallback for unknown paths.
pub async fn not_found(OptionalAuth(current): OptionalAuth) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            user: current.map(|c| c.user),
            message: "We couldn't find the page you were looking for.".to_string(),
        },
    )
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
///
/// Only the credential-submitting POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{id}", get(categories::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/items/{product_id}", post(cart::update))
        .route("/items/{product_id}/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(account::index).post(account::update))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/cart", cart_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .nest("/health", health_routes())
        .fallback(not_found)
}
