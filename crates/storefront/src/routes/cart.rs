//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The API owns the cart: every mutation is followed by a full refetch and the
//! refetched cart replaces whatever was on screen. Successful mutations fire a
//! `cart-updated` event so the navigation badge reloads its count.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderValue,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{ProductId, clamp_quantity};

use super::views::CartView;
use crate::api::{ApiError, CartMutation, CartSync};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::htmx::{CART_UPDATED_EVENT, HX_TRIGGER};
use crate::middleware::{HxRequest, OptionalAuth, RequireAuth};
use crate::models::SessionUser;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub quantity: String,
}

/// Flash parameters set by the non-HTMX fallbacks.
#[derive(Debug, Default, Deserialize)]
pub struct CartFlashQuery {
    pub error: Option<String>,
}

/// Parse a quantity field; blank or garbage means 1.
fn parse_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(|q| q.trim().parse::<u32>().ok()).unwrap_or(1)
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: Option<SessionUser>,
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Add-to-cart outcome fragment shown under the product form (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_to_cart_result.html")]
pub struct AddToCartResultTemplate {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Attach the `cart-updated` event to a response.
fn with_cart_updated(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(HX_TRIGGER, HeaderValue::from_static(CART_UPDATED_EVENT));
    response
}

fn cart_url(error: Option<&str>) -> String {
    error.map_or_else(
        || "/cart".to_string(),
        |error| format!("/cart?error={}", urlencoding::encode(error)),
    )
}

/// Render the settled cart after a mutation and its refetch.
///
/// HTMX requests get the cart items fragment; plain form posts are redirected
/// back to the cart page.
fn respond_with_cart(sync: CartSync, fragment: bool) -> Result<Response> {
    if sync.session_expired() {
        return Err(ApiError::Unauthorized.into());
    }

    let mutation_error = match sync.mutation {
        Ok(()) => None,
        Err(e) => Some(e.recoverable()?),
    };
    let mutated = mutation_error.is_none();

    if !fragment {
        return Ok(Redirect::to(&cart_url(mutation_error.as_deref())).into_response());
    }

    let (cart, load_error) = match sync.cart {
        Ok(cart) => (Some(CartView::from(&cart)), None),
        Err(e) => (None, Some(e.recoverable()?)),
    };

    let response = CartItemsTemplate {
        cart,
        error: mutation_error.or(load_error),
    }
    .into_response();

    Ok(if mutated {
        with_cart_updated(response)
    } else {
        response
    })
}

/// Clamp a requested quantity to the product's stock.
///
/// Stock comes from the (cached) product. If the product cannot be loaded the
/// request goes through unclamped beyond the lower bound, and the API has the
/// final word.
async fn clamp_to_stock(state: &AppState, product_id: ProductId, requested: u32) -> Result<u32> {
    match state.api().get_product(product_id).await {
        Ok(product) => Ok(clamp_quantity(requested, product.stock)),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, %product_id, "Could not load product stock for clamping");
            Ok(requested.max(1))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(flash): Query<CartFlashQuery>,
) -> Result<CartShowTemplate> {
    let (cart, load_error) = match state.api().get_cart(&current.access_token()).await {
        Ok(cart) => (Some(CartView::from(&cart)), None),
        Err(e) => (None, Some(e.recoverable()?)),
    };

    Ok(CartShowTemplate {
        user: Some(current.user),
        cart,
        error: flash.error.filter(|e| !e.trim().is_empty()).or(load_error),
    })
}

/// Add item to cart (HTMX).
///
/// Returns a result fragment and fires `cart-updated`. Plain form posts are
/// redirected back to the product page with a flash parameter.
#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    HxRequest(fragment): HxRequest,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let requested = parse_quantity(form.quantity.as_deref());

    let stock = match state.api().get_product(form.product_id).await {
        Ok(product) => product.stock,
        Err(ApiError::NotFound(_)) => {
            return Ok(add_result(
                fragment,
                form.product_id,
                Err("This product is no longer available.".to_string()),
            ));
        }
        Err(e) => {
            let message = e.recoverable()?;
            return Ok(add_result(fragment, form.product_id, Err(message)));
        }
    };

    if stock == 0 {
        return Ok(add_result(
            fragment,
            form.product_id,
            Err("This product is out of stock.".to_string()),
        ));
    }

    let quantity = clamp_quantity(requested, stock);
    let sync = state
        .api()
        .mutate_and_refetch(
            &current.access_token(),
            CartMutation::Add {
                product_id: form.product_id,
                quantity,
            },
        )
        .await;

    if sync.session_expired() {
        return Err(AppError::Api(ApiError::Unauthorized));
    }

    let outcome = match sync.mutation {
        Ok(()) => {
            let count = sync.cart.as_ref().map_or(0, |cart| cart.item_count);
            Ok(match count {
                0 => "Added to your cart.".to_string(),
                1 => "Added to your cart (1 item).".to_string(),
                n => format!("Added to your cart ({n} items)."),
            })
        }
        Err(e) => Err(e.recoverable()?),
    };

    Ok(add_result(fragment, form.product_id, outcome))
}

fn add_result(
    fragment: bool,
    product_id: ProductId,
    outcome: std::result::Result<String, String>,
) -> Response {
    let success = outcome.is_ok();
    if !fragment {
        let location = match &outcome {
            Ok(_) => format!("/products/{product_id}?added=1"),
            Err(message) => format!(
                "/products/{product_id}?cart_error={}",
                urlencoding::encode(message)
            ),
        };
        return Redirect::to(&location).into_response();
    }

    let response = AddToCartResultTemplate {
        success,
        message: outcome.unwrap_or_else(|message| message),
    }
    .into_response();

    if success {
        with_cart_updated(response)
    } else {
        response
    }
}

/// Update a cart line's quantity (HTMX).
#[instrument(skip(state, current, form), fields(user_id = %current.user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    HxRequest(fragment): HxRequest,
    Path(product_id): Path<ProductId>,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Response> {
    let quantity = clamp_to_stock(&state, product_id, parse_quantity(Some(&form.quantity))).await?;

    let sync = state
        .api()
        .mutate_and_refetch(
            &current.access_token(),
            CartMutation::SetQuantity {
                product_id,
                quantity,
            },
        )
        .await;

    respond_with_cart(sync, fragment)
}

/// Remove a cart line (HTMX).
#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    HxRequest(fragment): HxRequest,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    let sync = state
        .api()
        .mutate_and_refetch(&current.access_token(), CartMutation::Remove { product_id })
        .await;

    respond_with_cart(sync, fragment)
}

/// Empty the cart (HTMX).
#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    HxRequest(fragment): HxRequest,
) -> Result<Response> {
    let sync = state
        .api()
        .mutate_and_refetch(&current.access_token(), CartMutation::Clear)
        .await;

    respond_with_cart(sync, fragment)
}

/// Get cart count badge (HTMX).
///
/// Anonymous visitors and API failures show 0. A 401 still propagates so an
/// expired session is noticed from any page.
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<CartCountTemplate> {
    let Some(current) = current else {
        return Ok(CartCountTemplate { count: 0 });
    };

    let count = match state.api().get_cart(&current.access_token()).await {
        Ok(cart) => cart.item_count,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart count");
            0
        }
    };

    Ok(CartCountTemplate { count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header::LOCATION};
    use shopfront_core::Cart;

    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(None), 1);
        assert_eq!(parse_quantity(Some("")), 1);
        assert_eq!(parse_quantity(Some(" 4 ")), 4);
        assert_eq!(parse_quantity(Some("-2")), 1);
        assert_eq!(parse_quantity(Some("0")), 0);
    }

    #[test]
    fn test_cart_url() {
        assert_eq!(cart_url(None), "/cart");
        assert_eq!(
            cart_url(Some("Insufficient stock")),
            "/cart?error=Insufficient%20stock"
        );
    }

    #[test]
    fn test_successful_mutation_triggers_cart_updated() {
        let sync = CartSync {
            mutation: Ok(()),
            cart: Ok(Cart::default()),
        };
        let response = respond_with_cart(sync, true).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(HX_TRIGGER).unwrap(), CART_UPDATED_EVENT);
    }

    #[test]
    fn test_failed_mutation_renders_refetched_cart_without_event() {
        let sync = CartSync {
            mutation: Err(ApiError::Rejected {
                status: 400,
                message: "Insufficient stock".to_string(),
            }),
            cart: Ok(Cart::default()),
        };
        let response = respond_with_cart(sync, true).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(HX_TRIGGER).is_none());
    }

    #[test]
    fn test_plain_post_redirects_to_cart_with_error() {
        let sync = CartSync {
            mutation: Err(ApiError::Rejected {
                status: 422,
                message: "Bad quantity".to_string(),
            }),
            cart: Ok(Cart::default()),
        };
        let response = respond_with_cart(sync, false).unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/cart?error=Bad%20quantity"
        );
    }

    #[test]
    fn test_expired_session_is_propagated() {
        let sync = CartSync {
            mutation: Ok(()),
            cart: Err(ApiError::Unauthorized),
        };
        assert!(matches!(
            respond_with_cart(sync, true),
            Err(AppError::Api(ApiError::Unauthorized))
        ));
    }

    #[test]
    fn test_add_result_fallback_redirects_to_product() {
        let response = add_result(false, ProductId::new(7), Ok("Added".to_string()));
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/products/7?added=1"
        );

        let response = add_result(true, ProductId::new(7), Err("Out of stock".to_string()));
        assert!(response.headers().get(HX_TRIGGER).is_none());
    }
}
