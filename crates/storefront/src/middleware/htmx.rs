//! HTMX request detection and response header names.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

/// Request header HTMX sets on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Request header HTMX sets when restoring a page missing from its history cache.
pub const HX_HISTORY_RESTORE_REQUEST: &str = "hx-history-restore-request";

/// Request header carrying the browser's current URL.
pub const HX_CURRENT_URL: &str = "hx-current-url";

/// Response header asking HTMX to perform a full client-side redirect.
pub const HX_REDIRECT: &str = "hx-redirect";

/// Response header asking HTMX to fire client-side events.
pub const HX_TRIGGER: &str = "hx-trigger";

/// Event fired after every cart mutation; the navigation badge listens for it.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Whether the request was issued by HTMX rather than a full navigation.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"true"))
}

/// Extractor reporting whether the request wants a fragment.
///
/// True for HTMX requests, except history restores, which need the full page.
#[derive(Debug, Clone, Copy)]
pub struct HxRequest(pub bool);

impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let restore = parts.headers.contains_key(HX_HISTORY_RESTORE_REQUEST);
        Ok(Self(is_htmx(&parts.headers) && !restore))
    }
}
