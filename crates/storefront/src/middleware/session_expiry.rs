//! Global handling of API session expiry.
//!
//! Any handler that hits a 401 from the API returns
//! `AppError::Api(ApiError::Unauthorized)`, which renders as a login redirect
//! tagged with [`SessionExpired`]. This middleware sees the tag, purges the
//! session, and rewrites the redirect so it carries the original destination
//! (or an `HX-Redirect` header for HTMX requests).

use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use super::auth::{clear_current_session, destination_for, login_url, redirect_response};
use super::htmx::is_htmx;
use crate::error::{SessionExpired, clear_sentry_user};

/// Query value shown on the login page after an expired session.
pub const SESSION_EXPIRED_ERROR: &str = "session_expired";

/// Purge the session and redirect to login when a handler reports expiry.
pub async fn expire_session_on_unauthorized(
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let htmx = is_htmx(request.headers());
    let destination = destination_for(request.method(), request.headers(), request.uri());

    let response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    if let Err(e) = clear_current_session(&session).await {
        tracing::error!(error = %e, "Failed to purge expired session");
    }
    clear_sentry_user();

    redirect_response(&login_url(&destination, Some(SESSION_EXPIRED_ERROR)), htmx)
}
