//! Session middleware configuration.
//!
//! Sessions live in an in-process `tower-sessions` memory store keyed by an
//! HTTP-only cookie. The session holds the logged-in shopper and their API
//! token; the API itself holds everything else.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use super::auth::{clear_current_session, current_session, update_current_session};
use crate::api::ApiError;
use crate::config::StorefrontConfig;
use crate::error::clear_sentry_user;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopfront_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Paths that never need an up-to-date session.
const UNSESSIONED_PREFIXES: [&str; 2] = ["/static/", "/health"];

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Re-check a stale session token against `GET /auth/profile`.
///
/// Runs at most once per `session_revalidate_interval` for each session. A
/// 401 purges the session so the request continues as anonymous; any other
/// failure keeps the session and tries again on a later request.
pub async fn revalidate_session(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if UNSESSIONED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return next.run(request).await;
    }

    if let Some(mut current) = current_session(&session).await {
        if current.needs_revalidation(state.config().session_revalidate_interval, Utc::now()) {
            match state.api().get_profile(&current.access_token()).await {
                Ok(profile) => {
                    current.refresh(profile);
                    if let Err(e) = update_current_session(&session, &current).await {
                        tracing::warn!(error = %e, "Failed to store revalidated session");
                    }
                }
                Err(ApiError::Unauthorized) => {
                    tracing::info!(user_id = %current.user.id, "Session token rejected on revalidation");
                    if let Err(e) = clear_current_session(&session).await {
                        tracing::error!(error = %e, "Failed to clear expired session");
                    }
                    clear_sentry_user();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session revalidation failed, keeping session");
                }
            }
        }
    }

    next.run(request).await
}
