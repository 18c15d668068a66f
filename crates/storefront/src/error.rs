//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! An API 401 is never shown as an error page. It becomes a redirect to the
//! login page tagged with [`SessionExpired`], which the session expiry
//! middleware uses to purge the session and attach the return destination.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Response extension marking a response produced by an expired API session.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// REST API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                ApiError::Unauthorized => StatusCode::SEE_OTHER,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                ApiError::Rejected { status, .. } if (400..500).contains(status) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Api(ApiError::Unauthorized) = self {
            tracing::info!("API session expired");
            let mut response = Redirect::to("/auth/login?error=session_expired").into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Api(err) => err.shopper_message(),
            Self::Session(_) => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}

impl ApiError {
    /// Turn a failure into an inline message, re-raising session expiry.
    ///
    /// Handlers that show API failures next to a form use this so that a 401
    /// still reaches the global expiry handling.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api(ApiError::Unauthorized)` for a 401.
    pub fn recoverable(self) -> Result<String> {
        match self {
            Self::Unauthorized => Err(AppError::Api(self)),
            other => {
                if !matches!(other, Self::Rejected { status, .. } if status < 500) {
                    tracing::warn!(error = %other, "API call failed");
                }
                Ok(other.shopper_message())
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
