//! Authentication middleware and extractors.
//!
//! Provides extractors that gate views on a logged-in session, plus the
//! helpers that build login redirects and keep them on this site.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{
        HeaderMap, Method, StatusCode, Uri,
        header::REFERER,
        request::Parts,
    },
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use url::Url;

use super::htmx::{HX_CURRENT_URL, HX_REDIRECT, is_htmx};
use crate::models::{CurrentSession, session_keys};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires a logged-in shopper.
///
/// If nobody is logged in, the request is redirected to the login page with
/// the originally requested destination in the `redirect` parameter.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(current): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", current.user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentSession);

/// Rejection sending the shopper to the login page.
#[derive(Debug)]
pub struct AuthRejection {
    location: String,
    htmx: bool,
}

impl AuthRejection {
    /// Where the shopper is sent.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        redirect_response(&self.location, self.htmx)
    }
}

/// Redirect that works for both full navigations and HTMX requests.
///
/// HTMX follows a 303 transparently and would swap the login page into a
/// fragment target, so HTMX requests get an `HX-Redirect` header instead.
#[must_use]
pub fn redirect_response(location: &str, htmx: bool) -> Response {
    if htmx {
        (StatusCode::OK, [(HX_REDIRECT, location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = match parts.extensions.get::<Session>() {
            Some(session) => current_session(session).await,
            None => None,
        };

        current.map(Self).ok_or_else(|| {
            // Nested routers strip their prefix from `parts.uri`
            let uri = parts
                .extensions
                .get::<OriginalUri>()
                .map_or(&parts.uri, |original| &original.0);
            let destination = destination_for(&parts.method, &parts.headers, uri);
            tracing::debug!(%destination, "Login required");
            AuthRejection {
                location: login_url(&destination, None),
                htmx: is_htmx(&parts.headers),
            }
        })
    }
}

/// Extractor that optionally gets the current session.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = match parts.extensions.get::<Session>() {
            Some(session) => current_session(session).await,
            None => None,
        };

        Ok(Self(current))
    }
}

/// Read the current session, treating an unreadable entry as logged out.
pub async fn current_session(session: &Session) -> Option<CurrentSession> {
    session
        .get::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read session");
            None
        })
}

/// Store a freshly authenticated session.
///
/// The session ID is cycled first so a pre-login session cookie cannot be
/// reused after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_session(
    session: &Session,
    current: &CurrentSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_SESSION, current)
        .await
}

/// Overwrite the stored session after a revalidation, keeping the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_current_session(
    session: &Session,
    current: &CurrentSession,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_SESSION, current)
        .await
}

/// Purge the session entirely (logout or API 401).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_session(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await?;
    session.flush().await
}

// =============================================================================
// Redirect Helpers
// =============================================================================

/// Build the login URL, preserving where the shopper was headed.
///
/// `redirect` is omitted when the destination is the home page.
#[must_use]
pub fn login_url(destination: &str, error: Option<&str>) -> String {
    let mut params = Vec::with_capacity(2);
    if let Some(error) = error {
        params.push(format!("error={}", urlencoding::encode(error)));
    }

    let destination = sanitize_redirect(Some(destination));
    if destination != "/" {
        params.push(format!("redirect={}", urlencoding::encode(&destination)));
    }

    if params.is_empty() {
        LOGIN_PATH.to_string()
    } else {
        format!("{LOGIN_PATH}?{}", params.join("&"))
    }
}

/// Accept only same-site paths as post-login destinations.
///
/// Anything else (absolute URLs, protocol-relative `//host`, backslash tricks,
/// header injection, or pages under `/auth`) falls back to `/`.
#[must_use]
pub fn sanitize_redirect(target: Option<&str>) -> String {
    target
        .map(str::trim)
        .filter(|t| {
            t.starts_with('/')
                && !t.starts_with("//")
                && !t.starts_with("/\\")
                && !t.contains(['\r', '\n'])
                && !is_auth_path(t)
        })
        .map_or_else(|| "/".to_string(), str::to_string)
}

fn is_auth_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path == "/auth" || path.starts_with("/auth/")
}

/// Work out where a rejected request was trying to go.
///
/// HTMX requests report the page they were issued from; form posts fall back
/// to their `Referer`; plain GETs use their own URI.
#[must_use]
pub fn destination_for(method: &Method, headers: &HeaderMap, uri: &Uri) -> String {
    let header_path = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(local_path)
    };

    if is_htmx(headers) {
        if let Some(path) = header_path(HX_CURRENT_URL) {
            return path;
        }
    }

    if method != Method::GET {
        return header_path(REFERER.as_str()).unwrap_or_else(|| "/".to_string());
    }

    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string())
}

/// Path and query of a header URL, which may be absolute or already a path.
fn local_path(value: &str) -> Option<String> {
    if value.starts_with('/') {
        return Some(value.to_string());
    }

    let url = Url::parse(value).ok()?;
    Some(match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    })
}
