//! Authentication route handlers.
//!
//! Handles login, registration and logout against the REST API's token
//! endpoints. A successful login stores the token in the server-side session
//! and sends the shopper on to the page they were trying to reach.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{AuthPayload, Email};

use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAuth, clear_current_session, sanitize_redirect, set_current_session,
};
use crate::middleware::session_expiry::SESSION_EXPIRED_ERROR;
use crate::models::{CurrentSession, SessionUser};
use crate::state::AppState;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const LOGIN_UNCONFIRMED: &str = "We couldn't confirm your login. Please try again.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub redirect: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters of the login and register pages.
#[derive(Debug, Default, Deserialize)]
pub struct AuthPageQuery {
    pub error: Option<String>,
    pub redirect: Option<String>,
}

/// Map an `error` code from a redirect to a message.
fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "" => None,
        SESSION_EXPIRED_ERROR => Some("Your session has expired. Please log in again."),
        "login_required" => Some("Please log in to continue."),
        _ => Some("Something went wrong. Please try again."),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<SessionUser>,
    pub error: Option<String>,
    pub redirect: String,
    pub email: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<SessionUser>,
    pub error: Option<String>,
    pub redirect: String,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Shared
// =============================================================================

/// Confirm a fresh token against `GET /auth/profile`.
///
/// `None` when the API refuses the token it just issued. Any other failure
/// keeps the login payload and leaves the session due for revalidation.
async fn confirm_session(state: &AppState, payload: AuthPayload) -> Option<CurrentSession> {
    let mut current = CurrentSession::new(payload);
    match state.api().get_profile(&current.access_token()).await {
        Ok(profile) => current.refresh(profile),
        Err(ApiError::Unauthorized) => {
            tracing::warn!(user_id = %current.user.id, "New token refused by profile endpoint");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not confirm new session");
            current.mark_unvalidated();
        }
    }
    Some(current)
}

/// Store the authenticated session and send the shopper on.
async fn start_session(session: &Session, current: CurrentSession, redirect: &str) -> Result<Response> {
    set_current_session(session, &current).await?;
    set_sentry_user(&current.user.id, Some(&current.user.email));

    tracing::info!(user_id = %current.user.id, "Shopper logged in");
    Ok(Redirect::to(redirect).into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// A shopper who is already logged in goes straight to the destination.
#[instrument(skip_all)]
pub async fn login_page(
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<AuthPageQuery>,
) -> Response {
    let redirect = sanitize_redirect(query.redirect.as_deref());
    if current.is_some() {
        return Redirect::to(&redirect).into_response();
    }

    LoginTemplate {
        user: None,
        error: query
            .error
            .as_deref()
            .and_then(error_message)
            .map(String::from),
        redirect,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let redirect = sanitize_redirect(form.redirect.as_deref());
    let render_error = |message: &str| {
        LoginTemplate {
            user: None,
            error: Some(message.to_string()),
            redirect: redirect.clone(),
            email: form.email.trim().to_string(),
        }
        .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(render_error("Please enter a valid email address."));
    };
    if form.password.is_empty() {
        return Ok(render_error("Please enter your password."));
    }

    let password = SecretString::from(form.password.clone());
    match state.api().login(&email, &password).await {
        Ok(payload) => match confirm_session(&state, payload).await {
            Some(current) => start_session(&session, current, &redirect).await,
            None => Ok(render_error(LOGIN_UNCONFIRMED)),
        },
        // Bad credentials, not an expired session
        Err(ApiError::Unauthorized) => Ok(render_error("Invalid email or password.")),
        Err(ApiError::Rejected { status, .. }) if (400..500).contains(&status) => {
            Ok(render_error("Invalid email or password."))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login request failed");
            Ok(render_error(&e.shopper_message()))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip_all)]
pub async fn register_page(
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<AuthPageQuery>,
) -> Response {
    let redirect = sanitize_redirect(query.redirect.as_deref());
    if current.is_some() {
        return Redirect::to(&redirect).into_response();
    }

    RegisterTemplate {
        user: None,
        error: None,
        redirect,
        name: String::new(),
        email: String::new(),
    }
    .into_response()
}

/// Check the registration form before calling the API.
fn validate_registration(form: &RegisterForm) -> std::result::Result<Email, String> {
    if form.name.trim().is_empty() {
        return Err("Please enter your name.".to_string());
    }
    let email = Email::parse(&form.email).map_err(|e| e.to_string())?;
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if form.password != form.password_confirm {
        return Err("Passwords do not match.".to_string());
    }
    Ok(email)
}

/// Handle registration form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let redirect = sanitize_redirect(form.redirect.as_deref());
    let render_error = |message: String| {
        RegisterTemplate {
            user: None,
            error: Some(message),
            redirect: redirect.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
        }
        .into_response()
    };

    let email = match validate_registration(&form) {
        Ok(email) => email,
        Err(message) => return Ok(render_error(message)),
    };

    let password = SecretString::from(form.password.clone());
    match state
        .api()
        .register(form.name.trim(), &email, &password)
        .await
    {
        Ok(payload) => match confirm_session(&state, payload).await {
            Some(current) => start_session(&session, current, &redirect).await,
            None => Ok(render_error(LOGIN_UNCONFIRMED.to_string())),
        },
        Err(ApiError::Unauthorized) => Ok(render_error(
            "Registration was refused. Please try again.".to_string(),
        )),
        Err(e) => {
            if !matches!(e, ApiError::Rejected { status, .. } if status < 500) {
                tracing::warn!(error = %e, "Registration request failed");
            }
            Ok(render_error(e.shopper_message()))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_session(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
