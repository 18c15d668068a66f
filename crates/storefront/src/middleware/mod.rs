//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (tower-sessions with memory store)
//! 6. Session expiry (purge the session when the API answers 401)
//! 7. Session revalidation (periodic `GET /auth/profile`)
//! 8. Rate limiting (governor, login/register POSTs only)

pub mod auth;
pub mod htmx;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_expiry;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_session, login_url, sanitize_redirect,
    set_current_session,
};
pub use htmx::HxRequest;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, revalidate_session};
pub use session_expiry::expire_session_on_unauthorized;
