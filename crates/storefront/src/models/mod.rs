//! Domain models for storefront.

pub mod session;

pub use session::{CurrentSession, SessionUser, keys as session_keys};
