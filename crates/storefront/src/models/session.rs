//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use shopfront_core::{AuthPayload, UserId, UserProfile};

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in shopper and their API token.
    pub const CURRENT_SESSION: &str = "current_session";
}

/// Session-stored shopper identity.
///
/// Minimal data kept in the session to render the navigation bar and the
/// account page header without an API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Shopper's API ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address as the API reports it.
    pub email: String,
}

impl From<UserProfile> for SessionUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
        }
    }
}

/// The authenticated session: who is logged in and the token that proves it.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentSession {
    /// The logged-in shopper.
    pub user: SessionUser,
    access_token: String,
    /// When the token was last confirmed by `GET /auth/profile`.
    pub validated_at: DateTime<Utc>,
}

impl std::fmt::Debug for CurrentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentSession")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .field("validated_at", &self.validated_at)
            .finish()
    }
}

impl CurrentSession {
    /// Start a session from a login or registration response.
    #[must_use]
    pub fn new(payload: AuthPayload) -> Self {
        Self {
            user: payload.user.into(),
            access_token: payload.token,
            validated_at: Utc::now(),
        }
    }

    /// The bearer token for API calls.
    #[must_use]
    pub fn access_token(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }

    /// Whether the token was last confirmed longer ago than `interval`.
    #[must_use]
    pub fn needs_revalidation(&self, interval: std::time::Duration, now: DateTime<Utc>) -> bool {
        chrono::Duration::from_std(interval)
            .map_or(true, |interval| now - self.validated_at >= interval)
    }

    /// Record a successful revalidation with the latest profile.
    pub fn refresh(&mut self, profile: UserProfile) {
        self.user = profile.into();
        self.validated_at = Utc::now();
    }

    /// Force a revalidation on the next request.
    pub fn mark_unvalidated(&mut self) {
        self.validated_at = DateTime::<Utc>::UNIX_EPOCH;
    }
}
