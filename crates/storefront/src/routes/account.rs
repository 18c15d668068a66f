//! Account route handlers.
//!
//! The profile lives in the API; the page reads it fresh on every visit and
//! writes changes back with `PUT /auth/profile`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{UpdateProfileRequest, UserProfile};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middleware::auth::update_current_session;
use crate::models::SessionUser;
use crate::state::AppState;

/// Profile update form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Profile fields as shown on the account page.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
        }
    }
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub user: Option<SessionUser>,
    pub profile: Option<ProfileView>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Display the account page.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<AccountTemplate> {
    let (profile, error) = match state.api().get_profile(&current.access_token()).await {
        Ok(profile) => (Some(ProfileView::from(&profile)), None),
        Err(e) => (None, Some(e.recoverable()?)),
    };

    Ok(AccountTemplate {
        user: Some(current.user),
        profile,
        error,
        notice: None,
    })
}

/// Handle profile update.
///
/// On success the stored session picks up the new name so the navigation
/// reflects it immediately.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(mut current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<AccountTemplate> {
    let submitted = ProfileView {
        name: form.name.trim().to_string(),
        email: current.user.email.clone(),
        phone: form.phone.trim().to_string(),
    };

    if submitted.name.is_empty() {
        return Ok(AccountTemplate {
            user: Some(current.user),
            profile: Some(submitted),
            error: Some("Please enter your name.".to_string()),
            notice: None,
        });
    }

    let update = UpdateProfileRequest {
        name: Some(submitted.name.clone()),
        phone: Some(submitted.phone.clone()),
    };

    match state
        .api()
        .update_profile(&current.access_token(), &update)
        .await
    {
        Ok(profile) => {
            let view = ProfileView::from(&profile);
            current.refresh(profile);
            update_current_session(&session, &current).await?;

            Ok(AccountTemplate {
                user: Some(current.user),
                profile: Some(view),
                error: None,
                notice: Some("Profile updated.".to_string()),
            })
        }
        Err(e) => Ok(AccountTemplate {
            user: Some(current.user),
            profile: Some(submitted),
            error: Some(e.recoverable()?),
            notice: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use shopfront_core::UserId;

    use super::*;

    #[test]
    fn test_profile_view_defaults_missing_phone() {
        let profile = UserProfile {
            id: UserId::new(1),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            role: None,
        };
        let view = ProfileView::from(&profile);
        assert_eq!(view.phone, "");
        assert_eq!(view.email, "ada@example.com");
    }
}
