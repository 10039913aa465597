use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
};
use serde::Deserialize;

use crate::error::{ActionError, AppError, FieldError};
use crate::models::{Profile, ProfileUpdate, ThemeColor};
use crate::session::{ActiveSession, AvatarUpload};
use crate::state::AppState;
use crate::views::{ActionView, Notice, ThemeView};

#[derive(Debug, Deserialize)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme_color: String,
}

pub async fn update(
    State(state): State<AppState>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ActionView<Profile>>, ActionError> {
    let profile = state
        .session
        .update_profile(ProfileUpdate {
            full_name: patch.full_name,
            avatar_url: patch.avatar_url,
            ..Default::default()
        })
        .await
        .map_err(|e| e.titled("Failed to update profile"))?;

    Ok(Json(ActionView::new(profile).notify(Notice::new("Profile updated"))))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ActionView<Profile>>, ActionError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let profile = state
        .session
        .upload_avatar(AvatarUpload {
            content_type,
            bytes: body.to_vec(),
        })
        .await
        .map_err(|e| e.titled("Failed to upload avatar"))?;

    Ok(Json(ActionView::new(profile).notify(Notice::new("Avatar updated"))))
}

pub async fn become_creator(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveSession>,
) -> Result<Json<ActionView<Profile>>, ActionError> {
    if active.profile.is_creator {
        return Ok(Json(ActionView::new(active.profile)));
    }
    let profile = state
        .session
        .become_creator()
        .await
        .map_err(|e| e.titled("Failed to become a creator"))?;

    Ok(Json(
        ActionView::new(profile)
            .notify(Notice::new("You're now a creator!").with_message("You can start publishing courses"))
            .redirect("/app/create-course"),
    ))
}

pub async fn save_theme(
    State(state): State<AppState>,
    Json(req): Json<ThemeRequest>,
) -> Result<Json<ActionView<ThemeView>>, ActionError> {
    let theme_color: ThemeColor = req.theme_color.parse().map_err(|message: String| {
        AppError::Validation(vec![FieldError::new("theme_color", message)])
            .titled("Failed to update theme")
    })?;

    let profile = state
        .session
        .save_theme_preference(theme_color)
        .await
        .map_err(|e| e.titled("Failed to update theme"))?;

    Ok(Json(
        ActionView::new(ThemeView {
            theme_color: profile.theme_color,
            root_class: profile.theme_color.root_class(),
        })
        .notify(Notice::new("Theme updated")),
    ))
}
