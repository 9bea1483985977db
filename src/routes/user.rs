use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::db::users;
use crate::error::{AppError, Result};
use crate::extract::AuthUser;
use crate::models::{ApiResponse, User, UserProfile};
use crate::security::{hash_password, verify_password};

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub level: Option<u64>,
    pub score: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarSelection {
    pub avatar: Option<String>,
    #[serde(default)]
    pub custom_avatar: bool,
}

#[derive(Debug, Deserialize)]
pub struct AvatarUpload {
    #[serde(default)]
    pub custom_avatar: bool,
    pub avatar_data: Option<String>,
    pub avatar_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadedAvatar {
    pub avatar_url: String,
}

pub async fn get_profile(auth: AuthUser) -> Json<ApiResponse<UserProfile>> {
    Json(ApiResponse::ok(auth.user.profile()))
}

/// Record new level and/or score; absent fields are left untouched
pub async fn update_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: std::result::Result<Json<ProgressUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let Json(update) = payload?;
    if let Some(level) = update.level {
        User::validate_level(level)?;
    }

    let db = state.db.clone();
    let now = state.now_millis();
    let user = tokio::task::spawn_blocking(move || {
        users::update(&db, auth.user.id, now, |user| {
            if let Some(level) = update.level {
                user.level = level;
            }
            if let Some(score) = update.score {
                user.score = score;
            }
            Ok(())
        })
    })
    .await??;

    tracing::debug!(
        "Progress for {}: level {}, score {}",
        user.username,
        user.level,
        user.score
    );

    Ok(Json(ApiResponse::with_message(
        "Progress updated successfully",
        user.profile(),
    )))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: std::result::Result<Json<PasswordChange>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>> {
    let Json(change) = payload?;
    User::validate_password(&change.new_password)?;

    let AuthUser { user: current, .. } = auth;
    let db = state.db.clone();
    let now = state.now_millis();
    let user = tokio::task::spawn_blocking(move || -> Result<User> {
        if !verify_password(&change.current_password, &current.password_hash) {
            return Err(AppError::InvalidInput(
                "Current password is incorrect".to_string(),
            ));
        }
        let password_hash = hash_password(&change.new_password)?;
        users::update(&db, current.id, now, move |user| {
            user.password_hash = password_hash;
            Ok(())
        })
    })
    .await??;

    tracing::info!("Password changed for {}", user.username);
    Ok(Json(ApiResponse::<()>::message(
        "Password updated successfully",
    )))
}

/// Select one of the built-in avatars (or any stored avatar path)
pub async fn update_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: std::result::Result<Json<AvatarSelection>, JsonRejection>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let Json(selection) = payload?;

    let avatar = match selection.avatar {
        Some(avatar) if !selection.custom_avatar && !avatar.trim().is_empty() => avatar,
        _ => return Err(AppError::InvalidInput("No avatar provided".to_string())),
    };

    let db = state.db.clone();
    let now = state.now_millis();
    let user = tokio::task::spawn_blocking(move || {
        users::update(&db, auth.user.id, now, move |user| {
            user.avatar = avatar;
            Ok(())
        })
    })
    .await??;

    Ok(Json(ApiResponse::with_message(
        "Avatar updated successfully",
        user.profile(),
    )))
}

/// Store an uploaded image and return its public URL
///
/// The profile is not changed; clients follow up with `PUT /api/user/avatar`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: std::result::Result<Json<AvatarUpload>, JsonRejection>,
) -> Result<Json<ApiResponse<UploadedAvatar>>> {
    let Json(upload) = payload?;

    let data = match upload.avatar_data.as_deref() {
        Some(data) if upload.custom_avatar && !data.trim().is_empty() => data,
        _ => return Err(AppError::InvalidInput("No file provided".to_string())),
    };

    let original_name = upload.avatar_name.as_deref().unwrap_or("custom_avatar.png");
    let file_name = state.avatars.save_base64(data, original_name).await?;

    tracing::info!("Avatar uploaded by {}: {}", auth.user.username, file_name);

    Ok(Json(ApiResponse::with_message(
        "Avatar uploaded successfully",
        UploadedAvatar {
            avatar_url: state.config.avatar_url(&file_name),
        },
    )))
}
