use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::AppState;
use crate::constants::{DEFAULT_AVATAR, STARTING_LEVEL};
use crate::db::{tokens, users};
use crate::error::{AppError, Result};
use crate::extract::AdminUser;
use crate::models::{ApiResponse, NewUser, Role, User, UserSummary};
use crate::security::hash_password;

type JsonResult<T> = std::result::Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub avatar: Option<String>,
    pub level: Option<u64>,
    pub score: Option<u64>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub level: Option<u64>,
    pub score: Option<u64>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Database statistics response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub user_count: u64,
    pub token_count: u64,
    pub database_size_bytes: u64,
    pub database_size_human: String,
}

/// Format bytes into human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// All accounts, newest first
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    let db = state.db.clone();
    let mut all = tokio::task::spawn_blocking(move || users::load_all(&db)).await??;
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

    Ok(Json(ApiResponse::ok(
        all.iter().map(User::summary).collect(),
    )))
}

pub async fn show_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<UserSummary>>> {
    let db = state.db.clone();
    let user = tokio::task::spawn_blocking(move || users::get(&db, id))
        .await??
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(ApiResponse::ok(user.summary())))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: JsonResult<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserSummary>>)> {
    let Json(request) = payload?;
    let username = request.username.trim().to_string();

    User::validate_username(&username)?;
    User::validate_password(&request.password)?;
    let level = request.level.unwrap_or(STARTING_LEVEL);
    User::validate_level(level)?;

    let db = state.db.clone();
    let now = state.now_millis();
    let user = tokio::task::spawn_blocking(move || -> Result<User> {
        let password_hash = hash_password(&request.password)?;
        users::create(
            &db,
            NewUser {
                username,
                password_hash,
                avatar: request
                    .avatar
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                level,
                score: request.score.unwrap_or(0),
                role: request.role.unwrap_or_default(),
            },
            now,
        )
    })
    .await??;

    tracing::info!("Admin {} created user {}", admin.username, user.username);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully",
            user.summary(),
        )),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<u64>,
    payload: JsonResult<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserSummary>>> {
    let Json(request) = payload?;

    let username = request.username.map(|u| u.trim().to_string());
    if let Some(username) = &username {
        User::validate_username(username)?;
    }
    if let Some(level) = request.level {
        User::validate_level(level)?;
    }
    if id == admin.id && request.role == Some(Role::Player) {
        return Err(AppError::InvalidInput(
            "Administrators cannot remove their own admin role".to_string(),
        ));
    }

    let db = state.db.clone();
    let now = state.now_millis();
    let user = tokio::task::spawn_blocking(move || {
        users::update(&db, id, now, move |user| {
            if let Some(username) = username {
                user.username = username;
            }
            if let Some(avatar) = request.avatar {
                user.avatar = avatar;
            }
            if let Some(level) = request.level {
                user.level = level;
            }
            if let Some(score) = request.score {
                user.score = score;
            }
            if let Some(role) = request.role {
                user.role = role;
            }
            Ok(())
        })
    })
    .await??;

    tracing::info!("Admin {} updated user {}", admin.username, user.id);

    Ok(Json(ApiResponse::with_message(
        "User updated successfully",
        user.summary(),
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<u64>,
    payload: JsonResult<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    let Json(request) = payload?;
    User::validate_password(&request.new_password)?;

    let db = state.db.clone();
    let now = state.now_millis();
    tokio::task::spawn_blocking(move || -> Result<User> {
        let password_hash = hash_password(&request.new_password)?;
        users::update(&db, id, now, move |user| {
            user.password_hash = password_hash;
            Ok(())
        })
    })
    .await??;

    tracing::info!("Admin {} reset the password of user {}", admin.username, id);
    Ok(Json(ApiResponse::<()>::message(
        "Password reset successfully",
    )))
}

/// Delete an account together with every token it holds
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<()>>> {
    if id == admin.id {
        return Err(AppError::InvalidInput(
            "Administrators cannot delete their own account".to_string(),
        ));
    }

    let db = state.db.clone();
    let user = tokio::task::spawn_blocking(move || users::delete(&db, id)).await??;

    tracing::info!("Admin {} deleted user {}", admin.username, user.username);
    Ok(Json(ApiResponse::<()>::message("User deleted successfully")))
}

/// Database statistics for monitoring and diagnostics
pub async fn admin_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<ApiResponse<AdminStatsResponse>>> {
    let database_size_bytes = fs::metadata(&state.config.database_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let db = state.db.clone();
    let (user_count, token_count) =
        tokio::task::spawn_blocking(move || -> Result<(u64, u64)> {
            Ok((users::count(&db)?, tokens::count(&db)?))
        })
        .await??;

    tracing::info!(
        "Admin stats requested: {} users, {} tokens, {} database",
        user_count,
        token_count,
        format_bytes(database_size_bytes)
    );

    Ok(Json(ApiResponse::ok(AdminStatsResponse {
        user_count,
        token_count,
        database_size_bytes,
        database_size_human: format_bytes(database_size_bytes),
    })))
}
