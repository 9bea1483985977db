use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::constants::{DEFAULT_AVATAR, STARTING_LEVEL};
use crate::db::{tokens, users};
use crate::error::{AppError, Result};
use crate::extract::AuthUser;
use crate::models::{ApiResponse, NewUser, Role, User, UserProfile};
use crate::security::{generate_token, hash_password, token_digest, verify_password};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub custom_avatar: bool,
    pub avatar_data: Option<String>,
    pub avatar_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Register a new player account
///
/// Starts the player at level 1 with score 0. When `custom_avatar` is set
/// and `avatar_data` carries a base64 image, the image is stored and its
/// public URL becomes the avatar.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>)> {
    let Json(payload) = payload?;
    let username = payload.username.trim().to_string();

    User::validate_username(&username)?;
    User::validate_password(&payload.password)?;

    let stored_avatar = match (payload.custom_avatar, payload.avatar_data.as_deref()) {
        (true, Some(data)) => {
            let original_name = payload.avatar_name.as_deref().unwrap_or("custom_avatar.png");
            Some(state.avatars.save_base64(data, original_name).await?)
        }
        _ => None,
    };

    let avatar = match &stored_avatar {
        Some(file_name) => state.config.avatar_url(file_name),
        None => payload
            .avatar
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
    };

    let db = state.db.clone();
    let now = state.now_millis();
    let password = payload.password;

    let created = tokio::task::spawn_blocking(move || -> Result<User> {
        let password_hash = hash_password(&password)?;
        users::create(
            &db,
            NewUser {
                username,
                password_hash,
                avatar,
                level: STARTING_LEVEL,
                score: 0,
                role: Role::Player,
            },
            now,
        )
    })
    .await?;

    // No account owns the uploaded image when creation fails
    let user = match created {
        Ok(user) => user,
        Err(e) => {
            if let Some(file_name) = &stored_avatar
                && let Err(remove_err) = state.avatars.remove(file_name).await
            {
                tracing::warn!(
                    "Failed to remove orphaned avatar {}: {}",
                    file_name,
                    remove_err
                );
            }
            return Err(e);
        }
    };

    tracing::info!("New user registered: {} (id {})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            RegisteredUser {
                user: user.profile(),
            },
        )),
    ))
}

/// Exchange username and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let Json(payload) = payload?;
    let username = payload.username.trim().to_string();
    let password = payload.password;

    let db = state.db.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<User> {
        let user = users::find_by_username(&db, &username)?.ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&password, &user.password_hash) {
            tracing::warn!("Failed login for {}", username);
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    })
    .await??;

    // Only the digest is stored; the raw token is returned once
    let token = generate_token();
    let digest = token_digest(&token, &state.config.app_secret_key);
    let db = state.db.clone();
    let user_id = user.id;
    let now = state.now_millis();
    tokio::task::spawn_blocking(move || tokens::issue(&db, &digest, user_id, now)).await??;

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        LoginResponse {
            token,
            user: user.profile(),
        },
    )))
}

/// Revoke the token used for this request
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<()>>> {
    let db = state.db.clone();
    let digest = auth.token_digest;
    tokio::task::spawn_blocking(move || tokens::revoke(&db, &digest)).await??;

    tracing::info!("User logged out: {}", auth.user.username);
    Ok(Json(ApiResponse::<()>::message("Logout successful")))
}
