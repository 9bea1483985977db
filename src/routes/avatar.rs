use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;

use crate::AppState;
use crate::constants::{AVAILABLE_AVATARS, DEFAULT_AVATAR};
use crate::error::Result;
use crate::models::ApiResponse;

#[derive(Debug, Serialize)]
pub struct AvatarCatalog {
    pub avatars: Vec<&'static str>,
    pub default_avatar: &'static str,
}

/// Built-in avatars a player can pick without uploading
pub async fn list_avatars() -> Json<ApiResponse<AvatarCatalog>> {
    Json(ApiResponse::ok(AvatarCatalog {
        avatars: AVAILABLE_AVATARS.to_vec(),
        default_avatar: DEFAULT_AVATAR,
    }))
}

/// Serve an uploaded avatar image
pub async fn show_avatar(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse> {
    let (bytes, content_type) = state.avatars.load(&file_name).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    ))
}
