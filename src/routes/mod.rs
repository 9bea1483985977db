pub mod admin;
pub mod auth;
pub mod avatar;
pub mod health;
pub mod leaderboard;
pub mod user;
pub mod validation;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::AppState;
use crate::constants::MAX_REQUEST_BODY_BYTES;
use crate::models::ApiResponse;

pub use health::health_check;

/// Build the application router with every API route mounted
///
/// Cross-cutting layers (CORS, request tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Authentication
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        // Avatars
        .route("/api/avatars", get(avatar::list_avatars))
        .route("/api/avatars/{filename}", get(avatar::show_avatar))
        // Player profile
        .route("/api/user/profile", get(user::get_profile))
        .route("/api/user/progress", put(user::update_progress))
        .route("/api/user/password", put(user::change_password))
        .route(
            "/api/user/avatar",
            put(user::update_avatar).post(user::upload_avatar),
        )
        // Leaderboard
        .route("/api/leaderboard", get(leaderboard::global_leaderboard))
        .route("/api/leaderboard/my-position", get(leaderboard::my_position))
        .route("/api/leaderboard/by-level", get(leaderboard::by_level))
        .route("/api/leaderboard/weekly", get(leaderboard::weekly))
        .route("/api/leaderboard/monthly", get(leaderboard::monthly))
        .route("/api/leaderboard/stats", get(leaderboard::stats))
        // Administration
        .route(
            "/api/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/api/admin/users/{id}",
            get(admin::show_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/api/admin/users/{id}/password", put(admin::reset_password))
        .route("/api/admin/stats", get(admin::admin_stats))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    let mut body = ApiResponse::<()>::message("Endpoint not found");
    body.success = false;
    (StatusCode::NOT_FOUND, Json(body))
}
