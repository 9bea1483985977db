//! Leaderboard endpoints.
//!
//! Each request loads every user in one read transaction and builds all of
//! its figures from that snapshot, so a rank and the page around it always
//! agree even while other requests write.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::AppState;
use crate::constants::{
    DEFAULT_GLOBAL_LIMIT, DEFAULT_LEVEL_LIMIT, DEFAULT_MONTHLY_LIMIT, DEFAULT_NEARBY_WINDOW,
    DEFAULT_WEEKLY_LIMIT, STARTING_LEVEL,
};
use crate::db::users;
use crate::error::{AppError, Result};
use crate::extract::AuthUser;
use crate::leaderboard::{
    GlobalPage, Leaderboard, LeaderboardStats, LevelBoard, NearbyView, Period, PeriodBoard,
};
use crate::models::ApiResponse;
use crate::routes::validation::{resolve_level, resolve_limit, resolve_offset, resolve_window};

type QueryResult<T> = std::result::Result<Query<T>, QueryRejection>;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub window: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LevelParams {
    pub level: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Every player in one read transaction; administrators are not ranked
async fn snapshot(state: &AppState) -> Result<Leaderboard> {
    let db = state.db.clone();
    let mut players = tokio::task::spawn_blocking(move || users::load_all(&db)).await??;
    players.retain(|user| !user.is_admin());
    Ok(Leaderboard::new(players, state.clock.offset()))
}

/// GET /api/leaderboard?limit=&offset=
pub async fn global_leaderboard(
    State(state): State<AppState>,
    params: QueryResult<PageParams>,
) -> Result<Json<ApiResponse<GlobalPage>>> {
    let Query(params) = params?;
    let limit = resolve_limit(params.limit, DEFAULT_GLOBAL_LIMIT)?;
    let offset = resolve_offset(params.offset)?;

    let page = snapshot(&state).await?.global(limit, offset);
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/leaderboard/my-position?window=
pub async fn my_position(
    State(state): State<AppState>,
    auth: AuthUser,
    params: QueryResult<NearbyParams>,
) -> Result<Json<ApiResponse<NearbyView>>> {
    let Query(params) = params?;
    let window = resolve_window(params.window, DEFAULT_NEARBY_WINDOW)?;

    // Administrators are not ranked, and the user may have been deleted
    // between authentication and the snapshot
    let view = snapshot(&state)
        .await?
        .nearby(auth.user.id, window)
        .ok_or(AppError::UserNotFound)?;

    tracing::debug!(
        "{} is ranked {} of {}",
        auth.user.username,
        view.current_user.rank,
        view.total_users
    );

    Ok(Json(ApiResponse::ok(view)))
}

/// GET /api/leaderboard/by-level?level=&limit=
pub async fn by_level(
    State(state): State<AppState>,
    params: QueryResult<LevelParams>,
) -> Result<Json<ApiResponse<LevelBoard>>> {
    let Query(params) = params?;
    let level = resolve_level(params.level, STARTING_LEVEL)?;
    let limit = resolve_limit(params.limit, DEFAULT_LEVEL_LIMIT)?;

    let board = snapshot(&state).await?.by_level(level, limit);
    Ok(Json(ApiResponse::ok(board)))
}

/// GET /api/leaderboard/weekly?limit=
pub async fn weekly(
    State(state): State<AppState>,
    params: QueryResult<LimitParams>,
) -> Result<Json<ApiResponse<PeriodBoard>>> {
    let Query(params) = params?;
    let limit = resolve_limit(params.limit, DEFAULT_WEEKLY_LIMIT)?;
    let start = state.clock.start_of_week();

    let board = snapshot(&state).await?.period(Period::Weekly, start, limit);
    Ok(Json(ApiResponse::ok(board)))
}

/// GET /api/leaderboard/monthly?limit=
pub async fn monthly(
    State(state): State<AppState>,
    params: QueryResult<LimitParams>,
) -> Result<Json<ApiResponse<PeriodBoard>>> {
    let Query(params) = params?;
    let limit = resolve_limit(params.limit, DEFAULT_MONTHLY_LIMIT)?;
    let start = state.clock.start_of_month();

    let board = snapshot(&state).await?.period(Period::Monthly, start, limit);
    Ok(Json(ApiResponse::ok(board)))
}

/// GET /api/leaderboard/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<LeaderboardStats>>> {
    let week_start = state.clock.start_of_week();
    let month_start = state.clock.start_of_month();

    let stats = snapshot(&state).await?.stats(week_start, month_start);
    Ok(Json(ApiResponse::ok(stats)))
}
