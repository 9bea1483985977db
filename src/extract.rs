//! Request extractors for bearer-token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::AppState;
use crate::db::{tokens, users};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{parse_bearer, token_digest};

/// The player behind a valid `Authorization: Bearer` token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// Digest of the presented token, used to revoke it on logout
    pub token_digest: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .ok_or(AppError::Unauthorized)?;

        let digest = token_digest(token, &state.config.app_secret_key);
        let db = state.db.clone();
        let lookup = digest.clone();

        let user = tokio::task::spawn_blocking(move || -> Result<Option<User>> {
            match tokens::resolve(&db, &lookup)? {
                Some(record) => users::get(&db, record.user_id),
                None => Ok(None),
            }
        })
        .await??;

        // Unknown token, or a token whose user has since been deleted
        let user = user.ok_or_else(|| {
            tracing::debug!("Rejected unknown access token");
            AppError::Unauthorized
        })?;

        Ok(AuthUser {
            user,
            token_digest: digest,
        })
    }
}

/// An authenticated user holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!("Non-admin user {} attempted an admin action", user.username);
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}
