use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::constants::ERR_USERNAME_TAKEN;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("{}", ERR_USERNAME_TAKEN)]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Avatar not found")]
    AvatarNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl AppError {
    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Transaction(_)
                | AppError::Table(_)
                | AppError::Storage(_)
                | AppError::Commit(_)
                | AppError::Serialization(_)
                | AppError::Deserialization(_)
                | AppError::TaskJoin(_)
                | AppError::Io(_)
                | AppError::PasswordHash(_)
        )
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(err.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidParameter(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Implement IntoResponse to convert AppError into the JSON error envelope
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("{:?}", self);
            let body = Json(json!({
                "success": false,
                "message": "Internal server error",
                "error": self.to_string(),
            }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let (status, message) = match self {
            AppError::UsernameTaken => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ERR_USERNAME_TAKEN.to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::AvatarNotFound => (StatusCode::NOT_FOUND, "Avatar not found".to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Administrator access required".to_string(),
            ),
            AppError::InvalidParameter(msg) | AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
