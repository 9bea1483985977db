use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ERR_INVALID_LEVEL, ERR_INVALID_USERNAME, ERR_PASSWORD_TOO_SHORT, MAX_USERNAME_LEN,
    MIN_PASSWORD_LEN, STARTING_LEVEL,
};
use crate::error::{AppError, Result};

/// Capability attached to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    Admin,
}

/// User record stored in redb
/// Uses Unix millisecond timestamps for compact storage with bincode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// Argon2 hash in PHC string format
    pub password_hash: String,
    /// Built-in asset path or absolute URL of an uploaded image
    pub avatar: String,
    pub level: u64,
    pub score: u64,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.created_at).unwrap_or_default()
    }

    pub fn updated_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.updated_at).unwrap_or_default()
    }

    /// Registration date as shown on leaderboards (YYYY-MM-DD)
    pub fn joined_date(&self, offset: FixedOffset) -> String {
        self.created_at_utc()
            .with_timezone(&offset)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Last modification time as shown on activity leaderboards
    pub fn last_active(&self, offset: FixedOffset) -> String {
        self.updated_at_utc()
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            level: self.level,
            score: self.score,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            level: self.level,
            score: self.score,
            role: self.role,
            created_at: self.created_at_utc().to_rfc3339(),
            updated_at: self.updated_at_utc().to_rfc3339(),
        }
    }

    /// Validate a username: non-blank, at most 100 characters
    pub fn validate_username(username: &str) -> Result<()> {
        let trimmed = username.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::Validation(ERR_INVALID_USERNAME.to_string()));
        }
        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(ERR_PASSWORD_TOO_SHORT.to_string()));
        }
        Ok(())
    }

    pub fn validate_level(level: u64) -> Result<()> {
        if level < STARTING_LEVEL {
            return Err(AppError::Validation(ERR_INVALID_LEVEL.to_string()));
        }
        Ok(())
    }
}

/// Fields needed to create a user; id and timestamps are assigned by the store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub avatar: String,
    pub level: u64,
    pub score: u64,
    pub role: Role,
}

/// Public profile returned to the owning player
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub avatar: String,
    pub level: u64,
    pub score: u64,
}

/// Full account view for administrators (never includes the password hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub avatar: String,
    pub level: u64,
    pub score: u64,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}
