//! Leaderboard Server Library
//!
//! Game backend with token-authenticated players, progress tracking, avatar
//! storage and a leaderboard. This module exports the core types and
//! functions for testing and reuse.

pub mod avatars;
pub mod clock;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extract;
pub mod leaderboard;
pub mod models;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{Db, open_database};
pub use error::{AppError, Result};
pub use routes::router;

use std::sync::Arc;

use avatars::AvatarStorage;
use clock::Clock;
use models::{NewUser, Role};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub avatars: AvatarStorage,
}

impl AppState {
    /// Create a new AppState with the given database, configuration and clock
    pub fn new(db: Db, config: Config, clock: Arc<dyn Clock>) -> Self {
        let avatars = AvatarStorage::new(&config.avatar_dir);
        Self {
            db,
            config,
            clock,
            avatars,
        }
    }

    /// Current time in Unix milliseconds, the unit stored on records
    pub fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Ensure the configured administrator account exists
    ///
    /// Does nothing when no admin credentials are configured. An existing
    /// player with the same username is left untouched.
    pub async fn bootstrap_admin(&self) -> Result<()> {
        let (Some(username), Some(password)) = (
            self.config.admin_username.clone(),
            self.config.admin_password.clone(),
        ) else {
            return Ok(());
        };

        let store = self.db.clone();
        let now = self.now_millis();

        tokio::task::spawn_blocking(move || -> Result<()> {
            match db::users::find_by_username(&store, &username)? {
                Some(user) if user.role == Role::Admin => {
                    tracing::info!("Administrator {} already present", username);
                }
                Some(_) => {
                    tracing::warn!(
                        "ADMIN_USERNAME {} belongs to a player account; not promoting it",
                        username
                    );
                }
                None => {
                    let password_hash = security::hash_password(&password)?;
                    db::users::create(
                        &store,
                        NewUser {
                            username,
                            password_hash,
                            avatar: constants::DEFAULT_AVATAR.to_string(),
                            level: constants::STARTING_LEVEL,
                            score: 0,
                            role: Role::Admin,
                        },
                        now,
                    )?;
                    tracing::info!("Administrator account created");
                }
            }
            Ok(())
        })
        .await?
    }
}
