use chrono::FixedOffset;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    /// Directory holding uploaded avatar images
    pub avatar_dir: String,
    /// Externally visible origin used to build avatar URLs
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Pepper mixed into stored access token digests
    pub app_secret_key: String,
    /// Offset from UTC, in minutes, used for week/month boundaries and dates
    pub tz_offset_minutes: i32,
    /// Username of the bootstrap administrator (disabled when unset)
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub log_requests: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/leaderboard.db".to_string());

        let avatar_dir = env::var("AVATAR_DIR").unwrap_or_else(|_| "./data/avatars".to_string());

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let app_secret_key = env::var("APP_SECRET_KEY")
            .map_err(|_| "APP_SECRET_KEY must be set for access token digests")?;

        let tz_offset_minutes = env::var("TZ_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| "Invalid TZ_OFFSET_MINUTES")?;

        let admin_username = env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty());

        if admin_username.is_some() != admin_password.is_some() {
            return Err("ADMIN_USERNAME and ADMIN_PASSWORD must be set together".to_string());
        }

        let log_requests = env::var("LOG_REQUESTS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| "Invalid LOG_REQUESTS")?;

        let config = Config {
            server_host,
            server_port,
            database_path,
            avatar_dir,
            public_base_url,
            allowed_origins,
            environment,
            app_secret_key,
            tz_offset_minutes,
            admin_username,
            admin_password,
            log_requests,
        };

        // Reject offsets chrono cannot represent up front
        config.tz_offset()?;

        Ok(config)
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Fixed offset used for calendar boundaries
    pub fn tz_offset(&self) -> Result<FixedOffset, String> {
        FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .ok_or_else(|| format!("TZ_OFFSET_MINUTES out of range: {}", self.tz_offset_minutes))
    }

    /// Public URL of an uploaded avatar file
    pub fn avatar_url(&self, file_name: &str) -> String {
        format!("{}/api/avatars/{}", self.public_base_url, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_path: String::new(),
            avatar_dir: String::new(),
            public_base_url: "https://game.example.com".to_string(),
            allowed_origins: vec![],
            environment: "test".to_string(),
            app_secret_key: "secret".to_string(),
            tz_offset_minutes: 420,
            admin_username: None,
            admin_password: None,
            log_requests: false,
        }
    }

    #[test]
    fn test_server_address() {
        assert_eq!(config().server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_tz_offset() {
        let offset = config().tz_offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 7 * 3600);

        let mut bad = config();
        bad.tz_offset_minutes = 24 * 60;
        assert!(bad.tz_offset().is_err());
    }

    #[test]
    fn test_avatar_url() {
        assert_eq!(
            config().avatar_url("avatar_1.png"),
            "https://game.example.com/api/avatars/avatar_1.png"
        );
    }
}
