/// Avatar assigned at registration when none is supplied
pub const DEFAULT_AVATAR: &str = "assets/avatars/default.png";

/// Built-in avatars offered to clients
pub const AVAILABLE_AVATARS: [&str; 4] = [
    "assets/avatars/avatar1.png",
    "assets/avatars/avatar2.png",
    "assets/avatars/avatar3.png",
    "assets/avatars/avatar4.png",
];

/// Maximum username length in characters
pub const MAX_USERNAME_LEN: usize = 100;

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Level assigned to new players
pub const STARTING_LEVEL: u64 = 1;

/// Maximum decoded avatar size in bytes (2MB)
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Request body limit, sized for a base64-encoded avatar plus JSON framing
pub const MAX_REQUEST_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Image extensions accepted for uploaded avatars
pub const AVATAR_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

// =============================================================================
// Leaderboard Defaults
// =============================================================================

/// Default page size for the global leaderboard
pub const DEFAULT_GLOBAL_LIMIT: usize = 50;

/// Default page size for the by-level leaderboard
pub const DEFAULT_LEVEL_LIMIT: usize = 20;

/// Default page size for the weekly leaderboard
pub const DEFAULT_WEEKLY_LIMIT: usize = 20;

/// Default page size for the monthly leaderboard
pub const DEFAULT_MONTHLY_LIMIT: usize = 30;

/// Hard cap applied to every requested page size
pub const MAX_PAGE_LIMIT: usize = 100;

/// Positions shown above and below the caller in the nearby view
pub const DEFAULT_NEARBY_WINDOW: usize = 5;

/// Largest nearby window a client may request
pub const MAX_NEARBY_WINDOW: usize = 25;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a missing or over-long username
pub const ERR_INVALID_USERNAME: &str = "Username is required and may not exceed 100 characters";

/// Error message for a short password
pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

/// Error message for a duplicate username
pub const ERR_USERNAME_TAKEN: &str = "The username has already been taken";

/// Error message for a level below the starting level
pub const ERR_INVALID_LEVEL: &str = "Level must be at least 1";
