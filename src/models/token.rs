use serde::{Deserialize, Serialize};

/// Access token record stored in redb, keyed by the token digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Owner of the token
    pub user_id: u64,
    /// When the token was issued (Unix milliseconds)
    pub created_at: i64,
}
