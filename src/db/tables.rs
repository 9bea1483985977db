use redb::TableDefinition;

/// Users table: user id -> User (serialized)
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Username index: username -> user id
/// Enforces username uniqueness at write time
pub const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");

/// Access tokens table: token digest -> TokenRecord (serialized)
pub const TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("tokens");

/// User tokens index: user id -> Vec<token digest>
/// Used for cascade revocation when a user is removed
pub const USER_TOKENS: TableDefinition<u64, &[u8]> = TableDefinition::new("user_tokens");

/// Counters table: name -> value
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Sequence key for user ids
pub const USER_ID_SEQUENCE: &str = "user_id";
