pub mod tables;
pub mod tokens;
pub mod users;

use redb::{Database, Error as RedbError};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Encoding used for every serialized value
pub const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!("Failed to create database directory: {}", e);
            RedbError::Io(e)
        })?;
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create tables if they don't exist by opening them
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> std::result::Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::USERNAMES)?;
        let _ = write_txn.open_table(tables::TOKENS)?;
        let _ = write_txn.open_table(tables::USER_TOKENS)?;
        let _ = write_txn.open_table(tables::SEQUENCES)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}
