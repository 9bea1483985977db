//! Access token store. Only token digests are persisted.

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, WriteTransaction};

use crate::db::{decode, encode, tables};
use crate::error::{AppError, Result};
use crate::models::TokenRecord;

/// Persist a token digest for a user
pub fn issue(db: &Database, digest: &str, user_id: u64, now: i64) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let users = write_txn.open_table(tables::USERS)?;
        if users.get(user_id)?.is_none() {
            return Err(AppError::UserNotFound);
        }
        drop(users);

        let record = TokenRecord {
            user_id,
            created_at: now,
        };
        let mut tokens = write_txn.open_table(tables::TOKENS)?;
        tokens.insert(digest, encode(&record)?.as_slice())?;
        drop(tokens);

        // Update user_tokens index (for cascade revocation)
        let mut user_tokens = write_txn.open_table(tables::USER_TOKENS)?;
        let mut digests: Vec<String> = user_tokens
            .get(user_id)?
            .map(|b| decode(b.value()))
            .transpose()?
            .unwrap_or_default();
        digests.push(digest.to_string());
        user_tokens.insert(user_id, encode(&digests)?.as_slice())?;
    }
    write_txn.commit()?;

    Ok(())
}

/// Look up the record behind a token digest
pub fn resolve(db: &Database, digest: &str) -> Result<Option<TokenRecord>> {
    let read_txn = db.begin_read()?;
    let tokens = read_txn.open_table(tables::TOKENS)?;

    tokens
        .get(digest)?
        .map(|b| decode(b.value()))
        .transpose()
}

/// Revoke a single token; returns whether it existed
pub fn revoke(db: &Database, digest: &str) -> Result<bool> {
    let write_txn = db.begin_write()?;
    let existed = {
        let mut tokens = write_txn.open_table(tables::TOKENS)?;
        let record: Option<TokenRecord> = tokens
            .remove(digest)?
            .map(|b| decode(b.value()))
            .transpose()?;
        drop(tokens);

        if let Some(record) = &record {
            let mut user_tokens = write_txn.open_table(tables::USER_TOKENS)?;
            let digests: Option<Vec<String>> = user_tokens
                .get(record.user_id)?
                .map(|b| decode(b.value()))
                .transpose()?;

            if let Some(mut digests) = digests {
                digests.retain(|d| d != digest);
                if digests.is_empty() {
                    user_tokens.remove(record.user_id)?;
                } else {
                    user_tokens.insert(record.user_id, encode(&digests)?.as_slice())?;
                }
            }
        }

        record.is_some()
    };
    write_txn.commit()?;

    Ok(existed)
}

pub fn count(db: &Database) -> Result<u64> {
    let read_txn = db.begin_read()?;
    let tokens = read_txn.open_table(tables::TOKENS)?;
    Ok(tokens.len()?)
}

/// Remove every token a user holds inside an open write transaction
pub(crate) fn revoke_all_for_user(write_txn: &WriteTransaction, user_id: u64) -> Result<usize> {
    let mut user_tokens = write_txn.open_table(tables::USER_TOKENS)?;
    let digests: Vec<String> = user_tokens
        .remove(user_id)?
        .map(|b| decode(b.value()))
        .transpose()?
        .unwrap_or_default();

    let mut tokens = write_txn.open_table(tables::TOKENS)?;
    for digest in &digests {
        tokens.remove(digest.as_str())?;
    }

    Ok(digests.len())
}
