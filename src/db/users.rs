//! User store: blocking redb operations over the users table and its
//! username index. Call these from `spawn_blocking`.

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata};

use crate::db::{decode, encode, tables, tokens};
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};

/// Insert a new user, allocating the next id
///
/// Returns `UsernameTaken` if the username is already registered.
pub fn create(db: &Database, new_user: NewUser, now: i64) -> Result<User> {
    let write_txn = db.begin_write()?;
    let user = {
        let mut usernames = write_txn.open_table(tables::USERNAMES)?;
        if usernames.get(new_user.username.as_str())?.is_some() {
            tracing::info!("Username already taken: {}", new_user.username);
            return Err(AppError::UsernameTaken);
        }

        let mut sequences = write_txn.open_table(tables::SEQUENCES)?;
        let id = sequences
            .get(tables::USER_ID_SEQUENCE)?
            .map(|v| v.value())
            .unwrap_or(0)
            + 1;
        sequences.insert(tables::USER_ID_SEQUENCE, id)?;

        let user = User {
            id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            avatar: new_user.avatar,
            level: new_user.level,
            score: new_user.score,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };

        let mut users = write_txn.open_table(tables::USERS)?;
        users.insert(id, encode(&user)?.as_slice())?;
        usernames.insert(user.username.as_str(), id)?;

        user
    };
    write_txn.commit()?;

    tracing::info!("User {} created with id {}", user.username, user.id);
    Ok(user)
}

pub fn get(db: &Database, id: u64) -> Result<Option<User>> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;

    users
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()
}

pub fn find_by_username(db: &Database, username: &str) -> Result<Option<User>> {
    let read_txn = db.begin_read()?;
    let usernames = read_txn.open_table(tables::USERNAMES)?;

    let Some(id) = usernames.get(username)?.map(|v| v.value()) else {
        return Ok(None);
    };

    let users = read_txn.open_table(tables::USERS)?;
    users
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()
}

/// Snapshot of every user, in id order, from a single read transaction
pub fn load_all(db: &Database) -> Result<Vec<User>> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;

    let mut all = Vec::with_capacity(users.len()? as usize);
    for entry in users.iter()? {
        let (_, bytes) = entry?;
        all.push(decode(bytes.value())?);
    }

    Ok(all)
}

pub fn count(db: &Database) -> Result<u64> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;
    Ok(users.len()?)
}

/// Apply a mutation to a stored user and refresh `updated_at`
///
/// The closure may change any field except `id`. A changed username is
/// re-checked for uniqueness and the index is moved. Last write wins.
pub fn update<F>(db: &Database, id: u64, now: i64, apply: F) -> Result<User>
where
    F: FnOnce(&mut User) -> Result<()>,
{
    let write_txn = db.begin_write()?;
    let user = {
        let mut users = write_txn.open_table(tables::USERS)?;
        let mut user: User = match users.get(id)? {
            Some(bytes) => decode(bytes.value())?,
            None => return Err(AppError::UserNotFound),
        };

        let previous_username = user.username.clone();
        apply(&mut user)?;
        user.id = id;
        user.updated_at = now;

        if user.username != previous_username {
            let mut usernames = write_txn.open_table(tables::USERNAMES)?;
            if usernames.get(user.username.as_str())?.is_some() {
                return Err(AppError::UsernameTaken);
            }
            usernames.remove(previous_username.as_str())?;
            usernames.insert(user.username.as_str(), id)?;
        }

        users.insert(id, encode(&user)?.as_slice())?;
        user
    };
    write_txn.commit()?;

    Ok(user)
}

/// Remove a user, its username index entry, and every token it holds
pub fn delete(db: &Database, id: u64) -> Result<User> {
    let write_txn = db.begin_write()?;
    let (user, revoked) = {
        let mut users = write_txn.open_table(tables::USERS)?;
        let user: User = match users.remove(id)? {
            Some(bytes) => decode(bytes.value())?,
            None => return Err(AppError::UserNotFound),
        };

        let mut usernames = write_txn.open_table(tables::USERNAMES)?;
        usernames.remove(user.username.as_str())?;

        let revoked = tokens::revoke_all_for_user(&write_txn, id)?;
        (user, revoked)
    };
    write_txn.commit()?;

    tracing::info!(
        "User {} deleted, {} access tokens revoked",
        user.username,
        revoked
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use crate::models::Role;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("test.db")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            avatar: "assets/avatars/default.png".to_string(),
            level: 1,
            score: 0,
            role: Role::Player,
        }
    }

    #[test]
    fn test_create_allocates_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        let first = create(&db, new_user("alpha"), 1_000).unwrap();
        let second = create(&db, new_user("beta"), 2_000).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.created_at, 2_000);
        assert_eq!(second.updated_at, 2_000);
        assert_eq!(count(&db).unwrap(), 2);
    }

    #[test]
    fn test_create_rejects_duplicate_username() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        create(&db, new_user("alpha"), 1_000).unwrap();
        let result = create(&db, new_user("alpha"), 2_000);

        assert!(matches!(result, Err(AppError::UsernameTaken)));
        assert_eq!(count(&db).unwrap(), 1);
    }

    #[test]
    fn test_find_by_username() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        let created = create(&db, new_user("alpha"), 1_000).unwrap();

        assert_eq!(find_by_username(&db, "alpha").unwrap(), Some(created));
        assert_eq!(find_by_username(&db, "nobody").unwrap(), None);
    }

    #[test]
    fn test_update_refreshes_updated_at() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let created = create(&db, new_user("alpha"), 1_000).unwrap();

        let updated = update(&db, created.id, 5_000, |user| {
            user.score = 250;
            Ok(())
        })
        .unwrap();

        assert_eq!(updated.score, 250);
        assert_eq!(updated.created_at, 1_000);
        assert_eq!(updated.updated_at, 5_000);
        assert_eq!(get(&db, created.id).unwrap(), Some(updated));
    }

    #[test]
    fn test_update_moves_username_index() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let alpha = create(&db, new_user("alpha"), 1_000).unwrap();
        create(&db, new_user("beta"), 1_000).unwrap();

        let clash = update(&db, alpha.id, 2_000, |user| {
            user.username = "beta".to_string();
            Ok(())
        });
        assert!(matches!(clash, Err(AppError::UsernameTaken)));

        update(&db, alpha.id, 2_000, |user| {
            user.username = "gamma".to_string();
            Ok(())
        })
        .unwrap();

        assert!(find_by_username(&db, "alpha").unwrap().is_none());
        assert_eq!(find_by_username(&db, "gamma").unwrap().unwrap().id, alpha.id);
    }

    #[test]
    fn test_update_missing_user() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        let result = update(&db, 42, 1_000, |_| Ok(()));
        assert!(matches!(result, Err(AppError::UserNotFound)));
    }

    #[test]
    fn test_load_all_in_id_order() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        for name in ["c", "a", "b"] {
            create(&db, new_user(name), 1_000).unwrap();
        }

        let names: Vec<_> = load_all(&db)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_delete_frees_username() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let alpha = create(&db, new_user("alpha"), 1_000).unwrap();

        delete(&db, alpha.id).unwrap();

        assert!(get(&db, alpha.id).unwrap().is_none());
        assert!(matches!(delete(&db, alpha.id), Err(AppError::UserNotFound)));
        assert!(create(&db, new_user("alpha"), 2_000).is_ok());
    }
}
