// Statement Store - parameterized SQL over rusqlite
//
// Every operation opens its own connection and lets it drop on return, so no
// connection outlives the call that needed it, error paths included.
// Each write is a single statement, which SQLite applies atomically.

use super::{database_location, ensure_new, ensure_persisted, users_ddl, UserStore};
use crate::config::{Backend, StorageConfig};
use crate::entities::User;
use crate::error::{Result, UserError};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw row as SQLite hands it back, before entity validation
type UserRow = (Option<i64>, String, String);

pub struct SqlUserStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqlUserStore {
    /// Open the store and make sure the `users` table exists
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = database_location(config)?;
        let store = SqlUserStore {
            path: PathBuf::from(path),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        };
        store.setup_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| {
            UserError::storage(
                format!("Failed to open database {}", self.path.display()),
                e,
            )
        })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| UserError::storage("Failed to set busy timeout", e))?;
        Ok(conn)
    }

    fn setup_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        // WAL so readers don't block the single writer
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|e| UserError::storage("Failed to enable WAL mode", e))?;
        conn.execute(&users_ddl(), [])
            .map_err(|e| UserError::storage("Failed to create users table", e))?;

        tracing::debug!(path = %self.path.display(), "users table ready");
        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }
}

impl UserStore for SqlUserStore {
    fn save(&self, mut user: User) -> Result<User> {
        ensure_new(&user)?;
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![user.name(), user.email()],
        )
        .map_err(|e| UserError::storage("Failed to save user", e))?;

        let id = conn.last_insert_rowid();
        user.assign_id(id)?;

        tracing::info!(id, backend = "statement", "user saved");
        Ok(user)
    }

    fn find_all(&self) -> Result<Vec<User>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name, email FROM users")
            .map_err(|e| UserError::storage("Failed to list users", e))?;

        let rows = stmt
            .query_map([], Self::map_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| UserError::storage("Failed to list users", e))?;

        rows.into_iter()
            .map(|(id, name, email)| User::reconstruct(id, name, email))
            .collect()
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.connection()?;

        let row = conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()
            .map_err(|e| UserError::storage("Failed to find user by id", e))?;

        tracing::debug!(id, found = row.is_some(), "find_by_id");
        row.map(|(id, name, email)| User::reconstruct(id, name, email))
            .transpose()
    }

    fn update(&self, user: &User) -> Result<bool> {
        let id = ensure_persisted(user)?;
        let conn = self.connection()?;

        let affected = conn
            .execute(
                "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
                params![user.name(), user.email(), id],
            )
            .map_err(|e| UserError::storage("Failed to update user", e))?;

        tracing::info!(id, affected, backend = "statement", "user update executed");
        Ok(affected == 1)
    }

    fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.connection()?;

        let affected = conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(|e| UserError::storage("Failed to delete user", e))?;

        tracing::info!(id, affected, backend = "statement", "user delete executed");
        Ok(affected == 1)
    }

    fn backend(&self) -> Backend {
        Backend::Statement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &tempfile::TempDir) -> SqlUserStore {
        let config = StorageConfig::new(Backend::Statement, dir.path().join("users.sqlite"));
        SqlUserStore::open(&config).unwrap()
    }

    #[test]
    fn test_save_assigns_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let ana = store.save(User::create("Ana", "ana@x.com").unwrap()).unwrap();
        let bob = store.save(User::create("Bob", "bob@x.com").unwrap()).unwrap();

        assert_eq!(ana.id(), Some(1));
        assert_eq!(bob.id(), Some(2));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let saved = store.save(User::create("Ana", "ana@x.com").unwrap()).unwrap();
        let found = store.find_by_id(saved.id().unwrap()).unwrap().unwrap();

        assert_eq!(found.id(), saved.id());
        assert_eq!(found.name(), "Ana");
        assert_eq!(found.email(), "ana@x.com");
    }

    #[test]
    fn test_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        assert!(store.find_by_id(1).unwrap().is_none());
        assert!(store.find_all().unwrap().is_empty());
        assert!(!store.delete_by_id(1).unwrap());
    }

    #[test]
    fn test_update_and_delete_report_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let mut user = store.save(User::create("Ana", "ana@x.com").unwrap()).unwrap();
        user.re_email("ana@y.com").unwrap();

        assert!(store.update(&user).unwrap());
        // Unchanged values still hit storage and still match one row
        assert!(store.update(&user).unwrap());
        assert_eq!(store.find_by_id(1).unwrap().unwrap().email(), "ana@y.com");

        assert!(store.delete_by_id(1).unwrap());
        assert!(!store.update(&user).unwrap());
    }

    #[test]
    fn test_schema_setup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = test_store(&dir);
        first.save(User::create("Ana", "ana@x.com").unwrap()).unwrap();

        let second = test_store(&dir);
        assert_eq!(second.find_all().unwrap().len(), 1);
        assert_eq!(second.path(), first.path());
    }

    #[test]
    fn test_invalid_row_surfaces_as_validation() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        // A row written behind the entity's back
        let conn = Connection::open(store.path()).unwrap();
        conn.execute("INSERT INTO users (name, email) VALUES ('  ', 'x@y')", [])
            .unwrap();

        assert!(store.find_by_id(1).unwrap_err().is_validation());
        assert!(store.find_all().unwrap_err().is_validation());
    }

    #[test]
    fn test_unreachable_database_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(Backend::Statement, dir.path().join("missing/dir/users.sqlite"));

        let err = SqlUserStore::open(&config).err().unwrap();
        assert!(err.is_storage());
    }
}
