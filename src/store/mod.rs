// 🗄️ Storage Layer - One contract, two strategies
//
// The store only reports mechanical outcomes:
// - absence is `Ok(None)`, never an error
// - zero rows affected is `Ok(false)`, never an error
// - domain validation belongs to the entity, "not found is fatal" to the service

pub mod mapped;
pub mod sql;

use crate::config::{Backend, StorageConfig};
use crate::entities::User;
use crate::error::{Result, UserError};

pub use mapped::MappedUserStore;
pub use sql::SqlUserStore;

/// Maximum stored length of `name` and `email`
pub const MAX_FIELD_LEN: usize = 100;

/// Schema shared by both adapters (idempotent)
///
/// SQLite ignores VARCHAR lengths, so the bound is also a CHECK.
pub fn users_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR({max}) NOT NULL CHECK (length(name) <= {max}),
    email VARCHAR({max}) NOT NULL CHECK (length(email) <= {max})
)",
        max = MAX_FIELD_LEN
    )
}

/// File path both adapters open
///
/// In-memory and empty paths are refused: the statement store opens a new
/// connection per call, so each call would see a fresh, empty database.
pub(crate) fn database_location(config: &StorageConfig) -> Result<&str> {
    let path = config.database_path.to_str().ok_or_else(|| {
        UserError::validation(format!(
            "Database path is not valid UTF-8: {}",
            config.database_path.display()
        ))
    })?;

    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(UserError::validation("Database path cannot be empty"));
    }
    let uri_memory = trimmed.starts_with("file:") && trimmed.contains("mode=memory");
    if trimmed == ":memory:" || trimmed.starts_with("file::memory:") || uri_memory {
        return Err(UserError::validation(
            "In-memory databases are not supported; configure a database file",
        ));
    }

    Ok(path)
}

// ============================================================================
// STORE CONTRACT
// ============================================================================

pub trait UserStore {
    /// Insert a new user and assign the generated id. The user must not have an id yet.
    fn save(&self, user: User) -> Result<User>;

    /// Every stored user, in whatever order storage returns them
    fn find_all(&self) -> Result<Vec<User>>;

    fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Overwrite name and email of a persisted user; true if exactly one row changed
    fn update(&self, user: &User) -> Result<bool>;

    /// True if exactly one row was removed
    fn delete_by_id(&self, id: i64) -> Result<bool>;

    fn backend(&self) -> Backend;
}

impl<S: UserStore + ?Sized> UserStore for Box<S> {
    fn save(&self, user: User) -> Result<User> {
        (**self).save(user)
    }

    fn find_all(&self) -> Result<Vec<User>> {
        (**self).find_all()
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        (**self).find_by_id(id)
    }

    fn update(&self, user: &User) -> Result<bool> {
        (**self).update(user)
    }

    fn delete_by_id(&self, id: i64) -> Result<bool> {
        (**self).delete_by_id(id)
    }

    fn backend(&self) -> Backend {
        (**self).backend()
    }
}

pub type DynUserStore = Box<dyn UserStore + Send + Sync>;

/// Build the store selected by configuration
pub fn open(config: &StorageConfig) -> Result<DynUserStore> {
    tracing::debug!(
        backend = %config.backend,
        path = %config.database_path.display(),
        "opening user store"
    );

    let store: DynUserStore = match config.backend {
        Backend::Statement => Box::new(SqlUserStore::open(config)?),
        Backend::Mapped => Box::new(MappedUserStore::open(config)?),
    };
    Ok(store)
}

// ============================================================================
// SHARED PRECONDITIONS
// ============================================================================

pub(crate) fn ensure_new(user: &User) -> Result<()> {
    match user.id() {
        Some(id) => Err(UserError::state(format!(
            "User already persisted with id {}; save only accepts new users",
            id
        ))),
        None => Ok(()),
    }
}

pub(crate) fn ensure_persisted(user: &User) -> Result<i64> {
    user.id()
        .ok_or_else(|| UserError::state("Cannot update a user that has not been saved"))
}

// ============================================================================
// TESTS
// ============================================================================
