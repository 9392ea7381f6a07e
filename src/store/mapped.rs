// Mapped Store - Diesel ORM session over SQLite
//
// One long-lived session (a diesel `SqliteConnection`) guarded by a mutex.
// Every write runs inside `Connection::transaction`: committed when the closure
// returns Ok, rolled back on any Err, so a failed write leaves storage unchanged.
// Row structs are internal; only `User` crosses the module boundary.

use super::{database_location, ensure_new, ensure_persisted, users_ddl, UserStore};
use crate::config::{Backend, StorageConfig};
use crate::entities::User;
use crate::error::{Result, UserError};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Mutex, MutexGuard};

mod schema {
    diesel::table! {
        users (id) {
            id -> BigInt,
            name -> Text,
            email -> Text,
        }
    }
}

use schema::users;

// ============================================================================
// ROW MODELS
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct UserRow {
    id: i64,
    name: String,
    email: String,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        User::reconstruct(Some(self.id), self.name, self.email)
    }
}

/// Column values written on insert and update
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = users)]
struct UserFields<'a> {
    name: &'a str,
    email: &'a str,
}

impl<'a> UserFields<'a> {
    fn of(user: &'a User) -> Self {
        UserFields {
            name: user.name(),
            email: user.email(),
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

pub struct MappedUserStore {
    session: Mutex<SqliteConnection>,
}

impl MappedUserStore {
    /// Establish the session and make sure the `users` table exists
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let url = database_location(config)?;
        let mut conn = SqliteConnection::establish(url).map_err(|e| {
            UserError::storage(format!("Failed to open database {}", url), e)
        })?;

        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL;",
            config.busy_timeout_ms
        ))
        .map_err(|e| UserError::storage("Failed to configure ORM session", e))?;
        conn.batch_execute(&users_ddl())
            .map_err(|e| UserError::storage("Failed to create users table", e))?;

        tracing::debug!(path = %url, "users table ready (mapped)");
        Ok(MappedUserStore {
            session: Mutex::new(conn),
        })
    }

    fn session(&self) -> Result<MutexGuard<'_, SqliteConnection>> {
        self.session
            .lock()
            .map_err(|_| UserError::contract("ORM session lock poisoned by an earlier panic"))
    }

    /// Run `work` in one transaction: commit on Ok, roll back on Err
    fn write<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.session()?;
        conn.transaction(work)
    }
}

impl UserStore for MappedUserStore {
    fn save(&self, user: User) -> Result<User> {
        ensure_new(&user)?;

        let saved = self.write(move |conn| {
            let id: i64 = diesel::insert_into(users::table)
                .values(UserFields::of(&user))
                .returning(users::id)
                .get_result(conn)
                .map_err(|e| UserError::storage("Failed to save user", e))?;

            // Inside the transaction: if this fails, the insert is rolled back
            let mut user = user;
            user.assign_id(id)?;
            Ok(user)
        })?;

        tracing::info!(id = ?saved.id(), backend = "mapped", "user saved");
        Ok(saved)
    }

    fn find_all(&self) -> Result<Vec<User>> {
        let mut conn = self.session()?;

        let rows = users::table
            .select(UserRow::as_select())
            .load(&mut *conn)
            .map_err(|e| UserError::storage("Failed to list users", e))?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let mut conn = self.session()?;

        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut *conn)
            .optional()
            .map_err(|e| UserError::storage("Failed to find user by id", e))?;

        tracing::debug!(id, found = row.is_some(), "find_by_id (mapped)");
        row.map(UserRow::into_user).transpose()
    }

    fn update(&self, user: &User) -> Result<bool> {
        let id = ensure_persisted(user)?;

        let affected = self.write(|conn| {
            diesel::update(users::table.find(id))
                .set(UserFields::of(user))
                .execute(conn)
                .map_err(|e| UserError::storage("Failed to update user", e))
        })?;

        tracing::info!(id, affected, backend = "mapped", "user update executed");
        Ok(affected == 1)
    }

    fn delete_by_id(&self, id: i64) -> Result<bool> {
        let affected = self.write(|conn| {
            diesel::delete(users::table.find(id))
                .execute(conn)
                .map_err(|e| UserError::storage("Failed to delete user", e))
        })?;

        tracing::info!(id, affected, backend = "mapped", "user delete executed");
        Ok(affected == 1)
    }

    fn backend(&self) -> Backend {
        Backend::Mapped
    }
}
