// 🧭 User Service - Orchestration between callers and the store
//
// Stateless mediator. Adds what neither the entity nor the store decides:
// - identifiers must be positive before storage is touched
// - absence becomes NotFound here, and only here
// - zero rows affected on a row we just confirmed is a storage contract violation

use crate::entities::user::validate_id;
use crate::entities::User;
use crate::error::{Result, UserError};
use crate::store::UserStore;

pub struct UserService<S: UserStore> {
    store: S,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: S) -> Self {
        UserService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create(&self, name: &str, email: &str) -> Result<User> {
        let user = User::create(name, email)?;
        let saved = self.store.save(user)?;

        tracing::info!(id = ?saved.id(), backend = %self.store.backend(), "user created");
        Ok(saved)
    }

    pub fn find_all(&self) -> Result<Vec<User>> {
        self.store.find_all()
    }

    pub fn find_by_id(&self, id: i64) -> Result<User> {
        validate_id(id)?;

        self.store
            .find_by_id(id)?
            .ok_or(UserError::NotFound(id))
    }

    /// Replace name and email of an existing user
    ///
    /// The write is issued even when the values are unchanged.
    pub fn update(&self, id: i64, name: &str, email: &str) -> Result<User> {
        validate_id(id)?;

        let mut user = self.find_by_id(id)?;
        user.rename(name)?;
        user.re_email(email)?;

        if !self.store.update(&user)? {
            tracing::warn!(id, "update affected no rows after existence check");
            return Err(UserError::contract(format!(
                "Failed to update user with id: {}",
                id
            )));
        }

        tracing::info!(id, "user updated");
        Ok(user)
    }

    pub fn delete_by_id(&self, id: i64) -> Result<()> {
        validate_id(id)?;

        self.find_by_id(id)?;

        if !self.store.delete_by_id(id)? {
            tracing::warn!(id, "delete affected no rows after existence check");
            return Err(UserError::contract(format!(
                "Failed to delete user with id: {}",
                id
            )));
        }

        tracing::info!(id, "user deleted");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, StorageConfig};
    use crate::store;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory store that records every call, and can be told to lose rows
    #[derive(Default)]
    struct RecordingStore {
        rows: Mutex<BTreeMap<i64, (String, String)>>,
        calls: Mutex<Vec<String>>,
        /// Report zero affected rows on update/delete
        drop_writes: bool,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn writes(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.starts_with("save") || c.starts_with("update") || c.starts_with("delete"))
                .count()
        }
    }

    impl UserStore for RecordingStore {
        fn save(&self, mut user: User) -> Result<User> {
            self.record("save");
            let mut rows = self.rows.lock().unwrap();
            let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
            rows.insert(id, (user.name().to_string(), user.email().to_string()));
            user.assign_id(id)?;
            Ok(user)
        }

        fn find_all(&self) -> Result<Vec<User>> {
            self.record("find_all");
            self.rows
                .lock()
                .unwrap()
                .iter()
                .map(|(id, (name, email))| User::reconstruct(Some(*id), name.clone(), email.clone()))
                .collect()
        }

        fn find_by_id(&self, id: i64) -> Result<Option<User>> {
            self.record(format!("find_by_id {}", id));
            self.rows
                .lock()
                .unwrap()
                .get(&id)
                .map(|(name, email)| User::reconstruct(Some(id), name.clone(), email.clone()))
                .transpose()
        }

        fn update(&self, user: &User) -> Result<bool> {
            let id = user.id().unwrap();
            self.record(format!("update {}", id));
            if self.drop_writes {
                return Ok(false);
            }
            let mut rows = self.rows.lock().unwrap();
            Ok(rows
                .insert(id, (user.name().to_string(), user.email().to_string()))
                .is_some())
        }

        fn delete_by_id(&self, id: i64) -> Result<bool> {
            self.record(format!("delete {}", id));
            if self.drop_writes {
                return Ok(false);
            }
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }

        fn backend(&self) -> Backend {
            Backend::Statement
        }
    }

    fn recording_service() -> UserService<RecordingStore> {
        UserService::new(RecordingStore::default())
    }

    #[test]
    fn test_create_validates_before_saving() {
        let service = recording_service();

        assert!(service.create(" ", "ana@x.com").unwrap_err().is_validation());
        assert!(service.create("Ana", "ana.x.com").unwrap_err().is_validation());
        assert!(service.store().calls().is_empty());

        let user = service.create("Ana", "ana@x.com").unwrap();
        assert_eq!(user.id(), Some(1));
    }

    #[test]
    fn test_invalid_ids_never_reach_storage() {
        let service = recording_service();

        for id in [0, -1, i64::MIN] {
            let err = service.find_by_id(id).unwrap_err();
            assert_eq!(err.to_string(), validate_id(id).unwrap_err().to_string());
            assert!(err.is_validation());
            assert!(service.update(id, "Ana", "ana@x.com").unwrap_err().is_validation());
            assert!(service.delete_by_id(id).unwrap_err().is_validation());
        }

        assert!(service.store().calls().is_empty());
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let service = recording_service();

        let err = service.find_by_id(9).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "User not found with id: 9");
    }

    #[test]
    fn test_update_missing_issues_no_write() {
        let service = recording_service();

        assert!(service.update(4, "Ana", "ana@x.com").unwrap_err().is_not_found());
        assert_eq!(service.store().calls(), vec!["find_by_id 4"]);
        assert_eq!(service.store().writes(), 0);
    }

    #[test]
    fn test_update_invalid_fields_issues_no_write() {
        let service = recording_service();
        service.create("Ana", "ana@x.com").unwrap();

        assert!(service.update(1, "", "ana@x.com").unwrap_err().is_validation());
        assert!(service.update(1, "Ana", "bad").unwrap_err().is_validation());

        assert_eq!(service.store().writes(), 1);
        assert_eq!(service.find_by_id(1).unwrap().email(), "ana@x.com");
    }

    #[test]
    fn test_unchanged_update_still_writes() {
        let service = recording_service();
        service.create("Ana", "ana@x.com").unwrap();

        service.update(1, "Ana", "ana@x.com").unwrap();
        assert!(service.store().calls().contains(&"update 1".to_string()));
    }

    #[test]
    fn test_delete_twice() {
        let service = recording_service();
        service.create("Ana", "ana@x.com").unwrap();

        service.delete_by_id(1).unwrap();
        assert!(service.delete_by_id(1).unwrap_err().is_not_found());
        assert_eq!(service.store().writes(), 2);
    }

    #[test]
    fn test_zero_rows_after_existence_check_is_storage_error() {
        let service = UserService::new(RecordingStore {
            drop_writes: true,
            ..RecordingStore::default()
        });
        service.create("Ana", "ana@x.com").unwrap();

        assert!(service.update(1, "Ana", "a@x.com").unwrap_err().is_storage());
        assert!(service.delete_by_id(1).unwrap_err().is_storage());
    }

    #[test]
    fn test_find_all_empty() {
        let service = recording_service();
        assert!(service.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_maria_scenario_on_both_backends() {
        let dir = tempfile::tempdir().unwrap();

        for backend in [Backend::Statement, Backend::Mapped] {
            let path = dir.path().join(format!("{}.sqlite", backend));
            let service = UserService::new(store::open(&StorageConfig::new(backend, path)).unwrap());

            assert!(service.find_all().unwrap().is_empty());

            let maria = service.create("Maria", "maria@ex.com").unwrap();
            assert_eq!(maria.id(), Some(1));

            service.update(1, "Maria Silva", "m@ex.com").unwrap();
            let found = service.find_by_id(1).unwrap();
            assert_eq!(found.name(), "Maria Silva");
            assert_eq!(found.email(), "m@ex.com");

            service.delete_by_id(1).unwrap();
            assert!(service.find_by_id(1).unwrap_err().is_not_found());
            assert!(service.delete_by_id(1).unwrap_err().is_not_found());
            assert!(service.update(1, "Maria", "maria@ex.com").unwrap_err().is_not_found());

            println!("✅ Scenario PASSED on {} backend", backend);
        }
    }

    #[test]
    fn test_round_trip_through_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.sqlite");
        let service = UserService::new(store::open(&StorageConfig::new(Backend::Mapped, path)).unwrap());

        let ana = service.create("Ana", "ana@x.com").unwrap();
        let found = service.find_by_id(ana.id().unwrap()).unwrap();

        assert_eq!(found, ana);
        assert_eq!(service.find_all().unwrap(), vec![ana]);
    }
}
