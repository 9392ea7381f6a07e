// User Registry - Error Taxonomy
// One enum for every failure the entity, stores and service can report

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum UserError {
    /// Malformed input: blank name, bad email, invalid identifier
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identifier has no stored row
    #[error("User not found with id: {0}")]
    NotFound(i64),

    /// Internal invariant violated (e.g. assigning an id twice)
    #[error("Invalid state: {0}")]
    State(String),

    /// Storage I/O or constraint failure, or a contract violation detected after the fact
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

pub type Result<T> = std::result::Result<T, UserError>;

impl UserError {
    pub fn validation(message: impl Into<String>) -> Self {
        UserError::Validation(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        UserError::State(message.into())
    }

    /// Wrap an underlying storage error with what we were doing when it failed
    pub fn storage<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        UserError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Storage reported an outcome that contradicts what was just confirmed
    pub fn contract(message: impl Into<String>) -> Self {
        UserError::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UserError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::NotFound(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, UserError::State(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, UserError::Storage { .. })
    }
}

impl From<rusqlite::Error> for UserError {
    fn from(error: rusqlite::Error) -> Self {
        UserError::storage("SQLite statement failed", error)
    }
}

impl From<diesel::result::Error> for UserError {
    fn from(error: diesel::result::Error) -> Self {
        UserError::storage("ORM session operation failed", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages() {
        assert_eq!(
            UserError::validation("Name cannot be empty").to_string(),
            "Validation error: Name cannot be empty"
        );
        assert_eq!(UserError::NotFound(7).to_string(), "User not found with id: 7");
        assert_eq!(
            UserError::contract("delete affected no rows").to_string(),
            "Storage error: delete affected no rows"
        );
    }

    #[test]
    fn test_storage_keeps_source() {
        let err: UserError = rusqlite::Error::InvalidQuery.into();
        assert!(err.is_storage());
        assert!(err.source().is_some());

        let contract = UserError::contract("no rows");
        assert!(contract.is_storage());
        assert!(contract.source().is_none());
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let errors = [
            UserError::validation("x"),
            UserError::NotFound(1),
            UserError::state("x"),
            UserError::contract("x"),
        ];

        for err in &errors {
            let hits = [
                err.is_validation(),
                err.is_not_found(),
                err.is_state(),
                err.is_storage(),
            ]
            .iter()
            .filter(|hit| **hit)
            .count();
            assert_eq!(hits, 1, "{err} should match exactly one kind");
        }
    }
}
