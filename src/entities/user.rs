// 👤 User Entity - Self-validating account holder
//
// "The id is IDENTITY (assigned once by storage), name and email are VALUES (can change)"
//
// Rules enforced here, on every construction and every mutation:
// - name is never blank
// - email is never blank and always contains '@'
// - id goes from unset to set exactly once
// - a user materialized from storage always has an id

use crate::error::{Result, UserError};
use serde::Serialize;
use std::fmt;

// ============================================================================
// VALIDATION
// ============================================================================

/// Check a candidate name without building a user
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(UserError::validation("Name cannot be empty"));
    }
    Ok(())
}

/// Check a candidate email without building a user
pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(UserError::validation("Email cannot be empty"));
    }

    if !email.contains('@') {
        return Err(UserError::validation(format!("Invalid email: {}", email)));
    }

    Ok(())
}

/// Identifiers are storage rowids: anything below 1 can never name a row
pub(crate) fn validate_id(id: i64) -> Result<()> {
    if id <= 0 {
        return Err(UserError::validation(format!(
            "User id must be positive, got {}",
            id
        )));
    }
    Ok(())
}

// ============================================================================
// USER ENTITY
// ============================================================================

/// A registered user
///
/// Fields are private: the validating constructors and setters are the only
/// way to produce or change a `User`, so an instance is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: Option<i64>,
    name: String,
    email: String,
}

impl User {
    /// New, not yet persisted user (id unset)
    pub fn create(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let email = email.into();

        validate_name(&name)?;
        validate_email(&email)?;

        Ok(User {
            id: None,
            name,
            email,
        })
    }

    /// Rebuild a user from a stored row
    ///
    /// Only the storage adapters call this. A row without an id is rejected.
    pub fn reconstruct(
        id: Option<i64>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self> {
        let id = id.ok_or_else(|| UserError::validation("Persisted user must have an id"))?;
        validate_id(id)?;

        let mut user = User::create(name, email)?;
        user.id = Some(id);
        Ok(user)
    }

    /// One-shot transition from unset to set id
    pub fn assign_id(&mut self, id: i64) -> Result<()> {
        if let Some(current) = self.id {
            return Err(UserError::state(format!(
                "Id already assigned ({}) and cannot be changed",
                current
            )));
        }

        validate_id(id)?;
        self.id = Some(id);
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn re_email(&mut self, email: impl Into<String>) -> Result<()> {
        let email = email.into();
        validate_email(&email)?;
        self.email = email;
        Ok(())
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Has storage assigned an id yet?
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map(|id| id.to_string()).unwrap_or_default();
        write!(f, "User{{id={}, name='{}', email='{}'}}", id, self.name, self.email)
    }
}

// ============================================================================
// TESTS
// ============================================================================
