// User Registry - Core Library
// Exposes the entity, storage adapters and service for the CLI and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::{Backend, Config, LoggingConfig, StorageConfig};
pub use entities::{validate_email, validate_name, User};
pub use error::{Result, UserError};
pub use service::UserService;
pub use store::{DynUserStore, MappedUserStore, SqlUserStore, UserStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
