// User Registry - Configuration
// TOML file -> environment overrides -> CLI overrides (applied by the binary)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_BACKEND: &str = "USER_REGISTRY_BACKEND";
pub const ENV_DATABASE: &str = "USER_REGISTRY_DATABASE";

// ============================================================================
// BACKEND
// ============================================================================

/// Which persistence strategy backs the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Backend {
    /// Parameterized SQL over rusqlite, one connection per operation
    #[default]
    Statement,

    /// Diesel ORM session, every write inside a transaction
    Mapped,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Statement => "statement",
            Backend::Mapped => "mapped",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "statement" | "sql" => Ok(Backend::Statement),
            "mapped" | "orm" => Ok(Backend::Mapped),
            other => Err(anyhow!(
                "Unknown storage backend '{}' (expected 'statement' or 'mapped')",
                other
            )),
        }
    }
}

// TOML, env vars and CLI flags all go through the same parser
impl TryFrom<String> for Backend {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub database_path: PathBuf,
    /// How long a writer waits for the SQLite file lock before failing
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: Backend::default(),
            database_path: PathBuf::from("cruddb.sqlite"),
            busy_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    pub fn new(backend: Backend, database_path: impl Into<PathBuf>) -> Self {
        StorageConfig {
            backend,
            database_path: database_path.into(),
            ..StorageConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by RUST_LOG
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "user_registry=info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load from `path` if given, otherwise start from defaults; then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_overrides(
            std::env::var(ENV_BACKEND).ok().as_deref(),
            std::env::var(ENV_DATABASE).ok().as_deref(),
        )?;
        Ok(config)
    }

    /// Apply backend / database overrides (env vars or CLI flags)
    pub fn apply_overrides(&mut self, backend: Option<&str>, database: Option<&str>) -> Result<()> {
        if let Some(backend) = backend {
            self.storage.backend = backend.parse()?;
        }
        if let Some(database) = database {
            self.storage.database_path = PathBuf::from(database);
        }
        Ok(())
    }
}
