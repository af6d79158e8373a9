use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection settings for the SQLite backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

impl SqliteConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default database location under the platform data directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("worklog");
        path.push("worklog.db");
        path
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

/// Connection settings for the PostgreSQL backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "worklog".to_string(),
            user: "worklog".to_string(),
            password: String::new(),
        }
    }
}
