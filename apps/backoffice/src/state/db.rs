//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! ## Thread Safety
//! `Database` holds an `Arc<dyn DocumentStore>`; the SQLite backend is a
//! connection pool, so commands can run queries concurrently without
//! explicit locking.

use apotheca_db::{Database, DbConfig, DbError, DbResult};

use super::AppConfig;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (and migrates) the database named in the config.
    pub async fn open(config: &AppConfig) -> DbResult<Self> {
        let db_config = if config.database.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            if let Some(dir) = config.database.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| {
                    DbError::ConnectionFailed(format!("{}: {}", dir.display(), e))
                })?;
            }
            DbConfig::new(&config.database.path).max_connections(config.database.max_connections)
        };
        Ok(DbState::new(Database::new(db_config).await?))
    }

    /// In-memory store, for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        DbState::new(Database::in_memory())
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}
