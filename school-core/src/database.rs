use crate::common::error::{Result, SchoolError};
use libsql::{Builder, Connection, Database};
use tracing::info;

/// How long a write waits on another service holding the file lock.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Owns the libSQL database and the single connection the storage uses.
///
/// An in-memory database lives only as long as its connection, so the
/// connection is opened once and shared.
pub struct DatabaseManager {
    _db: Database,
    conn: Connection,
}

impl DatabaseManager {
    /// Open (or create) a local database file; `:memory:` is accepted.
    pub async fn new(path: &str) -> Result<Self> {
        info!("Opening database at {}", path);

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SchoolError::Database {
                message: format!("Failed to open database: {e}"),
            })?;

        let conn = db.connect().map_err(|e| SchoolError::Database {
            message: format!("Failed to get database connection: {e}"),
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .await
            .map_err(|e| SchoolError::Database {
                message: format!("Failed to configure connection: {e}"),
            })?;
        // This pragma answers with a row, which execute_batch rejects.
        let mut rows = conn
            .query(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"), ())
            .await
            .map_err(|e| SchoolError::Database {
                message: format!("Failed to set busy timeout: {e}"),
            })?;
        while rows
            .next()
            .await
            .map_err(|e| SchoolError::Database {
                message: format!("Failed to set busy timeout: {e}"),
            })?
            .is_some()
        {}

        Ok(Self { _db: db, conn })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::new(":memory:").await
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let migration_sql_001 = include_str!("../migrations/001_create_school_tables.sql");
        self.conn
            .execute_batch(migration_sql_001)
            .await
            .map_err(|e| SchoolError::Database {
                message: format!("Failed to run base migration: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}
