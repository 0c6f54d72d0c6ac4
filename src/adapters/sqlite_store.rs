//! SQLite blob store: a single key/value table behind an r2d2 pool.

use crate::domain::error::TradeflowError;
use crate::ports::blob_store::BlobStore;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use std::path::Path;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TradeflowError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e: r2d2::Error| TradeflowError::Store {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, TradeflowError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TradeflowError::Store {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, TradeflowError> {
        self.pool.get().map_err(|e: r2d2::Error| TradeflowError::Store {
            reason: e.to_string(),
        })
    }

    fn initialize_schema(&self) -> Result<(), TradeflowError> {
        self.connection()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e: rusqlite::Error| TradeflowError::StoreQuery {
                reason: e.to_string(),
            })
    }
}

impl BlobStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, TradeflowError> {
        self.connection()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e: rusqlite::Error| TradeflowError::StoreQuery {
                reason: e.to_string(),
            })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), TradeflowError> {
        self.connection()?
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e: rusqlite::Error| TradeflowError::StoreQuery {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TradeflowError> {
        self.connection()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e: rusqlite::Error| TradeflowError::StoreQuery {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
