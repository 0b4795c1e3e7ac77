//! Durable key-value storage for client-side usage state
//!
//! The copilot session never touches storage directly; it is handed a
//! [`UsageStore`] so tests can substitute [`MemoryUsageStore`] for the
//! SQLite-backed [`SqliteUsageStore`].

use crate::error::{GovernaiError, Result};
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub mod keys;

/// Key-value persistence capability (get / set / clear)
pub trait UsageStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn clear(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store that survives process restarts
pub struct SqliteUsageStore {
    db_path: PathBuf,
}

impl SqliteUsageStore {
    /// Create a store in the user's data directory
    ///
    /// The `GOVERNAI_USAGE_DB` environment variable overrides the location.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("GOVERNAI_USAGE_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("ai", "governai", "governai")
            .ok_or_else(|| GovernaiError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| GovernaiError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("usage.db"))
    }

    /// Create a store backed by the given database file
    ///
    /// # Examples
    ///
    /// ```
    /// use governai::storage::{SqliteUsageStore, UsageStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteUsageStore::new_with_path(dir.path().join("usage.db")).unwrap();
    /// store.set("governai_query_count", "2").unwrap();
    /// assert_eq!(store.get("governai_query_count").unwrap().as_deref(), Some("2"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| GovernaiError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        tracing::debug!("Usage store ready at {}", store.db_path.display());
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| GovernaiError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| GovernaiError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl UsageStore for SqliteUsageStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to query key")
            .map_err(|e| GovernaiError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .context("Failed to write key")
        .map_err(|e| GovernaiError::Storage(e.to_string()))?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete key")
            .map_err(|e| GovernaiError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// In-memory store; clones share the same map
///
/// Cloning a store and building a new session from the clone models a
/// restart: persisted usage survives, the transcript does not.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryUsageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(map)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| GovernaiError::Storage("Memory store lock poisoned".to_string()).into())
    }
}

impl UsageStore for MemoryUsageStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
