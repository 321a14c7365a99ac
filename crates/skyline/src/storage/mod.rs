//! Storage layer for skyline.
//!
//! This module provides a `SQLite`-backed key-value store for values that
//! live on the device: JSON documents addressed by string keys. Access goes
//! through one connection behind a mutex, and [`Storage::update`] runs its
//! read-modify-write inside a single transaction, so concurrent writers in
//! one process never lose updates.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Key-value storage engine.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::internal(format!("storage lock poisoned: {e}")))
    }

    /// Read and deserialize the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored JSON does not match `T`.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.lock()?;
        read_value(&conn, key)
    }

    /// Serialize `value` and store it under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let conn = self.lock()?;
        write_value(&conn, key, value)
    }

    /// Remove `key`. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM items WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// Remove every key. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM items", [])?;
        if affected > 0 {
            info!("Cleared {} stored items", affected);
        }
        Ok(affected)
    }

    /// All keys in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM items ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Atomically read, transform and write the value under `key`.
    ///
    /// `f` receives the current value (if any) and returns the value to store
    /// together with a result handed back to the caller. The whole cycle runs
    /// in one immediate transaction while holding the connection lock.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, deserializing or writing fails; nothing
    /// is written in that case.
    pub fn update<T, R, F>(&self, key: &str, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> (T, R),
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = read_value(&tx, key)?;
        let (next, output) = f(current);
        write_value(&tx, key, &next)?;

        tx.commit()?;
        Ok(output)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let conn = self.lock()?;

        let total_keys: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        let newest: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM items ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let last_updated = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_keys,
            last_updated,
            db_size_bytes,
        })
    }
}

fn read_value<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;

    raw.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(Error::from)
}

fn write_value<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    conn.execute(
        r"
        INSERT INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        ",
        params![key, json, Utc::now().to_rfc3339()],
    )?;
    debug!(key, "stored item");
    Ok(())
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored keys.
    pub total_keys: i64,
    /// When any key was last written.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        notifications: bool,
    }

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_set_and_get() {
        let storage = create_test_storage();
        let prefs = Prefs {
            theme: "dark".to_string(),
            notifications: true,
        };

        storage.set_item("prefs", &prefs).unwrap();
        let loaded: Option<Prefs> = storage.get_item("prefs").unwrap();
        assert_eq!(loaded, Some(prefs));
    }

    #[test]
    fn test_get_missing() {
        let storage = create_test_storage();
        let loaded: Option<Vec<String>> = storage.get_item("nope").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let storage = create_test_storage();
        storage.set_item("n", &1).unwrap();
        storage.set_item("n", &2).unwrap();
        assert_eq!(storage.get_item::<i32>("n").unwrap(), Some(2));
        assert_eq!(storage.keys().unwrap(), vec!["n".to_string()]);
    }

    #[test]
    fn test_get_wrong_type_is_json_error() {
        let storage = create_test_storage();
        storage.set_item("n", "text").unwrap();
        let err = storage.get_item::<i32>("n").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_remove_item() {
        let storage = create_test_storage();
        storage.set_item("a", &true).unwrap();

        assert!(storage.remove_item("a").unwrap());
        assert!(!storage.remove_item("a").unwrap());
        assert!(storage.get_item::<bool>("a").unwrap().is_none());
    }

    #[test]
    fn test_keys_and_clear() {
        let storage = create_test_storage();
        storage.set_item("b", &1).unwrap();
        storage.set_item("a", &2).unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(storage.clear().unwrap(), 2);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_update_creates_and_modifies() {
        let storage = create_test_storage();

        let len = storage
            .update("list", |current: Option<Vec<u32>>| {
                let mut list = current.unwrap_or_default();
                list.push(1);
                let len = list.len();
                (list, len)
            })
            .unwrap();
        assert_eq!(len, 1);

        let len = storage
            .update("list", |current: Option<Vec<u32>>| {
                let mut list = current.unwrap_or_default();
                list.push(2);
                let len = list.len();
                (list, len)
            })
            .unwrap();
        assert_eq!(len, 2);
        assert_eq!(storage.get_item::<Vec<u32>>("list").unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_update_does_not_write_on_read_error() {
        let storage = create_test_storage();
        storage.set_item("list", "not a list").unwrap();

        let result = storage.update("list", |current: Option<Vec<u32>>| {
            (current.unwrap_or_default(), ())
        });
        assert!(result.is_err());
        assert_eq!(
            storage.get_item::<String>("list").unwrap().as_deref(),
            Some("not a list")
        );
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_writes() {
        let storage = Arc::new(create_test_storage());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        storage
                            .update("ids", |current: Option<Vec<String>>| {
                                let mut ids = current.unwrap_or_default();
                                ids.push(format!("{i}-{j}"));
                                (ids, ())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ids: Vec<String> = storage.get_item("ids").unwrap().unwrap();
        assert_eq!(ids.len(), 80);
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let empty = storage.stats().unwrap();
        assert_eq!(empty.total_keys, 0);
        assert!(empty.last_updated.is_none());
        assert_eq!(empty.db_size_bytes, 0);

        storage.set_item("k", &"v").unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_keys, 1);
        assert!(stats.last_updated.is_some());
    }

    #[test]
    fn test_open_file_based_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("skyline_storage_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let db_path = root.join("nested").join("skyline.db");

        let storage = Storage::open(&db_path).unwrap();
        storage.set_item("k", &42).unwrap();
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
        drop(storage);

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.get_item::<i32>("k").unwrap(), Some(42));

        drop(reopened);
        let _ = std::fs::remove_dir_all(&root);
    }
}
