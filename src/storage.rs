//! Key-value persistence for settings, contacts, name and confirmation
//!
//! The application sees storage as an opaque get/set byte store with four
//! independent keys. The on-disk backend is a single SQLite table; an
//! in-memory map stands in for tests and throwaway sessions.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CalcError;

/// JSON protocol table
pub const SETTINGS_KEY: &str = "settings";
/// JSON contact book
pub const CONTACTS_KEY: &str = "contacts";
/// Raw display name
pub const NAME_KEY: &str = "name";
/// `"true"` once the caregiver has saved a reviewed protocol
pub const CONFIRMED_KEY: &str = "confirmed";

pub const ALL_KEYS: [&str; 4] = [SETTINGS_KEY, CONTACTS_KEY, NAME_KEY, CONFIRMED_KEY];

/// Opaque byte store
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CalcError>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), CalcError>;

    /// When a key was last written, if the backend tracks it
    fn updated_at(&self, _key: &str) -> Result<Option<String>, CalcError> {
        Ok(None)
    }
}

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create or open a database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CalcError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, CalcError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, CalcError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        info!("Key-value store ready");
        Ok(Self { conn })
    }
}

fn unavailable(key: &str, err: rusqlite::Error) -> CalcError {
    CalcError::PersistenceUnavailable(format!("{}: {}", key, err))
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CalcError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(|e| unavailable(key, e))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), CalcError> {
        let now = chrono::Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(|e| unavailable(key, e))?;
        Ok(())
    }

    fn updated_at(&self, key: &str) -> Result<Option<String>, CalcError> {
        self.conn
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(|e| unavailable(key, e))
    }
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CalcError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), CalcError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Read a key as text. Failures are logged and read as "not stored".
pub fn read_text(store: &dyn KvStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(Some(bytes)) => match String::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Stored value for {} is not UTF-8 ({}). Ignoring it.", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Could not read {}: {}. Using defaults.", key, e);
            None
        }
    }
}

/// Write a key as text. Failures are logged and absorbed; returns whether
/// the write landed.
pub fn write_text(store: &mut dyn KvStore, key: &str, value: &str) -> bool {
    match store.set(key, value.as_bytes()) {
        Ok(()) => {
            debug!("Persisted {} ({} bytes)", key, value.len());
            true
        }
        Err(e) => {
            warn!("Could not save {}: {}", key, e);
            false
        }
    }
}
