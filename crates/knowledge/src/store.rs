//! Embedded document store.
//!
//! Documents are hash records `(key, field) -> bytes` kept in SQLite, plus
//! the persisted index definitions. Writing a hash replaces the whole record
//! inside one transaction, so readers never observe a half-written document.

use crate::schema::IndexSchema;
use docrag_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// A stored hash: field name to raw value.
pub type Hash = HashMap<String, Vec<u8>>;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT NOT NULL,
    field TEXT NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (key, field)
);

CREATE TABLE IF NOT EXISTS index_definitions (
    name TEXT PRIMARY KEY,
    definition TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

fn store_err(context: &'static str) -> impl Fn(rusqlite::Error) -> AppError {
    move |e| AppError::Store(format!("{}: {}", context, e))
}

pub struct DocumentStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// Open (or create) a store on disk.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Store(format!("Failed to create store directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(store_err("Failed to open SQLite store"))?;
        let store = Self::init(conn, Some(db_path.to_path_buf()))?;

        tracing::debug!("Opened document store at {:?}", db_path);
        Ok(store)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(store_err("Failed to open in-memory store"))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> AppResult<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(store_err("Failed to create tables"))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("Store connection lock poisoned".to_string()))
    }

    /// Replace every field of `key` with `fields`.
    pub fn put_hash(&self, key: &str, fields: &[(&str, &[u8])]) -> AppResult<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(store_err("Failed to begin transaction"))?;

        tx.execute("DELETE FROM entries WHERE key = ?1", params![key])
            .map_err(store_err("Failed to clear previous record"))?;

        {
            let mut stmt = tx
                .prepare("INSERT INTO entries (key, field, value) VALUES (?1, ?2, ?3)")
                .map_err(store_err("Failed to prepare insert"))?;
            for (field, value) in fields {
                stmt.execute(params![key, field, value])
                    .map_err(store_err("Failed to write field"))?;
            }
        }

        tx.commit().map_err(store_err("Failed to commit record"))?;
        Ok(())
    }

    pub fn get_hash(&self, key: &str) -> AppResult<Option<Hash>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT field, value FROM entries WHERE key = ?1")
            .map_err(store_err("Failed to prepare query"))?;

        let rows = stmt
            .query_map(params![key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })
            .map_err(store_err("Failed to read record"))?;

        let mut hash = Hash::new();
        for row in rows {
            let (field, value) = row.map_err(store_err("Failed to read field"))?;
            hash.insert(field, value);
        }

        Ok(if hash.is_empty() { None } else { Some(hash) })
    }

    /// Keys starting with `prefix`, sorted.
    pub fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT key FROM entries WHERE substr(key, 1, ?2) = ?1 ORDER BY key",
            )
            .map_err(store_err("Failed to prepare scan"))?;

        let keys = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(store_err("Failed to scan keys"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("Failed to read key"))?;

        Ok(keys)
    }

    /// Every hash under `prefix`, sorted by key.
    pub fn load_prefix(&self, prefix: &str) -> AppResult<Vec<(String, Hash)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT key, field, value FROM entries WHERE substr(key, 1, ?2) = ?1 ORDER BY key",
            )
            .map_err(store_err("Failed to prepare load"))?;

        let rows = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(store_err("Failed to load records"))?;

        let mut grouped: BTreeMap<String, Hash> = BTreeMap::new();
        for row in rows {
            let (key, field, value) = row.map_err(store_err("Failed to read record"))?;
            grouped.entry(key).or_default().insert(field, value);
        }

        Ok(grouped.into_iter().collect())
    }

    /// Delete every key under `prefix`. Returns the number of keys removed.
    pub fn delete_prefix(&self, prefix: &str) -> AppResult<usize> {
        let mut conn = self.conn()?;
        let len = prefix.chars().count() as i64;
        let tx = conn
            .transaction()
            .map_err(store_err("Failed to begin transaction"))?;

        let keys: i64 = tx
            .query_row(
                "SELECT COUNT(DISTINCT key) FROM entries WHERE substr(key, 1, ?2) = ?1",
                params![prefix, len],
                |row| row.get(0),
            )
            .map_err(store_err("Failed to count keys"))?;

        tx.execute(
            "DELETE FROM entries WHERE substr(key, 1, ?2) = ?1",
            params![prefix, len],
        )
        .map_err(store_err("Failed to delete keys"))?;

        tx.commit().map_err(store_err("Failed to commit delete"))?;
        Ok(keys as usize)
    }

    pub fn count_prefix(&self, prefix: &str) -> AppResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT key) FROM entries WHERE substr(key, 1, ?2) = ?1",
                params![prefix, prefix.chars().count() as i64],
                |row| row.get(0),
            )
            .map_err(store_err("Failed to count keys"))?;
        Ok(count as usize)
    }

    /// Total value bytes stored under `prefix`.
    pub fn prefix_size_bytes(&self, prefix: &str) -> AppResult<u64> {
        let conn = self.conn()?;
        let size: Option<i64> = conn
            .query_row(
                "SELECT SUM(length(value)) FROM entries WHERE substr(key, 1, ?2) = ?1",
                params![prefix, prefix.chars().count() as i64],
                |row| row.get(0),
            )
            .map_err(store_err("Failed to measure prefix"))?;
        Ok(size.unwrap_or(0) as u64)
    }

    pub fn save_index_definition(&self, schema: &IndexSchema) -> AppResult<()> {
        let definition = serde_json::to_string(schema)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO index_definitions (name, definition, updated_at)
             VALUES (?1, ?2, ?3)",
            params![schema.name, definition, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(store_err("Failed to save index definition"))?;
        Ok(())
    }

    pub fn load_index_definition(&self, name: &str) -> AppResult<Option<IndexSchema>> {
        let conn = self.conn()?;
        let definition: Option<String> = conn
            .query_row(
                "SELECT definition FROM index_definitions WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err("Failed to load index definition"))?;

        match definition {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Returns whether a definition existed.
    pub fn remove_index_definition(&self, name: &str) -> AppResult<bool> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM index_definitions WHERE name = ?1",
                params![name],
            )
            .map_err(store_err("Failed to remove index definition"))?;
        Ok(removed > 0)
    }

    pub fn list_index_definitions(&self) -> AppResult<Vec<IndexSchema>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT definition FROM index_definitions ORDER BY name")
            .map_err(store_err("Failed to prepare listing"))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(store_err("Failed to list index definitions"))?;

        let mut schemas = Vec::new();
        for row in rows {
            let json = row.map_err(store_err("Failed to read index definition"))?;
            schemas.push(serde_json::from_str(&json)?);
        }
        Ok(schemas)
    }
}
