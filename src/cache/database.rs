//! SQLite-backed image metadata store.
//!
//! The store is a single table, kept bit-compatible with caches created by
//! earlier versions of the tool:
//!
//! ```sql
//! CREATE TABLE image_data (
//!     id INTEGER PRIMARY KEY,
//!     title TEXT,
//!     explanation TEXT,
//!     file_path TEXT,
//!     sha256 TEXT
//! );
//! ```
//!
//! Fingerprints are always written and compared in uppercase.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::entry::CacheEntry;
use super::error::{CacheError, CacheResult};
use crate::hasher::normalize_fingerprint;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS image_data (
    id INTEGER PRIMARY KEY,
    title TEXT,
    explanation TEXT,
    file_path TEXT,
    sha256 TEXT
);";

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_image_data_sha256 ON image_data(sha256);";

const SELECT_ENTRY_SQL: &str = "SELECT id, title, explanation, file_path, sha256 FROM image_data";

/// Persistent metadata store for cached images.
///
/// Owns one long-lived connection; every operation takes the connection lock
/// for its own duration only.
pub struct ImageDatabase {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ImageDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDatabase")
            .field("path", &self.path)
            .field("conn", &"<sqlite>")
            .finish()
    }
}

impl ImageDatabase {
    /// Open (or create) the store at `path` and make sure the table exists.
    ///
    /// Safe to call on every start; an existing table is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the file is not a SQLite database
    /// or the schema cannot be created.
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.init_schema()?;
        log::debug!("Opened image cache database at {}", path.display());
        Ok(db)
    }

    /// Open a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> CacheResult<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Location of the database file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn init_schema(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        ensure_table(&conn)?;
        conn.execute_batch(CREATE_INDEX_SQL)?;
        Ok(())
    }

    /// Find the id of the entry with the given fingerprint.
    ///
    /// The fingerprint is compared in canonical case, so callers may pass
    /// either case. If several rows share a fingerprint the lowest id wins.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the query fails, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn find_id_by_fingerprint(&self, fingerprint: &str) -> CacheResult<Option<i64>> {
        let fingerprint = normalize_fingerprint(fingerprint);
        let conn = self.lock()?;
        let id = conn
            .query_row(
                "SELECT id FROM image_data WHERE sha256 = ?1 ORDER BY id LIMIT 1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Append a new entry and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the row cannot be inserted, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn insert(
        &self,
        title: &str,
        explanation: &str,
        file_path: &Path,
        fingerprint: &str,
    ) -> CacheResult<i64> {
        let fingerprint = normalize_fingerprint(fingerprint);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO image_data (title, explanation, file_path, sha256)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                title,
                explanation,
                file_path.to_string_lossy(),
                fingerprint
            ],
        )?;
        let id = conn.last_insert_rowid();
        log::debug!("Inserted image cache entry {} ({})", id, fingerprint);
        Ok(id)
    }

    /// Fetch a single entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the query fails, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn get_by_id(&self, id: i64) -> CacheResult<Option<CacheEntry>> {
        let conn = self.lock()?;
        let entry = conn
            .query_row(
                &format!("{SELECT_ENTRY_SQL} WHERE id = ?1"),
                params![id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// All titles in insertion order.
    ///
    /// Re-creates the table first, since this may be the very first call
    /// against a fresh database file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the query fails, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn list_all_titles(&self) -> CacheResult<Vec<String>> {
        let conn = self.lock()?;
        ensure_table(&conn)?;

        let mut stmt = conn.prepare("SELECT title FROM image_data ORDER BY id")?;
        let titles = stmt
            .query_map([], |row| {
                Ok(row.get::<_, Option<String>>(0)?.unwrap_or_default())
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }

    /// Every entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the query fails, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn entries(&self) -> CacheResult<Vec<CacheEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_ENTRY_SQL} ORDER BY id"))?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the query fails, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn len(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM image_data", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Whether the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the query fails, or
    /// [`CacheError::LockPoisoned`] if the connection lock is poisoned.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn ensure_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)
}

// Columns are nullable in the legacy schema.
fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    Ok(CacheEntry {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        explanation: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        file_path: PathBuf::from(row.get::<_, Option<String>>(3)?.unwrap_or_default()),
        fingerprint: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}
