//! Cache entry definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One cached image as recorded in the `image_data` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Row id, assigned in insertion order and never reused.
    pub id: i64,
    /// Image title as supplied by the caller.
    pub title: String,
    /// Free-form description of the image.
    pub explanation: String,
    /// Where the image bytes were written.
    pub file_path: PathBuf,
    /// Uppercase hex SHA-256 of the image bytes (the `sha256` column).
    pub fingerprint: String,
}

/// Result of [`ImageCache::ensure_cached`](super::ImageCache::ensure_cached).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cached {
    /// Id of the entry holding this content.
    pub id: i64,
    /// Fingerprint of the offered bytes.
    pub fingerprint: String,
    /// File holding the bytes on disk.
    pub file_path: PathBuf,
    /// `true` if this call wrote the file and inserted the row,
    /// `false` if the content was already cached.
    pub inserted: bool,
}
