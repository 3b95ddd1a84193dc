//! Errors raised by the image cache.

use std::path::PathBuf;

/// Errors that can occur while storing or reading cached images.
///
/// A lookup that finds nothing is not an error; it is reported as `None`.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The metadata store could not complete an operation.
    #[error("Image cache database error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The image bytes could not be written to disk.
    #[error("Failed to write image to {path}: {source}")]
    Write {
        /// Destination that could not be written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The cache directory could not be created.
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A previous operation panicked while holding a cache lock.
    #[error("Image cache lock poisoned")]
    LockPoisoned,
}

/// Result type for image cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
