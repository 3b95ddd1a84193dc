//! SHA-256 content fingerprints.
//!
//! # Overview
//! A fingerprint is the SHA-256 digest of an image's raw bytes rendered as
//! 64 uppercase hexadecimal characters. Uppercase is the canonical form:
//! it is what the metadata store persists and what every comparison uses.
//!
//! # Example
//!
//! ```
//! use apod_cache::hasher::{fingerprint, normalize_fingerprint};
//!
//! let fp = fingerprint(b"hello");
//! assert_eq!(fp.len(), 64);
//! assert_eq!(normalize_fingerprint(&fp.to_lowercase()), fp);
//! ```

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Length of a fingerprint in hexadecimal characters.
pub const FINGERPRINT_LEN: usize = 64;

/// Buffer size used when streaming files through the hasher.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the fingerprint of a byte slice.
///
/// Never fails, including for empty input.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:X}", hasher.finalize())
}

/// Compute the fingerprint of a file on disk without loading it whole.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:X}", hasher.finalize()))
}

/// Bring a caller-supplied fingerprint into canonical (uppercase) form.
#[must_use]
pub fn normalize_fingerprint(fp: &str) -> String {
    fp.trim().to_ascii_uppercase()
}
