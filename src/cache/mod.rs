//! Content-addressed image cache.
//!
//! This module stores downloaded images on disk exactly once per distinct
//! content and keeps their metadata in a small SQLite database that lives in
//! the same directory.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence of the `image_data` table.
//! * [`entry`]: The records handed out to callers.
//! * [`naming`]: Derivation of file names from titles and source URLs.
//! * [`manager`]: [`ImageCache`], which ties hashing, dedup lookup, file
//!   writing and metadata insertion together.
//!
//! # Identity
//!
//! An image is identified by the SHA-256 fingerprint of its bytes. Offering
//! the same bytes again, under any title or URL, returns the id assigned the
//! first time and touches nothing on disk.

pub mod database;
pub mod entry;
pub mod error;
pub mod manager;
pub mod naming;

pub use database::ImageDatabase;
pub use entry::{CacheEntry, Cached};
pub use error::{CacheError, CacheResult};
pub use manager::{CacheConfig, ImageCache, VerifyIssue, DEFAULT_DATABASE_NAME};
pub use naming::{NamingPolicy, PathNamer};
