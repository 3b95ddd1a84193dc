//! The image cache: deduplicating storage of image bytes plus metadata.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::database::ImageDatabase;
use super::entry::{CacheEntry, Cached};
use super::error::{CacheError, CacheResult};
use super::naming::PathNamer;
use crate::hasher::{fingerprint, fingerprint_file};

/// File name of the metadata store inside the cache directory.
pub const DEFAULT_DATABASE_NAME: &str = "image_cache.db";

/// Suffixes SQLite appends to the store name for its side files.
const STORE_SIDE_FILE_SUFFIXES: [&str; 4] = ["", "-journal", "-wal", "-shm"];

/// Settings for an [`ImageCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory receiving image files.
    pub root: PathBuf,
    /// Metadata store file name, relative to `root`.
    pub database_name: String,
    /// File naming rules.
    pub namer: PathNamer,
    /// Remove a freshly written file when its row cannot be inserted.
    pub cleanup_orphans: bool,
}

impl CacheConfig {
    /// Defaults rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            namer: PathNamer::default(),
            cleanup_orphans: true,
        }
    }

    /// Use a different naming scheme.
    #[must_use]
    pub fn with_namer(mut self, namer: PathNamer) -> Self {
        self.namer = namer;
        self
    }

    /// Enable or disable orphan cleanup.
    #[must_use]
    pub fn with_cleanup_orphans(mut self, cleanup: bool) -> Self {
        self.cleanup_orphans = cleanup;
        self
    }

    /// Full path of the metadata store.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.root.join(&self.database_name)
    }
}

/// Problem found by [`ImageCache::verify`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerifyIssue {
    /// The entry's file no longer exists or cannot be read.
    Missing { id: i64, path: PathBuf },
    /// The file's content no longer hashes to the stored fingerprint.
    Mismatch {
        id: i64,
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Content-addressed store of images.
///
/// Identical bytes are stored once, however many times and under whatever
/// titles they are offered. Entries are never updated or removed.
///
/// The check-then-insert sequence of [`ensure_cached`](Self::ensure_cached)
/// runs under a cache-wide lock, so sharing one `ImageCache` between threads
/// cannot produce two entries for the same content.
#[derive(Debug)]
pub struct ImageCache {
    db: ImageDatabase,
    root: PathBuf,
    namer: PathNamer,
    cleanup_orphans: bool,
    ensure_lock: Mutex<()>,
}

impl ImageCache {
    /// Open the cache described by `config`, creating its directory and
    /// metadata store as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CreateDir`] if the directory cannot be created,
    /// or [`CacheError::Storage`] if the store cannot be opened.
    pub fn open(config: CacheConfig) -> CacheResult<Self> {
        fs::create_dir_all(&config.root).map_err(|source| CacheError::CreateDir {
            path: config.root.clone(),
            source,
        })?;
        let db = ImageDatabase::open(&config.database_path())?;
        log::debug!("Image cache directory: {}", config.root.display());
        Ok(Self::with_database(config, db))
    }

    /// Build a cache around an already opened store.
    ///
    /// The cache directory is not created.
    #[must_use]
    pub fn with_database(config: CacheConfig, db: ImageDatabase) -> Self {
        Self {
            db,
            root: config.root,
            namer: config.namer,
            cleanup_orphans: config.cleanup_orphans,
            ensure_lock: Mutex::new(()),
        }
    }

    /// Directory receiving image files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The underlying metadata store.
    #[must_use]
    pub fn database(&self) -> &ImageDatabase {
        &self.db
    }

    /// Make sure `image_bytes` are cached and return the entry holding them.
    ///
    /// When the content is already known its id is returned and nothing is
    /// written. Otherwise the bytes are written to a path derived from
    /// `title` and `source_url` and a new entry is inserted. A derived path
    /// that would land on the metadata store gets the fingerprint suffix
    /// instead.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Write`] if the file cannot be written; no entry is
    ///   inserted in that case.
    /// - [`CacheError::Storage`] if the store fails; a file created by this
    ///   call is removed again when orphan cleanup is enabled. A file that
    ///   already existed is never removed.
    /// - [`CacheError::LockPoisoned`] if another caller panicked mid-insert.
    pub fn ensure_cached(
        &self,
        title: &str,
        explanation: &str,
        image_bytes: &[u8],
        source_url: &str,
    ) -> CacheResult<Cached> {
        let fp = fingerprint(image_bytes);
        log::debug!("Image fingerprint: {}", fp);

        let _guard = self.ensure_lock.lock().map_err(|_| CacheError::LockPoisoned)?;

        if let Some(id) = self.db.find_id_by_fingerprint(&fp)? {
            log::info!("Image is already in cache (id {})", id);
            let file_path = self
                .db
                .get_by_id(id)?
                .map(|entry| entry.file_path)
                .unwrap_or_default();
            return Ok(Cached {
                id,
                fingerprint: fp,
                file_path,
                inserted: false,
            });
        }
        log::debug!("Image is not in cache");

        let mut path = self.namer.derive_path(&self.root, title, source_url, &fp);
        if self.is_store_file(&path) {
            let renamed = self
                .namer
                .derive_suffixed_path(&self.root, title, source_url, &fp);
            log::warn!(
                "{} is the metadata store, saving '{}' as {}",
                path.display(),
                title,
                renamed.display()
            );
            path = renamed;
        }

        // Only files created by this call are ours to clean up.
        let existed = path.exists();
        if existed {
            log::warn!(
                "Overwriting {} with different content for '{}'",
                path.display(),
                title
            );
        }
        write_image(&path, image_bytes, existed)?;
        log::info!("Saved image to {}", path.display());

        match self.db.insert(title, explanation, &path, &fp) {
            Ok(id) => Ok(Cached {
                id,
                fingerprint: fp,
                file_path: path,
                inserted: true,
            }),
            Err(e) => {
                if existed {
                    log::warn!(
                        "{} was overwritten but no entry records the new content",
                        path.display()
                    );
                } else if self.cleanup_orphans {
                    remove_partial(&path);
                } else {
                    log::warn!("Leaving untracked image file at {}", path.display());
                }
                Err(e)
            }
        }
    }

    /// Whether `path` names the metadata store or one of its SQLite
    /// side files.
    fn is_store_file(&self, path: &Path) -> bool {
        let Some(db_path) = self.db.path() else {
            return false;
        };
        let (Some(name), Some(db_name)) = (path.file_name(), db_path.file_name()) else {
            return false;
        };
        let name = name.to_string_lossy();
        let db_name = db_name.to_string_lossy();

        // Compared without case so case-insensitive filesystems are covered.
        let reserved = STORE_SIDE_FILE_SUFFIXES
            .iter()
            .any(|suffix| name.eq_ignore_ascii_case(&format!("{db_name}{suffix}")));
        reserved && same_directory(path.parent(), db_path.parent())
    }

    /// Look up an entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the store cannot be queried.
    pub fn get_entry(&self, id: i64) -> CacheResult<Option<CacheEntry>> {
        self.db.get_by_id(id)
    }

    /// Titles of all cached images, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the store cannot be queried.
    pub fn list_titles(&self) -> CacheResult<Vec<String>> {
        self.db.list_all_titles()
    }

    /// Re-hash every cached file and report entries whose file is missing or
    /// whose content changed.
    ///
    /// Unreadable files are reported as issues, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Storage`] if the entries cannot be read.
    pub fn verify(&self) -> CacheResult<Vec<VerifyIssue>> {
        let mut issues = Vec::new();
        for entry in self.db.entries()? {
            match fingerprint_file(&entry.file_path) {
                Ok(actual) if actual == entry.fingerprint => {
                    log::trace!("Verified entry {}", entry.id);
                }
                Ok(actual) => issues.push(VerifyIssue::Mismatch {
                    id: entry.id,
                    path: entry.file_path,
                    expected: entry.fingerprint,
                    actual,
                }),
                Err(e) => {
                    log::debug!("Cannot read {}: {}", entry.file_path.display(), e);
                    issues.push(VerifyIssue::Missing {
                        id: entry.id,
                        path: entry.file_path,
                    });
                }
            }
        }
        Ok(issues)
    }
}

fn write_image(path: &Path, bytes: &[u8], existed: bool) -> CacheResult<()> {
    let result = File::create(path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    result.map_err(|source| {
        if existed {
            log::warn!("{} may have been left truncated", path.display());
        } else {
            remove_partial(path);
        }
        CacheError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn same_directory(a: Option<&Path>, b: Option<&Path>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if a == b => true,
        (Some(a), Some(b)) => match (a.canonicalize(), b.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
