use apod_cache::cache::{CacheConfig, CacheError, ImageCache, ImageDatabase};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_open_corrupted_database() {
    let temp_file = NamedTempFile::new().unwrap();
    fs::write(temp_file.path(), b"not a sqlite database, just some bytes").unwrap();

    let res = ImageDatabase::open(temp_file.path());
    assert!(matches!(res, Err(CacheError::Storage(_))));
}

#[test]
fn test_recovery_after_removing_corrupted_database() {
    let dir = tempdir().unwrap();
    let config = CacheConfig::new(dir.path());
    fs::write(config.database_path(), b"corrupted garbage").unwrap();

    assert!(ImageCache::open(config.clone()).is_err());

    fs::remove_file(config.database_path()).unwrap();
    let cache = ImageCache::open(config).expect("Should succeed after deleting corrupted file");
    assert!(cache.list_titles().unwrap().is_empty());
}

#[test]
fn test_cache_dir_is_a_file() {
    let dir = tempdir().unwrap();
    let not_a_dir = dir.path().join("images");
    fs::write(&not_a_dir, b"file in the way").unwrap();

    let res = ImageCache::open(CacheConfig::new(&not_a_dir));
    assert!(matches!(res, Err(CacheError::CreateDir { .. })));
}

/// Make every further insert into the store fail, as a full disk would.
fn reject_inserts(db_path: &Path) {
    rusqlite::Connection::open(db_path)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_insert BEFORE INSERT ON image_data
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();
}

#[test]
fn test_unwritable_target_reports_write_failure() {
    let dir = tempdir().unwrap();
    let cache = ImageCache::open(CacheConfig::new(dir.path())).unwrap();
    // A directory at the target path fails File::create for any user.
    fs::create_dir(dir.path().join("Nebula.jpg")).unwrap();

    let res = cache.ensure_cached("Nebula", "desc", b"bytes", "http://x/img.jpg");
    assert!(matches!(res, Err(CacheError::Write { .. })));
    assert!(cache.list_titles().unwrap().is_empty());
    assert!(dir.path().join("Nebula.jpg").is_dir());
}

#[test]
fn test_failed_insert_removes_new_file() {
    let dir = tempdir().unwrap();
    let config = CacheConfig::new(dir.path());
    let cache = ImageCache::open(config.clone()).unwrap();
    cache
        .ensure_cached("Existing", "", b"existing", "http://x/e.jpg")
        .unwrap();
    reject_inserts(&config.database_path());

    let res = cache.ensure_cached("New", "", b"new bytes", "http://x/n.jpg");
    assert!(matches!(res, Err(CacheError::Storage(_))));
    assert!(!dir.path().join("New.jpg").exists());
    assert_eq!(cache.list_titles().unwrap(), vec!["Existing"]);
}

#[test]
fn test_failed_insert_keeps_file_of_earlier_entry() {
    let dir = tempdir().unwrap();
    let config = CacheConfig::new(dir.path());
    let cache = ImageCache::open(config.clone()).unwrap();
    let first = cache
        .ensure_cached("Moon", "", b"first", "http://x/a.jpg")
        .unwrap();
    reject_inserts(&config.database_path());

    // "Moon!" sanitizes to the same file name as "Moon".
    let res = cache.ensure_cached("Moon!", "", b"second", "http://x/b.jpg");
    assert!(matches!(res, Err(CacheError::Storage(_))));

    let entry = cache.get_entry(first.id).unwrap().unwrap();
    assert!(entry.file_path.is_file());
    assert_eq!(cache.list_titles().unwrap(), vec!["Moon"]);
}
