use apod_cache::cache::{CacheConfig, ImageCache};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

#[test]
fn test_concurrent_offers_of_same_content_insert_once() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(ImageCache::open(CacheConfig::new(dir.path())).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache
                    .ensure_cached(
                        &format!("Title {i}"),
                        "",
                        b"shared content",
                        "http://x/shared.jpg",
                    )
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.iter().all(|r| r.id == results[0].id));
    assert_eq!(results.iter().filter(|r| r.inserted).count(), 1);
    assert_eq!(cache.list_titles().unwrap().len(), 1);
}

#[test]
fn test_concurrent_distinct_content_gets_distinct_ids() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(ImageCache::open(CacheConfig::new(dir.path())).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache
                    .ensure_cached(
                        &format!("Image {i}"),
                        "",
                        format!("content {i}").as_bytes(),
                        "http://x/a.jpg",
                    )
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}
