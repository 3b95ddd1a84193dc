use apod_cache::cache::{ImageCache, NamingPolicy};
use apod_cache::config::Config;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all APOD_CACHE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("APOD_CACHE_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
cache_dir = "/srv/apod"
naming = "fingerprint_suffix"
default_extension = "jpg"
fallback_title = "apod"
cleanup_orphans = false
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(&config_path);

    assert_eq!(config.cache_dir, Some(PathBuf::from("/srv/apod")));
    assert_eq!(config.naming, NamingPolicy::FingerprintSuffix);
    assert_eq!(config.default_extension, "jpg");
    assert_eq!(config.fallback_title, "apod");
    assert!(!config.cleanup_orphans);
    assert_eq!(config.database_name, "image_cache.db");
}

#[test]
fn test_config_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "default_extension = \"jpg\"\n").unwrap();

    std::env::set_var("APOD_CACHE_DEFAULT_EXTENSION", "png");
    std::env::set_var("APOD_CACHE_NAMING", "fingerprint_suffix");
    let config = Config::load_from_path(&config_path);
    clear_env();

    assert_eq!(config.default_extension, "png");
    assert_eq!(config.naming, NamingPolicy::FingerprintSuffix);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();

    let config = Config::load_from_path(&temp_dir.path().join("nope.toml"));
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_invalid_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "naming = \"sideways\"\n").unwrap();

    assert!(Config::try_load_from_path(&config_path).is_err());
    assert_eq!(Config::load_from_path(&config_path), Config::default());
}

#[test]
fn test_config_drives_cache_naming() {
    let temp_dir = tempdir().unwrap();
    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
        &format!(
            "cache_dir = {:?}\ndefault_extension = \"bin\"\nfallback_title = \"apod\"",
            temp_dir.path().join("images").to_string_lossy()
        ),
    ));
    let config: Config = figment.extract().unwrap();

    let cache = ImageCache::open(config.cache_config().unwrap()).unwrap();
    let cached = cache
        .ensure_cached("!!!", "", b"bytes", "https://x/no-extension")
        .unwrap();
    assert_eq!(
        cached.file_path,
        temp_dir.path().join("images").join("apod.bin")
    );
}

#[test]
fn test_env_provider_nesting_is_flat() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    std::env::set_var("APOD_CACHE_CLEANUP_ORPHANS", "false");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("APOD_CACHE_").split("__"))
        .extract()
        .unwrap();
    clear_env();

    assert!(!config.cleanup_orphans);
}

#[test]
fn test_cache_dir_from_environment() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let temp_dir = tempdir().unwrap();

    std::env::set_var("APOD_CACHE_CACHE_DIR", "/srv/apod-env");
    let config = Config::load_from_path(&temp_dir.path().join("nope.toml"));
    clear_env();

    assert_eq!(config.cache_dir, Some(PathBuf::from("/srv/apod-env")));
}
