//! Derivation of cache file paths from image titles and source URLs.
//!
//! The file name is built from the title so that the cache directory stays
//! browsable by hand: whitespace runs become a single underscore and anything
//! that is not alphanumeric or an underscore is dropped. The extension comes
//! from the last path segment of the source URL.
//!
//! No collision detection happens here. Two different titles that sanitize to
//! the same base name map to the same path unless
//! [`NamingPolicy::FingerprintSuffix`] is selected.
//!
//! # Example
//!
//! ```
//! use apod_cache::cache::naming::PathNamer;
//! use std::path::Path;
//!
//! let namer = PathNamer::default();
//! let path = namer.derive_path(
//!     Path::new("/cache"),
//!     "The Horsehead Nebula",
//!     "https://apod.nasa.gov/apod/image/2401/horsehead.jpg",
//!     "ABCDEF",
//! );
//! assert_eq!(path, Path::new("/cache/The_Horsehead_Nebula.jpg"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extension used when the source URL does not carry one.
pub const DEFAULT_EXTENSION: &str = "img";

/// Base name used when the title sanitizes to nothing.
pub const DEFAULT_BASE_NAME: &str = "untitled";

/// Number of fingerprint characters appended under [`NamingPolicy::FingerprintSuffix`].
pub const FINGERPRINT_SUFFIX_LEN: usize = 8;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// How the base name of a cached file is formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// `<sanitized title>.<ext>`, compatible with existing caches.
    #[default]
    TitleOnly,
    /// `<sanitized title>_<fingerprint prefix>.<ext>`.
    FingerprintSuffix,
}

/// Turns titles and URLs into file paths under a cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNamer {
    policy: NamingPolicy,
    default_extension: String,
    fallback_base_name: String,
}

impl Default for PathNamer {
    fn default() -> Self {
        Self {
            policy: NamingPolicy::TitleOnly,
            default_extension: DEFAULT_EXTENSION.to_string(),
            fallback_base_name: DEFAULT_BASE_NAME.to_string(),
        }
    }
}

impl PathNamer {
    /// Create a namer with explicit fallbacks.
    ///
    /// Empty fallbacks are replaced by the built-in defaults so that a derived
    /// path can never end up as a bare `.ext` or a trailing dot.
    #[must_use]
    pub fn new(policy: NamingPolicy, default_extension: &str, fallback_base_name: &str) -> Self {
        let default_extension = sanitize_extension(default_extension)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let fallback_base_name = Some(sanitize_title(fallback_base_name))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string());

        Self {
            policy,
            default_extension,
            fallback_base_name,
        }
    }

    /// The active naming policy.
    #[must_use]
    pub fn policy(&self) -> NamingPolicy {
        self.policy
    }

    /// Derive `cache_root/<base>.<ext>` for an image.
    ///
    /// `fingerprint` is only consulted under [`NamingPolicy::FingerprintSuffix`].
    #[must_use]
    pub fn derive_path(
        &self,
        cache_root: &Path,
        title: &str,
        source_url: &str,
        fingerprint: &str,
    ) -> PathBuf {
        let suffixed = self.policy == NamingPolicy::FingerprintSuffix;
        self.build_path(cache_root, title, source_url, fingerprint, suffixed)
    }

    /// Like [`derive_path`](Self::derive_path), but always appends the
    /// fingerprint prefix whatever the policy.
    #[must_use]
    pub fn derive_suffixed_path(
        &self,
        cache_root: &Path,
        title: &str,
        source_url: &str,
        fingerprint: &str,
    ) -> PathBuf {
        self.build_path(cache_root, title, source_url, fingerprint, true)
    }

    fn build_path(
        &self,
        cache_root: &Path,
        title: &str,
        source_url: &str,
        fingerprint: &str,
        suffixed: bool,
    ) -> PathBuf {
        let extension = url_extension(source_url).unwrap_or_else(|| {
            log::warn!(
                "No file extension in source URL '{}', using '.{}'",
                source_url,
                self.default_extension
            );
            self.default_extension.clone()
        });

        let mut base = sanitize_title(title);
        if base.is_empty() {
            log::warn!(
                "Title '{}' has no usable characters, using '{}'",
                title,
                self.fallback_base_name
            );
            base = self.fallback_base_name.clone();
        }

        if suffixed {
            let prefix: String = fingerprint
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .take(FINGERPRINT_SUFFIX_LEN)
                .collect();
            if !prefix.is_empty() {
                base.push('_');
                base.push_str(&prefix);
            }
        }

        cache_root.join(format!("{base}.{extension}"))
    }
}

/// Sanitize a title into a file base name.
///
/// Whitespace runs collapse to `_`, then every character that is neither
/// alphanumeric nor `_` is removed. May return an empty string.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    WHITESPACE_RUN
        .replace_all(title, "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Extract the file extension from the last path segment of a URL.
///
/// Query strings and fragments are ignored, as are the scheme and host of
/// absolute URLs. Plain file paths are accepted too. Returns `None` when the
/// segment has no dot or nothing alphanumeric follows the last one.
#[must_use]
pub fn url_extension(source_url: &str) -> Option<String> {
    let without_fragment = source_url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        // Host only: there is no path segment to take an extension from.
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
        None => without_query,
    };
    let segment = path
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let (_, ext) = segment.rsplit_once('.')?;
    sanitize_extension(ext)
}

fn sanitize_extension(ext: &str) -> Option<String> {
    let ext: String = ext.chars().filter(char::is_ascii_alphanumeric).collect();
    (!ext.is_empty()).then_some(ext)
}
