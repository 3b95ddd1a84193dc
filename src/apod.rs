//! Astronomy Picture of the Day records and the path from a date to a
//! cached image.
//!
//! The HTTP client for the APOD API lives outside this crate. It plugs in
//! through [`ApodSource`], which hands back the API's JSON record for a date
//! and the raw bytes behind an image URL. [`add_apod_to_cache`] strings the
//! steps together:
//!
//! 1. validate the date against the APOD archive range,
//! 2. fetch the record,
//! 3. pick the image URL (HD image, or the thumbnail for videos),
//! 4. download the bytes,
//! 5. hand them to [`ImageCache::ensure_cached`].

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cache::{CacheError, Cached, ImageCache};

/// Date of the first Astronomy Picture of the Day.
pub const FIRST_APOD_DATE: &str = "1995-06-16";

/// [`FIRST_APOD_DATE`] as a calendar date.
#[must_use]
pub fn first_apod_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or(NaiveDate::MIN)
}

/// Kind of media an APOD record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    #[serde(other)]
    Other,
}

/// One day's record as returned by the APOD API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApodInfo {
    /// `YYYY-MM-DD`, when the API includes it.
    #[serde(default)]
    pub date: Option<String>,
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    pub media_type: MediaType,
    /// Full resolution image.
    #[serde(default)]
    pub hdurl: Option<String>,
    /// Standard resolution image, or the video's page.
    #[serde(default)]
    pub url: Option<String>,
    /// Still frame for video entries (requested with `thumbs=true`).
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl ApodInfo {
    /// URL of the picture to cache for this record.
    ///
    /// Images use `hdurl`, falling back to `url`; videos use their thumbnail.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        match self.media_type {
            MediaType::Image => self.hdurl.as_deref().or(self.url.as_deref()),
            MediaType::Video => self.thumbnail_url.as_deref(),
            MediaType::Other => None,
        }
    }
}

/// Errors that can occur while adding a day's picture to the cache.
#[derive(thiserror::Error, Debug)]
pub enum ApodError {
    /// The date string is not `YYYY-MM-DD`.
    #[error("Invalid date format '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The date precedes the first APOD.
    #[error("Date too far in the past; first APOD was on {}", FIRST_APOD_DATE)]
    BeforeFirstApod(NaiveDate),

    /// The date lies in the future.
    #[error("APOD date cannot be in the future: {0}")]
    InFuture(NaiveDate),

    /// The source has no record for the date, or the request failed.
    #[error("No APOD available for {0}")]
    NotAvailable(NaiveDate),

    /// The record carries no usable image URL.
    #[error("APOD for {0} has no image to download")]
    NoImageUrl(NaiveDate),

    /// The image bytes could not be fetched.
    #[error("Failed to download image from {0}")]
    DownloadFailed(String),

    /// Storing the image failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Check that `date` lies within the APOD archive as of `today`.
pub fn validate_apod_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ApodError> {
    if date < first_apod_date() {
        Err(ApodError::BeforeFirstApod(date))
    } else if date > today {
        Err(ApodError::InFuture(date))
    } else {
        Ok(date)
    }
}

/// Parse a `YYYY-MM-DD` string and validate it with [`validate_apod_date`].
pub fn parse_apod_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ApodError> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|source| {
        ApodError::InvalidDate {
            input: input.to_string(),
            source,
        }
    })?;
    validate_apod_date(date, today)
}

/// Today's date in local time.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Supplier of APOD records and image bytes.
pub trait ApodSource {
    /// The record for `date`, or `None` if there is none or the lookup failed.
    fn apod_info(&self, date: NaiveDate) -> Option<ApodInfo>;

    /// The bytes behind `url`, or `None` if the download failed.
    fn download_image(&self, url: &str) -> Option<Vec<u8>>;
}

/// Fetch the APOD for `date` from `source` and make sure it is cached.
pub fn add_apod_to_cache(
    cache: &ImageCache,
    source: &dyn ApodSource,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Cached, ApodError> {
    let date = validate_apod_date(date, today)?;
    log::info!("APOD date: {}", date);

    let info = source
        .apod_info(date)
        .ok_or(ApodError::NotAvailable(date))?;
    log::info!("APOD title: {}", info.title);

    let url = info.image_url().ok_or(ApodError::NoImageUrl(date))?;
    log::debug!("Downloading image from {}", url);
    let bytes = source
        .download_image(url)
        .ok_or_else(|| ApodError::DownloadFailed(url.to_string()))?;

    Ok(cache.ensure_cached(&info.title, &info.explanation, &bytes, url)?)
}

/// [`ApodSource`] backed by files on disk: a saved API response and the
/// image it describes.
///
/// Every date maps to the same record; the image URL in the record is only
/// used for naming, the bytes always come from `image_path`.
#[derive(Debug, Clone)]
pub struct FileApodSource {
    info_path: PathBuf,
    image_path: PathBuf,
}

impl FileApodSource {
    #[must_use]
    pub fn new(info_path: impl Into<PathBuf>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            info_path: info_path.into(),
            image_path: image_path.into(),
        }
    }

    /// Read and parse the saved record.
    pub fn load_info(&self) -> anyhow::Result<ApodInfo> {
        use anyhow::Context;

        let content = fs::read_to_string(&self.info_path)
            .with_context(|| format!("Failed to read APOD record: {}", self.info_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse APOD record: {}", self.info_path.display()))
    }
}

impl ApodSource for FileApodSource {
    fn apod_info(&self, _date: NaiveDate) -> Option<ApodInfo> {
        match self.load_info() {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("{:#}", e);
                None
            }
        }
    }

    fn download_image(&self, _url: &str) -> Option<Vec<u8>> {
        match fs::read(&self.image_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.image_path.display(), e);
                None
            }
        }
    }
}
