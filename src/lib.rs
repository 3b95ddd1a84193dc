//! apod-cache - Content-addressed cache for Astronomy Picture of the Day images
//!
//! Downloaded pictures are identified by the SHA-256 of their bytes, written
//! once to a cache directory under a name derived from their title, and
//! recorded in a SQLite database next to them. Offering the same picture
//! again returns the existing entry.
//!
//! # Example
//!
//! ```no_run
//! use apod_cache::cache::{CacheConfig, ImageCache};
//!
//! let cache = ImageCache::open(CacheConfig::new("/tmp/apod-images"))?;
//! let cached = cache.ensure_cached(
//!     "Total Eclipse",
//!     "The Moon covers the Sun.",
//!     b"...jpeg bytes...",
//!     "https://apod.nasa.gov/apod/image/2401/eclipse.jpg",
//! )?;
//! let entry = cache.get_entry(cached.id)?.expect("just inserted");
//! println!("{}", entry.file_path.display());
//! # Ok::<(), apod_cache::cache::CacheError>(())
//! ```

pub mod apod;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod hasher;
pub mod logging;

use anyhow::{Context, Result};
use std::fs;

use crate::apod::{add_apod_to_cache, parse_apod_date, today, FileApodSource};
use crate::cache::{Cached, ImageCache, VerifyIssue};
use crate::cli::{AddArgs, Cli, Commands, ImportArgs};
use crate::config::Config;
use crate::error::ExitCode;

/// Run the command selected on the command line.
///
/// Logging must already be initialized.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::try_load_from_path(path)?,
        None => Config::load(),
    };
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = Some(dir);
    }

    let open_cache = || -> Result<ImageCache> {
        ImageCache::open(config.cache_config()?).context("Failed to open image cache")
    };

    match cli.command {
        Commands::Add(args) => run_add(&open_cache()?, args),
        Commands::Import(args) => run_import(&open_cache()?, args),
        Commands::List(args) => {
            let cache = open_cache()?;
            if args.json {
                let entries = cache.database().entries()?;
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for (index, title) in cache.list_titles()?.iter().enumerate() {
                    println!("{:>4}  {}", index + 1, title);
                }
            }
            Ok(ExitCode::Success)
        }
        Commands::Show(args) => {
            let cache = open_cache()?;
            let Some(entry) = cache.get_entry(args.id)? else {
                eprintln!("No cached image with id {}", args.id);
                return Ok(ExitCode::NotFound);
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("Id:          {}", entry.id);
                println!("Title:       {}", entry.title);
                println!("File:        {}", entry.file_path.display());
                println!("SHA-256:     {}", entry.fingerprint);
                println!();
                println!("{}", entry.explanation);
            }
            Ok(ExitCode::Success)
        }
        Commands::Path(args) => match open_cache()?.get_entry(args.id)? {
            Some(entry) => {
                println!("{}", entry.file_path.display());
                Ok(ExitCode::Success)
            }
            None => {
                eprintln!("No cached image with id {}", args.id);
                Ok(ExitCode::NotFound)
            }
        },
        Commands::Verify(args) => {
            let issues = open_cache()?.verify()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else if issues.is_empty() {
                println!("All cached images verified");
            } else {
                for issue in &issues {
                    match issue {
                        VerifyIssue::Missing { id, path } => {
                            println!("missing   {:>4}  {}", id, path.display());
                        }
                        VerifyIssue::Mismatch { id, path, .. } => {
                            println!("modified  {:>4}  {}", id, path.display());
                        }
                    }
                }
            }
            Ok(if issues.is_empty() {
                ExitCode::Success
            } else {
                ExitCode::VerifyFailed
            })
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::Success)
        }
    }
}

fn run_add(cache: &ImageCache, args: AddArgs) -> Result<ExitCode> {
    let bytes = fs::read(&args.image)
        .with_context(|| format!("Failed to read image: {}", args.image.display()))?;
    let source_url = args
        .source_url
        .unwrap_or_else(|| args.image.to_string_lossy().into_owned());

    let cached = cache
        .ensure_cached(&args.title, &args.explanation, &bytes, &source_url)
        .context("Failed to cache image")?;
    report_cached(&cached);
    Ok(ExitCode::Success)
}

fn run_import(cache: &ImageCache, args: ImportArgs) -> Result<ExitCode> {
    let source = FileApodSource::new(&args.info, &args.image);
    let current = today();
    let date_arg = match args.date {
        Some(date) => Some(date),
        None => source.load_info()?.date,
    };
    let date = match date_arg {
        Some(date) => parse_apod_date(&date, current)?,
        None => current,
    };

    let cached = add_apod_to_cache(cache, &source, date, current)
        .with_context(|| format!("Failed to cache APOD for {date}"))?;
    report_cached(&cached);
    Ok(ExitCode::Success)
}

fn report_cached(cached: &Cached) {
    if cached.inserted {
        log::info!("Added image {} as id {}", cached.fingerprint, cached.id);
    } else {
        log::info!("Image {} already cached as id {}", cached.fingerprint, cached.id);
    }
    println!("{}", cached.id);
}
