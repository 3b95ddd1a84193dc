//! Command-line interface definitions for apod-cache.
//!
//! # Example
//!
//! ```bash
//! # Cache a downloaded picture
//! apod-cache add ~/Downloads/eclipse.jpg --title "Total Eclipse" \
//!     --source-url https://apod.nasa.gov/apod/image/2401/eclipse.jpg
//!
//! # Cache a saved API response together with its image
//! apod-cache import apod.json eclipse.jpg --date 2024-01-01
//!
//! # Browse the cache
//! apod-cache list
//! apod-cache show 1 --json
//!
//! # Hand a file to the wallpaper setter
//! apod-cache path 1
//!
//! # Inspect the merged configuration
//! apod-cache config
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Content-addressed cache for Astronomy Picture of the Day images.
#[derive(Debug, Parser)]
#[command(name = "apod-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Cache directory (overrides the config file and APOD_CACHE_CACHE_DIR)
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add an image file to the cache
    Add(AddArgs),
    /// Add a saved APOD API response and its image to the cache
    Import(ImportArgs),
    /// List cached titles in the order they were added
    List(ListArgs),
    /// Show one cached entry
    Show(ShowArgs),
    /// Print the file path of a cached entry
    Path(IdArgs),
    /// Re-hash cached files and report missing or modified ones
    Verify(ListArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for the add subcommand.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Image file holding the downloaded bytes
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Image title
    #[arg(short, long)]
    pub title: String,

    /// Image description
    #[arg(short, long, default_value = "")]
    pub explanation: String,

    /// URL the image was downloaded from (used for the file extension);
    /// defaults to the image path
    #[arg(short, long, value_name = "URL")]
    pub source_url: Option<String>,
}

/// Arguments for the import subcommand.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON record as returned by the APOD API
    #[arg(value_name = "INFO_JSON")]
    pub info: PathBuf,

    /// Image file downloaded from the record's image URL
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// APOD date (YYYY-MM-DD); defaults to the record's date, then today
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<String>,
}

/// Arguments for commands that only choose an output format.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print JSON instead of plain text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Entry id
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Print JSON instead of plain text
    #[arg(long)]
    pub json: bool,
}

/// Arguments naming a single entry.
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Entry id
    #[arg(value_name = "ID")]
    pub id: i64,
}
