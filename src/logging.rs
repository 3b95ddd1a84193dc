//! Logging setup for the apod-cache binary.
//!
//! Uses the `log` facade with an `env_logger` backend. `RUST_LOG`, when set,
//! replaces the flag-derived filter entirely. Otherwise `-q` and `-v` pick
//! the level for this crate's own modules while dependencies stay at `warn`.
//!
//! Log lines go to stderr so that `list`, `show` and `path` output on stdout
//! stays pipeable.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Module path whose records follow the CLI verbosity flags.
const CRATE_TARGET: &str = "apod_cache";

/// Level applied to everything outside [`CRATE_TARGET`].
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

/// Initialize logging from the CLI verbosity flags.
///
/// # Panics
///
/// Panics if called more than once, as `env_logger` can only be
/// initialized once per process.
pub fn init_logging(verbose: u8, quiet: bool) {
    let rust_log = env::var("RUST_LOG").ok();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    builder.target(Target::Stderr);
    match &rust_log {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder
                .filter_level(DEPENDENCY_LEVEL.min(level))
                .filter_module(CRATE_TARGET, level);
        }
    }
    configure_format(&mut builder, verbose);
    builder.init();

    match rust_log {
        Some(filters) => log::debug!("Log filter from RUST_LOG: {}", filters),
        None => log::debug!("Log level: {}", level),
    }
}

/// Map CLI flags to a level filter. `quiet` beats `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    // Module paths only help once someone asks for debug output.
    let show_module = verbose >= 1;

    #[cfg(debug_assertions)]
    builder.format(move |buf, record| {
        let level_style = buf.default_level_style(record.level());
        write!(
            buf,
            "{} {level_style}{:<5}{level_style:#} ",
            buf.timestamp_seconds(),
            record.level()
        )?;
        if show_module {
            write!(buf, "[{}] ", record.module_path().unwrap_or("unknown"))?;
        }
        writeln!(buf, "{}", record.args())
    });

    #[cfg(not(debug_assertions))]
    builder.format(move |buf, record| {
        let level_style = buf.default_level_style(record.level());
        write!(buf, "{level_style}{:<5}{level_style:#} ", record.level())?;
        if show_module {
            write!(buf, "[{}] ", record.module_path().unwrap_or("unknown"))?;
        }
        writeln!(buf, "{}", record.args())
    });
}
