//! Logging infrastructure for galman.
//!
//! Diagnostics go through the `log` facade with an `env_logger` backend on
//! stderr. Per-file outcome lines (`+ Copied`, `Blacklisted: ...`) are not
//! log records; they are printed to stdout by the importer and the review
//! surface.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! # Build-specific Formatting
//!
//! - **Debug builds**: timestamp and level, plus the module path with `-v`
//! - **Release builds**: level and message only
//!
//! While the terminal is in raw mode (see [`set_raw_terminal`]) records end
//! in `\r\n`, since raw mode does not return the cursor on a bare newline.
//!
//! # Example
//!
//! ```rust,no_run
//! use galman::logging::init_logging;
//!
//! // Debug level (-v)
//! init_logging(1, false);
//! log::debug!("Collection opened");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static RAW_TERMINAL: AtomicBool = AtomicBool::new(false);

/// Mark the terminal as being in (or out of) raw mode.
pub fn set_raw_terminal(raw: bool) {
    RAW_TERMINAL.store(raw, Ordering::SeqCst);
}

fn line_ending() -> &'static str {
    if RAW_TERMINAL.load(Ordering::SeqCst) {
        "\r\n"
    } else {
        "\n"
    }
}

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Only the first call in a process installs a logger; later calls (for
/// example from tests that run the app repeatedly) are no-ops.
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level);
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!("Logging initialized at level: {:?}", level);
    }
}

/// Determine the log level from CLI flags.
///
/// `quiet` wins over any verbosity count.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                write!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}{}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args(),
                    line_ending()
                )
            } else {
                write!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}{}",
                    timestamp,
                    level,
                    record.args(),
                    line_ending()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            write!(
                buf,
                "{level_style}{:<5}{level_style:#} {}{}",
                level,
                record.args(),
                line_ending()
            )
        });
    }
}
