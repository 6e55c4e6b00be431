//! Command-line interface definitions for galman.
//!
//! Global options (verbosity, color, config file) come before the
//! subcommand; each subcommand takes the collection root first.
//!
//! # Example
//!
//! ```bash
//! # Stage new files from a download folder
//! galman import ~/Pictures/collection ~/Downloads
//!
//! # Decide on everything staged so far
//! galman review ~/Pictures/collection
//!
//! # Slideshow of the gallery, 3 seconds per item
//! galman view ~/Pictures/collection --delay 3
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Content-addressed media triage.
///
/// galman stages files from arbitrary folders into a collection, skipping
/// anything it has seen before, and remembers every accept/reject decision
/// by content so nothing is ever reviewed twice.
#[derive(Debug, Parser)]
#[command(name = "galman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy new files from a source folder into the collection inbox
    Import(ImportArgs),
    /// Accept or reject each staged file
    Review(ReviewArgs),
    /// Show the gallery in random order, advancing on a timer
    View(ViewArgs),
    /// Show decision and file counts for a collection
    Status(StatusArgs),
}

/// Arguments for the import subcommand.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Collection root (created if missing)
    #[arg(value_name = "COLLECTION")]
    pub collection: PathBuf,

    /// Folder to import from (never modified)
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Abort on the first file that cannot be read or copied
    #[arg(long)]
    pub strict: bool,

    /// Follow symbolic links to directories
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Output format for the import report
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the review subcommand.
#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Collection root
    #[arg(value_name = "COLLECTION")]
    pub collection: PathBuf,

    /// Abort on the first file that cannot be moved or removed
    #[arg(long)]
    pub strict: bool,

    /// Send rejected files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// External viewer command; the file path is appended
    #[arg(long, value_name = "COMMAND")]
    pub viewer: Option<String>,
}

/// Arguments for the view subcommand.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Collection root
    #[arg(value_name = "COLLECTION")]
    pub collection: PathBuf,

    /// Seconds before advancing to the next item
    #[arg(short, long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub delay: Option<u64>,

    /// External viewer command; the file path is appended
    #[arg(long, value_name = "COMMAND")]
    pub viewer: Option<String>,
}

/// Arguments for the status subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Collection root
    #[arg(value_name = "COLLECTION")]
    pub collection: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
