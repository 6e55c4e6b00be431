//! galman - content-addressed media triage
//!
//! Files are imported from arbitrary folders into a collection's inbox under
//! a key derived from their bytes. A reviewer accepts or rejects each staged
//! file once; the decision is remembered by key, so the same content is never
//! staged or reviewed again, whatever it is called next time.

pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod progress;
pub mod review;
pub mod scanner;
pub mod signal;
pub mod store;
pub mod view;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, ImportArgs, OutputFormat, ReviewArgs, StatusArgs, ViewArgs};
use crate::collection::Collection;
use crate::config::Config;
use crate::error::ExitCode;
use crate::import::{IgnoredExtensions, ImportConfig, ImportError, Importer};
use crate::progress::Progress;
use crate::review::{
    events, KeyMap, KeyReader, ReviewConfig, ReviewEvent, ReviewSession, TerminalSurface,
};
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;
use crate::view::ViewSession;

/// Run the application with parsed command-line arguments.
///
/// # Errors
///
/// Returns fatal errors (bad configuration, unusable collection, unreadable
/// decision files, strict-mode file errors). Per-file problems in lenient
/// mode are reported through the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color {
        yansi::disable();
    } else {
        yansi::whenever(yansi::Condition::TTY_AND_COLOR);
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {config:?}");

    let shutdown = signal::install_handler().context("Failed to install signal handler")?;

    match cli.command {
        Commands::Import(args) => run_import(args, &config, &shutdown, cli.quiet),
        Commands::Review(args) => run_review(args, &config, &shutdown, cli.quiet),
        Commands::View(args) => run_view(args, &config, &shutdown, cli.quiet),
        Commands::Status(args) => run_status(&args),
    }
}

fn open_collection(root: &Path) -> Result<Collection> {
    Collection::open(root).with_context(|| format!("Failed to open collection {}", root.display()))
}

fn close_collection(collection: Collection) -> Result<()> {
    let root = collection.root().to_path_buf();
    collection
        .close()
        .with_context(|| format!("Failed to save decisions for {}", root.display()))
}

fn run_import(
    args: ImportArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    import::check_source(&args.source)?;

    let format = config.key_format()?;
    let import_config = ImportConfig {
        ignored_extensions: IgnoredExtensions::new(&config.ignored_extensions),
        strict: args.strict || config.strict,
        walker: WalkerConfig {
            follow_dir_links: args.follow_symlinks,
        },
    };

    let text = args.output == OutputFormat::Text;
    let progress = Arc::new(Progress::new(quiet || !text));
    let importer = Importer::new(format, import_config)
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress(progress);

    let collection = open_collection(&args.collection)?;
    let result = importer.import_from(&collection, &args.source);
    let root = collection.root().to_path_buf();
    close_collection(collection)?;

    let report = match result {
        Ok(report) => report,
        Err(ImportError::Interrupted) => {
            log::warn!("Import interrupted; staged files so far are kept");
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Import from {} aborted", args.source.display()))
        }
    };

    if text {
        if !quiet {
            println!("{}: {}", root.display(), report.summary());
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(if report.has_failures() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn run_review(
    args: ReviewArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let format = config.key_format()?;
    let keymap = KeyMap::from_bindings(&config.bindings).context("Invalid key bindings")?;
    let review_config = ReviewConfig {
        strict: args.strict || config.strict,
        use_trash: args.trash || config.use_trash,
    };
    let viewer = args.viewer.as_deref().or(config.viewer.as_deref());

    let mut collection = open_collection(&args.collection)?;
    if collection.staged_files()?.is_empty() {
        if !quiet {
            println!("{}: Airlock empty. Nothing to do.", collection.root().display());
        }
        close_collection(collection)?;
        return Ok(ExitCode::Success);
    }

    let (tx, rx) = events::channel();
    let quit = tx.clone();
    shutdown.on_shutdown(move || {
        let _ = quit.send(ReviewEvent::Quit);
    });

    let result = match KeyReader::spawn(keymap, tx.clone()) {
        Ok(keys) => {
            let mut surface = TerminalSurface::new(viewer).with_events(tx);
            let outcome = ReviewSession::new(&mut collection, format, review_config)
                .and_then(|session| session.run(&mut surface, &rx));
            drop(keys);
            outcome.map_err(anyhow::Error::from)
        }
        Err(e) => Err(anyhow::Error::from(e).context("Review needs an interactive terminal")),
    };
    shutdown.clear_notifiers();

    let root = collection.root().to_path_buf();
    close_collection(collection)?;
    let summary = result?;

    if !quiet {
        println!(
            "{}: Done sorting airlock. {} whitelisted, {} blacklisted, {} failed, {} remaining.",
            root.display(),
            summary.whitelisted,
            summary.blacklisted,
            summary.failed,
            summary.remaining
        );
    }

    Ok(if shutdown.is_shutdown_requested() {
        ExitCode::Interrupted
    } else if summary.has_failures() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn run_view(
    args: ViewArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let keymap = KeyMap::from_bindings(&config.bindings).context("Invalid key bindings")?;
    let delay = Duration::from_secs(args.delay.unwrap_or(config.view_delay));
    let viewer = args.viewer.as_deref().or(config.viewer.as_deref());

    let collection = open_collection(&args.collection)?;
    let files = collection.gallery_files()?;
    let root = collection.root().to_path_buf();
    close_collection(collection)?;

    if files.is_empty() {
        if !quiet {
            println!("{}: Gallery empty. Nothing to do.", root.display());
        }
        return Ok(ExitCode::Success);
    }

    let session = ViewSession::new(files, delay);
    let (tx, rx) = events::channel();
    let quit = tx.clone();
    shutdown.on_shutdown(move || {
        let _ = quit.send(ReviewEvent::Quit);
    });

    let result = match KeyReader::spawn(keymap, tx.clone()) {
        Ok(keys) => {
            let mut surface = TerminalSurface::new(viewer).with_events(tx.clone());
            let outcome = session.run(&mut surface, &tx, &rx);
            drop(keys);
            outcome.map_err(anyhow::Error::from)
        }
        Err(e) => Err(anyhow::Error::from(e).context("Viewing needs an interactive terminal")),
    };
    shutdown.clear_notifiers();
    let summary = result?;

    if !quiet {
        println!("{}: Viewed {}/{}.", root.display(), summary.shown, summary.total);
    }

    Ok(if shutdown.is_shutdown_requested() {
        ExitCode::Interrupted
    } else {
        ExitCode::Success
    })
}

fn run_status(args: &StatusArgs) -> Result<ExitCode> {
    if !args.collection.is_dir() {
        anyhow::bail!("Collection {} does not exist", args.collection.display());
    }

    let status = Collection::inspect(&args.collection)
        .with_context(|| format!("Failed to read collection {}", args.collection.display()))?;

    match args.output {
        OutputFormat::Text => {
            println!("Collection: {}", status.root.display());
            println!("  Accepted: {}", status.accepted);
            println!("  Rejected: {}", status.rejected);
            println!("  Staged:   {}", status.staged);
            println!("  Gallery:  {}", status.gallery);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(ExitCode::Success)
}
