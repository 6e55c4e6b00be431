//! Signal handling for graceful shutdown.
//!
//! This module provides centralized Ctrl+C handling. A shared `AtomicBool`
//! flag is set when shutdown is requested; long-running loops (the importer)
//! check it between files. Loops that block instead of polling (the review
//! and viewing sessions) register a notifier that is run on shutdown, which
//! typically posts a quit event into their channel.
//!
//! # Usage
//!
//! ```rust,no_run
//! use galman::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let shutdown_flag = handler.get_flag();
//! // Pass shutdown_flag to the Importer
//! # let _ = shutdown_flag;
//! ```
//!
//! # Exit Codes
//!
//! An interrupted run exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

type Notifier = Box<dyn Fn() + Send>;

/// Centralized shutdown handler for graceful application termination.
///
/// Cloning shares the flag and the notifier list.
#[derive(Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    notifiers: Arc<Mutex<Vec<Notifier>>>,
}

impl std::fmt::Debug for ShutdownHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandler")
            .field("flag", &self.flag)
            .finish_non_exhaustive()
    }
}

impl ShutdownHandler {
    /// Create a new shutdown handler with the flag initially set to `false`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notifiers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown: set the flag and run every registered notifier.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Ok(notifiers) = self.notifiers.lock() {
            for notify in notifiers.iter() {
                notify();
            }
        }
    }

    /// Get a clone of the shutdown flag for passing to worker loops.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Run `notify` whenever shutdown is requested.
    ///
    /// Notifiers stay registered until [`ShutdownHandler::clear_notifiers`].
    pub fn on_shutdown(&self, notify: impl Fn() + Send + 'static) {
        if let Ok(mut notifiers) = self.notifiers.lock() {
            notifiers.push(Box::new(notify));
        }
    }

    /// Drop all registered notifiers.
    pub fn clear_notifiers(&self) {
        if let Ok(mut notifiers) = self.notifiers.lock() {
            notifiers.clear();
        }
    }

    /// Reset the shutdown flag to `false` and drop notifiers.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
        self.clear_notifiers();
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that requests shutdown on interrupt.
///
/// Calling this again (e.g. from parallel tests that each run the app)
/// returns the existing handler, reset. If the process already has a Ctrl+C
/// hook from elsewhere, an unhooked handler is returned; it still works for
/// manual [`ShutdownHandler::request_shutdown`] calls.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let hooked = handler.clone();

    match ctrlc::set_handler(move || {
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
        hooked.request_shutdown();
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(_) => {
            if let Some(existing) = GLOBAL_HANDLER.get() {
                existing.reset();
                Ok(existing.clone())
            } else {
                log::debug!("Ctrl+C handler already registered, using unhooked handler");
                let fallback = ShutdownHandler::new();
                let _ = GLOBAL_HANDLER.set(fallback.clone());
                Ok(fallback)
            }
        }
    }
}
