//! Interactive review of staged files.
//!
//! # Overview
//!
//! - [`ReviewSession`]: walks the inbox and applies each decision
//! - [`PlaybackSurface`]: where items are shown ([`TerminalSurface`] in the CLI)
//! - [`ReviewEvent`]: the single event type every trigger is turned into
//! - [`KeyReader`] / [`KeyMap`]: raw-mode key input mapped to events
//!
//! # Example
//!
//! ```no_run
//! use galman::collection::Collection;
//! use galman::review::{events, ReviewConfig, ReviewSession, TerminalSurface};
//! use galman::scanner::KeyFormat;
//! use std::path::Path;
//!
//! let mut collection = Collection::open(Path::new("/media/pics")).unwrap();
//! let (tx, rx) = events::channel();
//! let mut surface = TerminalSurface::new(None).with_events(tx.clone());
//!
//! let session =
//!     ReviewSession::new(&mut collection, KeyFormat::default(), ReviewConfig::default()).unwrap();
//! let summary = session.run(&mut surface, &rx).unwrap();
//! println!("{} blacklisted", summary.blacklisted);
//! ```

pub mod disposal;
pub mod events;
pub mod keymap;
pub mod session;
pub mod surface;
pub mod terminal;

pub use disposal::DisposeError;
pub use events::ReviewEvent;
pub use keymap::{KeyMap, KeyMapError};
pub use session::{ItemState, ReviewConfig, ReviewSession, ReviewSummary, SessionOutcome, Step};
pub use surface::{PlaybackSurface, SurfaceError};
pub use terminal::{KeyReader, TerminalSurface};

use crate::collection::CollectionError;
use crate::scanner::HashError;

/// Error type for review sessions.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The playback surface failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// The inbox could not be listed or the decisions could not be saved.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// A staged file with a non-key name could not be hashed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A staged file could not be moved or removed.
    #[error(transparent)]
    File(#[from] DisposeError),
}

impl ReviewError {
    /// Whether the error concerns a single staged file (and the session may
    /// continue with the next one).
    #[must_use]
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Hash(_) | Self::File(_))
    }
}
