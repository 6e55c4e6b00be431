//! The playback surface seam.
//!
//! Sessions never render anything themselves. They hand each item to a
//! [`PlaybackSurface`], which displays it however it likes (a terminal line,
//! an external player, a test recorder) and reports user input by sending
//! [`ReviewEvent`](super::ReviewEvent)s into the session's channel.

use std::io;
use std::path::Path;

/// Errors raised by a playback surface.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// Terminal I/O failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// The external viewer could not be started.
    #[error("cannot start viewer `{command}`: {source}")]
    Viewer {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Displays items and relays reviewer input.
pub trait PlaybackSurface {
    /// Load and display `path`, replacing whatever was shown before.
    ///
    /// `position` is 1-based; `total` is the queue length at session start.
    fn show(&mut self, path: &Path, position: usize, total: usize) -> Result<(), SurfaceError>;

    /// Print a status line (decisions, completion notices).
    fn notify(&mut self, _message: &str) {}

    /// Stop playback and release the current item.
    fn stop(&mut self);
}
