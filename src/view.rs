//! Slideshow over the gallery.
//!
//! Viewing never touches the decision sets. Gallery files are shuffled and
//! shown one at a time; an [`AdvanceTimer`] posts [`ReviewEvent::Advance`]
//! into the same channel the key reader uses, so the timer, key presses and
//! Ctrl+C are all handled by one loop.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::review::{PlaybackSurface, ReviewEvent, SessionOutcome, SurfaceError};

/// Background thread sending [`ReviewEvent::Advance`] every `delay`.
///
/// Dropping the timer cancels it and waits for the thread to exit, so no
/// tick arrives after the drop returns.
pub struct AdvanceTimer {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AdvanceTimer {
    #[must_use]
    pub fn start(delay: Duration, events: Sender<ReviewEvent>) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match cancelled.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => {
                    if events.send(ReviewEvent::Advance).is_err() {
                        return;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            }
        });
        Self {
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// Stop the timer.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for AdvanceTimer {
    fn drop(&mut self) {
        // Closing the channel wakes the thread immediately.
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Counts for a finished slideshow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub total: usize,
    pub shown: usize,
    pub outcome: SessionOutcome,
}

/// One pass over a playlist of gallery files.
#[derive(Debug)]
pub struct ViewSession {
    playlist: Vec<PathBuf>,
    delay: Duration,
}

impl ViewSession {
    /// Shuffle `files` into a new playlist.
    #[must_use]
    pub fn new(mut files: Vec<PathBuf>, delay: Duration) -> Self {
        files.shuffle(&mut rand::thread_rng());
        Self::from_playlist(files, delay)
    }

    /// Use `playlist` in the given order.
    #[must_use]
    pub fn from_playlist(playlist: Vec<PathBuf>, delay: Duration) -> Self {
        Self { playlist, delay }
    }

    #[must_use]
    pub fn playlist(&self) -> &[PathBuf] {
        &self.playlist
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    /// Show every item until the playlist ends or a quit arrives.
    ///
    /// `sender` feeds the per-item timer; it must belong to the same channel
    /// as `events`. `Accept` and `Reject` are ignored.
    ///
    /// # Errors
    ///
    /// Returns the surface error if an item cannot be shown. The surface is
    /// stopped on every exit path.
    pub fn run<S>(
        &self,
        surface: &mut S,
        sender: &Sender<ReviewEvent>,
        events: &Receiver<ReviewEvent>,
    ) -> Result<ViewSummary, SurfaceError>
    where
        S: PlaybackSurface + ?Sized,
    {
        let result = self.drive(surface, sender, events);
        surface.stop();
        result
    }

    fn drive<S>(
        &self,
        surface: &mut S,
        sender: &Sender<ReviewEvent>,
        events: &Receiver<ReviewEvent>,
    ) -> Result<ViewSummary, SurfaceError>
    where
        S: PlaybackSurface + ?Sized,
    {
        let total = self.playlist.len();
        let mut summary = ViewSummary {
            total,
            shown: 0,
            outcome: SessionOutcome::Complete,
        };

        for (index, path) in self.playlist.iter().enumerate() {
            surface.notify(&format!("Progress: {}/{}", index + 1, total));
            surface.show(path, index + 1, total)?;
            summary.shown += 1;

            let timer = AdvanceTimer::start(self.delay, sender.clone());
            let quit = wait_for_next(events);
            timer.cancel();

            if quit || drain_stale(events) {
                surface.notify("Quitting manually.");
                summary.outcome = SessionOutcome::Aborted;
                break;
            }
        }
        Ok(summary)
    }
}

/// Block until the current item should be replaced. Returns `true` on quit.
fn wait_for_next(events: &Receiver<ReviewEvent>) -> bool {
    loop {
        match events.recv() {
            Ok(ReviewEvent::Advance | ReviewEvent::Finished) => return false,
            Ok(ReviewEvent::Quit) | Err(_) => return true,
            Ok(event @ (ReviewEvent::Accept | ReviewEvent::Reject)) => {
                log::debug!("Ignoring {event:?} while viewing");
            }
        }
    }
}

/// Discard ticks that raced the previous advance. Returns `true` if a quit
/// was among them.
fn drain_stale(events: &Receiver<ReviewEvent>) -> bool {
    events.try_iter().any(|event| event == ReviewEvent::Quit)
}
