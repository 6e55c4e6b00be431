//! The review loop.
//!
//! A [`ReviewSession`] walks the inbox once, in name order. The current item
//! stays on the playback surface until the reviewer decides on it or quits.
//! Each decision applies the filesystem operation first; the key is recorded
//! and the decision files are flushed only once the file has actually been
//! moved or removed.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use serde::Serialize;
use yansi::Paint;

use super::disposal::{self, DisposeError};
use super::{PlaybackSurface, ReviewError, ReviewEvent};
use crate::collection::Collection;
use crate::scanner::{ContentKey, Hasher, KeyFormat};
use crate::store::Decision;

/// Behaviour switches for a review run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewConfig {
    /// Abort on the first file that cannot be moved or removed.
    pub strict: bool,
    /// Send rejected files to the system trash.
    pub use_trash: bool,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every item was decided (or failed).
    Complete,
    /// The reviewer quit; remaining items were left in the inbox.
    Aborted,
}

/// Lifecycle of the item currently at the head of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Presented,
    Blacklisted,
    Whitelisted,
}

/// What handling one event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing changed; the current item is still presented.
    Stay,
    /// The current item was resolved and the next one is due.
    Advanced,
    /// The queue is empty.
    Complete,
    /// The reviewer quit.
    Aborted,
}

/// Counts for a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub blacklisted: usize,
    pub whitelisted: usize,
    pub failed: usize,
    pub remaining: usize,
    pub outcome: SessionOutcome,
}

impl ReviewSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            blacklisted: 0,
            whitelisted: 0,
            failed: 0,
            remaining: total,
            outcome: SessionOutcome::Complete,
        }
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// A single pass over the inbox.
pub struct ReviewSession<'c> {
    collection: &'c mut Collection,
    hasher: Hasher,
    config: ReviewConfig,
    queue: VecDeque<PathBuf>,
    summary: ReviewSummary,
}

impl<'c> ReviewSession<'c> {
    /// Queue the current inbox listing.
    ///
    /// # Errors
    ///
    /// [`ReviewError::Collection`] if the inbox cannot be listed.
    pub fn new(
        collection: &'c mut Collection,
        format: KeyFormat,
        config: ReviewConfig,
    ) -> Result<Self, ReviewError> {
        let queue: VecDeque<PathBuf> = collection.staged_files()?.into();
        let summary = ReviewSummary::new(queue.len());
        log::debug!("Review queue holds {} files", queue.len());
        Ok(Self {
            collection,
            hasher: Hasher::new(format),
            config,
            queue,
            summary,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The item currently presented, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.queue.front().map(PathBuf::as_path)
    }

    /// 1-based position of the current item.
    #[must_use]
    pub fn position(&self) -> usize {
        self.summary.total - self.queue.len() + 1
    }

    #[must_use]
    pub fn summary(&self) -> &ReviewSummary {
        &self.summary
    }

    /// Drive the session from `events` until the queue is empty or the
    /// reviewer quits.
    ///
    /// A closed channel counts as a quit. The surface is stopped on every
    /// exit path.
    ///
    /// # Errors
    ///
    /// Surface and collection failures always abort; per-file failures
    /// abort only in strict mode.
    pub fn run<S>(
        mut self,
        surface: &mut S,
        events: &Receiver<ReviewEvent>,
    ) -> Result<ReviewSummary, ReviewError>
    where
        S: PlaybackSurface + ?Sized,
    {
        let result = self.drive(surface, events);
        surface.stop();
        self.summary.remaining = self.queue.len();
        result.map(|()| self.summary)
    }

    fn drive<S>(&mut self, surface: &mut S, events: &Receiver<ReviewEvent>) -> Result<(), ReviewError>
    where
        S: PlaybackSurface + ?Sized,
    {
        if self.queue.is_empty() {
            return Ok(());
        }
        self.present(surface)?;

        loop {
            let event = events.recv().unwrap_or(ReviewEvent::Quit);
            log::trace!("Review event: {event:?}");
            match self.handle(event, surface)? {
                Step::Stay => {}
                Step::Advanced => self.present(surface)?,
                Step::Complete | Step::Aborted => return Ok(()),
            }
        }
    }

    fn present<S>(&self, surface: &mut S) -> Result<(), ReviewError>
    where
        S: PlaybackSurface + ?Sized,
    {
        if let Some(path) = self.current() {
            let (position, total) = (self.position(), self.summary.total);
            surface.notify(&format!("Progress: {position}/{total}"));
            surface.show(path, position, total)?;
        }
        Ok(())
    }

    /// Apply one event to the current item.
    ///
    /// # Errors
    ///
    /// See [`ReviewSession::run`].
    pub fn handle<S>(&mut self, event: ReviewEvent, surface: &mut S) -> Result<Step, ReviewError>
    where
        S: PlaybackSurface + ?Sized,
    {
        if event == ReviewEvent::Quit {
            surface.notify("Quitting manually.");
            self.summary.outcome = SessionOutcome::Aborted;
            return Ok(Step::Aborted);
        }
        let Some(decision) = event.decision() else {
            return Ok(Step::Stay);
        };
        let Some(path) = self.queue.front().cloned() else {
            return Ok(Step::Complete);
        };

        match self.decide(&path, decision) {
            Ok(ItemState::Blacklisted) => {
                self.summary.blacklisted += 1;
                surface.notify(&format!("{} {}", "Blacklisted:".red(), path.display()));
            }
            Ok(ItemState::Whitelisted) => {
                self.summary.whitelisted += 1;
                surface.notify(&format!("{} {}", "Whitelisted:".green(), path.display()));
            }
            Ok(ItemState::Presented) => return Ok(Step::Stay),
            Err(e) if self.config.strict || !e.is_per_file() => return Err(e),
            Err(e) => {
                log::error!("Could not {} {}: {}", verb(decision), path.display(), e);
                self.summary.failed += 1;
                surface.notify(&format!("{} {}: {}", "! Failed:".red(), path.display(), e));
            }
        }

        self.queue.pop_front();
        if self.queue.is_empty() {
            self.summary.outcome = SessionOutcome::Complete;
            Ok(Step::Complete)
        } else {
            Ok(Step::Advanced)
        }
    }

    fn decide(&mut self, path: &Path, decision: Decision) -> Result<ItemState, ReviewError> {
        let key = self.key_for(path)?;
        let state = match decision {
            Decision::Rejected => {
                disposal::discard(path, self.config.use_trash)?;
                self.collection.mark_rejected(key);
                ItemState::Blacklisted
            }
            Decision::Accepted => {
                let name = path
                    .file_name()
                    .ok_or_else(|| DisposeError::NotFound(path.to_path_buf()))?;
                let dest = self.collection.output_path().join(name);
                if self.already_in_gallery(&dest, &key)? {
                    log::info!(
                        "{} is already in the gallery, dropping staged copy",
                        dest.display()
                    );
                    disposal::discard(path, false)?;
                } else {
                    disposal::promote(path, &dest)?;
                }
                self.collection.mark_accepted(key);
                ItemState::Whitelisted
            }
        };
        self.collection.flush()?;
        Ok(state)
    }

    /// Whether `dest` exists and holds the same content as `key`.
    ///
    /// A gallery file with the staged name but other content is left for
    /// [`disposal::promote`] to refuse.
    fn already_in_gallery(&self, dest: &Path, key: &ContentKey) -> Result<bool, ReviewError> {
        if fs::symlink_metadata(dest).is_err() {
            return Ok(false);
        }
        Ok(self.hasher.content_key(dest)? == *key)
    }

    /// Key of a staged file: parsed from its name when that is a well-formed
    /// key, recomputed from the bytes otherwise.
    fn key_for(&self, path: &Path) -> Result<ContentKey, ReviewError> {
        let parsed = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| ContentKey::from_staged_name(n, self.hasher.format()));
        match parsed {
            Some(key) => Ok(key),
            None => {
                log::debug!("Recomputing key for {}", path.display());
                Ok(self.hasher.content_key(path)?)
            }
        }
    }
}

fn verb(decision: Decision) -> &'static str {
    match decision {
        Decision::Accepted => "accept",
        Decision::Rejected => "reject",
    }
}
