//! Media collections.
//!
//! A [`Collection`] is a root directory with a fixed layout:
//!
//! ```text
//! <root>/.blacklist   rejected content keys, one per line
//! <root>/.whitelist   accepted content keys, one per line
//! <root>/.airlock/    inbox of imported, unreviewed files named <key><ext>
//! <root>/Gallery/     accepted files
//! ```
//!
//! Opening a collection creates whatever part of this layout is missing and
//! loads both decision sets into memory. Decisions are made in memory and
//! written back on [`Collection::flush`] and on close. Dropping an open
//! collection closes it, so the sets are flushed on early returns and during
//! panic unwinding as well.
//!
//! Only one process may have a collection open at a time; nothing guards
//! against two.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::ContentKey;
use crate::store::{self, Decision, DecisionSet, StoreError};

/// Rejected-key file name.
pub const BLACKLIST_FILE: &str = ".blacklist";
/// Accepted-key file name.
pub const WHITELIST_FILE: &str = ".whitelist";
/// Inbox directory name.
pub const AIRLOCK_DIR: &str = ".airlock";
/// Accepted-output directory name.
pub const GALLERY_DIR: &str = "Gallery";
/// Prefix of in-progress copies inside the inbox.
pub const STAGING_TEMP_PREFIX: &str = ".galman-";

/// Errors opening, listing or closing a collection.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// Part of the collection layout could not be created.
    #[error("cannot set up collection at {path}: {source}")]
    Bootstrap {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A decision file could not be read or written.
    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// A managed directory could not be listed.
    #[error("cannot list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counts describing a collection's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub root: PathBuf,
    pub accepted: usize,
    pub rejected: usize,
    pub staged: usize,
    pub gallery: usize,
}

/// An open collection.
#[derive(Debug)]
pub struct Collection {
    root: PathBuf,
    accepted: DecisionSet,
    rejected: DecisionSet,
    closed: bool,
}

impl Collection {
    /// Open the collection at `root`, creating any missing part of it.
    ///
    /// Existing files and directories are never modified.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Bootstrap`] if the layout cannot be created and
    /// [`CollectionError::Persistence`] if a decision file exists but cannot
    /// be read.
    pub fn open(root: &Path) -> Result<Self, CollectionError> {
        let bootstrap_err = |path: &Path, source: io::Error| CollectionError::Bootstrap {
            path: path.to_path_buf(),
            source,
        };

        if root.exists() && !root.is_dir() {
            return Err(bootstrap_err(
                root,
                io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
            ));
        }

        for dir in [
            root.to_path_buf(),
            root.join(AIRLOCK_DIR),
            root.join(GALLERY_DIR),
        ] {
            fs::create_dir_all(&dir).map_err(|e| bootstrap_err(&dir, e))?;
        }

        let load = |name: &str| {
            let path = root.join(name);
            store::load_or_create(&path).map_err(|e| match e {
                StoreError::Write { path, source } => CollectionError::Bootstrap { path, source },
                read @ StoreError::Read { .. } => CollectionError::Persistence(read),
            })
        };
        let rejected = load(BLACKLIST_FILE)?;
        let accepted = load(WHITELIST_FILE)?;

        log::info!(
            "Opened collection {} ({} accepted, {} rejected)",
            root.display(),
            accepted.len(),
            rejected.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            accepted,
            rejected,
            closed: false,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The inbox (`.airlock`) directory.
    #[must_use]
    pub fn inbox_path(&self) -> PathBuf {
        self.root.join(AIRLOCK_DIR)
    }

    /// The accepted-output (`Gallery`) directory.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.root.join(GALLERY_DIR)
    }

    #[must_use]
    pub fn blacklist_path(&self) -> PathBuf {
        self.root.join(BLACKLIST_FILE)
    }

    #[must_use]
    pub fn whitelist_path(&self) -> PathBuf {
        self.root.join(WHITELIST_FILE)
    }

    /// Whether the key has been decided either way.
    #[must_use]
    pub fn is_known(&self, key: &ContentKey) -> bool {
        self.accepted.contains(key) || self.rejected.contains(key)
    }

    #[must_use]
    pub fn is_accepted(&self, key: &ContentKey) -> bool {
        self.accepted.contains(key)
    }

    #[must_use]
    pub fn is_rejected(&self, key: &ContentKey) -> bool {
        self.rejected.contains(key)
    }

    /// The recorded decision for a key.
    ///
    /// A key present in both sets reports [`Decision::Rejected`].
    #[must_use]
    pub fn decision(&self, key: &ContentKey) -> Option<Decision> {
        if self.rejected.contains(key) {
            Some(Decision::Rejected)
        } else if self.accepted.contains(key) {
            Some(Decision::Accepted)
        } else {
            None
        }
    }

    /// Record an accept. Returns `false` if it was already recorded.
    pub fn mark_accepted(&mut self, key: ContentKey) -> bool {
        self.accepted.insert(key)
    }

    /// Record a reject. Returns `false` if it was already recorded.
    pub fn mark_rejected(&mut self, key: ContentKey) -> bool {
        self.rejected.insert(key)
    }

    /// Record a decision of either kind.
    pub fn record(&mut self, key: ContentKey, decision: Decision) -> bool {
        match decision {
            Decision::Accepted => self.mark_accepted(key),
            Decision::Rejected => self.mark_rejected(key),
        }
    }

    #[must_use]
    pub fn accepted(&self) -> &DecisionSet {
        &self.accepted
    }

    #[must_use]
    pub fn rejected(&self) -> &DecisionSet {
        &self.rejected
    }

    /// Files currently waiting in the inbox, sorted by name.
    ///
    /// In-progress import copies are not listed.
    pub fn staged_files(&self) -> Result<Vec<PathBuf>, CollectionError> {
        list_files(&self.inbox_path())
    }

    /// Files in the gallery, sorted by name.
    pub fn gallery_files(&self) -> Result<Vec<PathBuf>, CollectionError> {
        list_files(&self.output_path())
    }

    /// Counts for the collection at `root`, read without opening it.
    ///
    /// Nothing is created or rewritten; a missing decision file or
    /// directory counts as empty.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Persistence`] if a decision file exists but cannot
    /// be read, [`CollectionError::Listing`] if a directory cannot be listed.
    pub fn inspect(root: &Path) -> Result<CollectionStatus, CollectionError> {
        let count_keys = |name: &str| -> Result<usize, CollectionError> {
            let path = root.join(name);
            if !path.exists() {
                return Ok(0);
            }
            Ok(store::load(&path)?.len())
        };
        let count_files = |name: &str| -> Result<usize, CollectionError> {
            let dir = root.join(name);
            if !dir.is_dir() {
                return Ok(0);
            }
            Ok(list_files(&dir)?.len())
        };

        Ok(CollectionStatus {
            root: root.to_path_buf(),
            accepted: count_keys(WHITELIST_FILE)?,
            rejected: count_keys(BLACKLIST_FILE)?,
            staged: count_files(AIRLOCK_DIR)?,
            gallery: count_files(GALLERY_DIR)?,
        })
    }

    /// Write both decision sets to disk without closing.
    pub fn flush(&self) -> Result<(), CollectionError> {
        store::save(&self.blacklist_path(), &self.rejected)?;
        store::save(&self.whitelist_path(), &self.accepted)?;
        Ok(())
    }

    /// Persist both decision sets and close the collection.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Persistence`] if either file cannot be written.
    /// The collection counts as closed either way; `Drop` does not retry.
    pub fn close(mut self) -> Result<(), CollectionError> {
        self.closed = true;
        let result = self.flush();
        if result.is_ok() {
            log::debug!("Closed collection {}", self.root.display());
        }
        result
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.flush() {
            log::error!(
                "Failed to save decisions for {}: {}",
                self.root.display(),
                e
            );
        } else {
            log::debug!("Flushed collection {} on drop", self.root.display());
        }
    }
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, CollectionError> {
    let listing_err = |source: io::Error| CollectionError::Listing {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_err)? {
        let entry = entry.map_err(listing_err)?;
        if entry
            .file_name()
            .to_string_lossy()
            .starts_with(STAGING_TEMP_PREFIX)
        {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
