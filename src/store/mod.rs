//! Durable decision sets.
//!
//! A collection remembers every accept/reject decision as two plain text
//! files, one content key per line. This module provides the in-memory set
//! type and the load/save routines for those files.
//!
//! # Architecture
//!
//! * [`decision_set`]: The [`DecisionSet`] type and the [`Decision`] enum.
//! * [`file`]: Line-oriented load, and atomic save via temp file + rename.
//!
//! # Durability
//!
//! [`save`] writes the new contents to a temporary file in the same
//! directory, syncs it, and renames it over the old file. An interrupted save
//! leaves either the old or the new contents, never a torn file.

pub mod decision_set;
pub mod file;

use std::path::PathBuf;

pub use decision_set::{Decision, DecisionSet};
pub use file::{load, load_or_create, save};

/// Errors from reading or writing a decision file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The decision file exists but could not be read.
    #[error("cannot read decision file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decision file could not be created or written.
    #[error("cannot write decision file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
