//! Filesystem side of a review decision.
//!
//! A rejected file is unlinked (or sent to the system trash); an accepted
//! file is moved into the gallery. Both operations report the path they
//! failed on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for discarding or promoting a staged file.
#[derive(Debug, thiserror::Error)]
pub enum DisposeError {
    /// The staged file vanished before it could be handled.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied on the staged file or its destination.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// The gallery already holds a file with that name.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DisposeError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path the operation failed on.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::DestinationExists(p) => p,
            Self::TrashFailed { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// Remove a rejected file, via the trash when `use_trash` is set.
pub fn discard(path: &Path, use_trash: bool) -> Result<(), DisposeError> {
    fs::symlink_metadata(path).map_err(|e| DisposeError::from_io(path, e))?;

    if use_trash {
        trash::delete(path).map_err(|e| {
            log::error!("Trash operation failed for {}: {}", path.display(), e);
            DisposeError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        log::debug!("Moved to trash: {}", path.display());
    } else {
        fs::remove_file(path).map_err(|e| DisposeError::from_io(path, e))?;
        log::debug!("Deleted: {}", path.display());
    }
    Ok(())
}

/// Move an accepted file to `dest`, refusing to replace an existing file.
///
/// Falls back to copy-then-remove when a rename is not possible (e.g. the
/// gallery lives on another filesystem).
pub fn promote(path: &Path, dest: &Path) -> Result<(), DisposeError> {
    if fs::symlink_metadata(dest).is_ok() {
        return Err(DisposeError::DestinationExists(dest.to_path_buf()));
    }
    fs::symlink_metadata(path).map_err(|e| DisposeError::from_io(path, e))?;

    if let Err(e) = fs::rename(path, dest) {
        log::debug!(
            "Rename {} -> {} failed ({}), copying instead",
            path.display(),
            dest.display(),
            e
        );
        fs::copy(path, dest).map_err(|e| DisposeError::from_io(dest, e))?;
        fs::remove_file(path).map_err(|e| DisposeError::from_io(path, e))?;
    }
    log::debug!("Moved {} -> {}", path.display(), dest.display());
    Ok(())
}
