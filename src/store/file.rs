//! Decision file I/O.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::{DecisionSet, StoreError, StoreResult};
use crate::scanner::ContentKey;

/// Load a decision file.
///
/// One key per line. Blank lines (including the one after the final
/// newline) are dropped and surrounding whitespace is trimmed, so a stray
/// empty key can never make every file look known.
///
/// # Errors
///
/// Returns [`StoreError::Read`] if the file is missing or unreadable.
pub fn load(path: &Path) -> StoreResult<DecisionSet> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let set: DecisionSet = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ContentKey::from_stored)
        .collect();

    log::debug!("Loaded {} keys from {}", set.len(), path.display());
    Ok(set)
}

/// Load a decision file, creating it empty if it does not exist.
///
/// An existing file is never truncated.
///
/// # Errors
///
/// Returns [`StoreError::Write`] if the file has to be created and cannot
/// be, and [`StoreError::Read`] if it exists but cannot be read.
pub fn load_or_create(path: &Path) -> StoreResult<DecisionSet> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => {
            log::info!("Created decision file {}", path.display());
            Ok(DecisionSet::new())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => load(path),
        Err(source) => Err(StoreError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically replace a decision file with the given keys.
///
/// Keys are written sorted, one per line, each newline-terminated. The data
/// goes to a temporary file next to `path`, is synced, then renamed over
/// `path`.
///
/// # Errors
///
/// Returns [`StoreError::Write`] on any I/O failure; the previous file is
/// left intact.
pub fn save(path: &Path, set: &DecisionSet) -> StoreResult<()> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        for key in set.iter() {
            writeln!(writer, "{key}").map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;
    }
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    log::debug!("Saved {} keys to {}", set.len(), path.display());
    Ok(())
}
