//! Importing source trees into a collection's inbox.
//!
//! # Pipeline
//!
//! For every regular file under the source directory (deepest-first, sorted):
//!
//! 1. An ignored extension is reported and skipped without hashing.
//! 2. The content key is computed; content already accepted or rejected is
//!    skipped.
//! 3. If `<inbox>/<key><ext>` already exists (identical content seen earlier
//!    in this batch or a previous one) the file is skipped.
//! 4. Otherwise the file is copied into the inbox under that name.
//!
//! The source tree is never modified.
//!
//! # Copy atomicity
//!
//! Bytes are first written to a hidden `.galman-*` temp file inside the
//! inbox, synced, and then linked onto the target name without clobbering.
//! A crash mid-copy can therefore never leave a truncated file that later
//! imports would mistake for a complete staged copy.
//!
//! # Failure policy
//!
//! By default a file that cannot be read or copied is reported as failed and
//! the batch continues. With `strict` set the first such error aborts the
//! import.
//!
//! # Example
//!
//! ```no_run
//! use galman::collection::Collection;
//! use galman::import::{ImportConfig, Importer};
//! use galman::scanner::KeyFormat;
//! use std::path::Path;
//!
//! let collection = Collection::open(Path::new("/data/col")).unwrap();
//! let importer = Importer::new(KeyFormat::default(), ImportConfig::default());
//! let report = importer.import_from(&collection, Path::new("/media/camera")).unwrap();
//! println!("{}", report.summary());
//! ```

pub mod report;

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collection::{Collection, STAGING_TEMP_PREFIX};
use crate::progress::{ProgressCallback, PHASE_IMPORT, PHASE_WALKING};
use crate::scanner::{FileEntry, HashError, Hasher, KeyFormat, ScanError, Walker, WalkerConfig};
use crate::store::Decision;

pub use report::{IgnoreReason, ImportEntry, ImportOutcome, ImportReport};

/// Errors that abort an import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The source directory does not exist.
    #[error("source directory {0} does not exist")]
    SourceNotFound(PathBuf),

    /// The source path is not a directory.
    #[error("source {0} is not a directory")]
    NotADirectory(PathBuf),

    /// A file could not be enumerated (strict mode only).
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be hashed (strict mode only).
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A file could not be copied into the inbox (strict mode only).
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The import was interrupted by a shutdown signal.
    #[error("import interrupted")]
    Interrupted,
}

/// Make sure `source` is an existing directory.
///
/// # Errors
///
/// [`ImportError::SourceNotFound`] or [`ImportError::NotADirectory`].
pub fn check_source(source: &Path) -> Result<(), ImportError> {
    if !source.exists() {
        return Err(ImportError::SourceNotFound(source.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(ImportError::NotADirectory(source.to_path_buf()));
    }
    Ok(())
}

/// Normalized set of extensions excluded from import.
///
/// Matching is case-insensitive and the leading dot is optional in the
/// configured values (`"json"` and `".JSON"` both exclude `photo.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoredExtensions(BTreeSet<String>);

impl IgnoredExtensions {
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| e.len() > 1)
                .collect(),
        )
    }

    /// Whether an extension (with leading dot, as from a file name) is ignored.
    #[must_use]
    pub fn contains(&self, extension: &str) -> bool {
        !extension.is_empty() && self.0.contains(&normalize_extension(extension))
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Import behaviour.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub ignored_extensions: IgnoredExtensions,
    /// Abort on the first per-file error instead of reporting and continuing.
    pub strict: bool,
    pub walker: WalkerConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            ignored_extensions: IgnoredExtensions::new([".tags", ".swf", ".json"]),
            strict: false,
            walker: WalkerConfig::default(),
        }
    }
}

/// Imports source trees into a collection's inbox.
pub struct Importer {
    hasher: Hasher,
    config: ImportConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Importer {
    #[must_use]
    pub fn new(format: KeyFormat, config: ImportConfig) -> Self {
        Self {
            hasher: Hasher::new(format),
            config,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Stop between files once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report progress and per-file lines to the given callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Import every file under `source` into the collection's inbox.
    ///
    /// # Errors
    ///
    /// [`ImportError::SourceNotFound`] / [`ImportError::NotADirectory`] before
    /// any work starts, [`ImportError::Interrupted`] on shutdown, and in
    /// strict mode the first per-file error.
    pub fn import_from(
        &self,
        collection: &Collection,
        source: &Path,
    ) -> Result<ImportReport, ImportError> {
        check_source(source)?;

        log::info!(
            "Importing {} into {}",
            source.display(),
            collection.root().display()
        );

        let mut walker = Walker::new(source, self.config.walker.clone());
        if let Some(flag) = &self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        self.phase_start(PHASE_WALKING, 0);
        let mut found = Vec::new();
        for (i, item) in walker.walk().enumerate() {
            if let Ok(entry) = &item {
                self.progress(i + 1, &entry.path);
            }
            found.push(item);
        }
        self.phase_end(PHASE_WALKING);

        if self.is_shutdown_requested() {
            return Err(ImportError::Interrupted);
        }

        let mut report = ImportReport::new(source);
        let inbox = collection.inbox_path();

        self.phase_start(PHASE_IMPORT, found.len());
        for (i, item) in found.into_iter().enumerate() {
            if self.is_shutdown_requested() {
                self.phase_end(PHASE_IMPORT);
                log::warn!("Import interrupted: {}", report.summary());
                return Err(ImportError::Interrupted);
            }

            let entry = match item {
                Ok(entry) => {
                    self.progress(i + 1, &entry.path);
                    let outcome = self.import_file(collection, &inbox, &entry);
                    self.settle(entry.path.as_path(), outcome)
                }
                Err(e) => {
                    let path = e.path().to_path_buf();
                    self.settle(&path, Err(ImportError::Scan(e)))
                }
            };

            match entry {
                Ok(entry) => {
                    if let Some(progress) = &self.progress {
                        progress.on_line(&entry.console_line());
                    }
                    report.push(entry);
                }
                Err(e) => {
                    self.phase_end(PHASE_IMPORT);
                    return Err(e);
                }
            }
        }
        self.phase_end(PHASE_IMPORT);

        log::info!("Import of {} finished: {}", source.display(), report.summary());
        Ok(report)
    }

    /// Turn a per-file result into a report entry, or the batch error in
    /// strict mode.
    fn settle(
        &self,
        path: &Path,
        outcome: Result<ImportOutcome, ImportError>,
    ) -> Result<ImportEntry, ImportError> {
        match outcome {
            Ok(outcome) => Ok(ImportEntry::new(path, outcome)),
            Err(e) if self.config.strict => {
                log::error!("Aborting import at {}: {}", path.display(), e);
                Err(e)
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                Ok(ImportEntry::new(
                    path,
                    ImportOutcome::Failed {
                        error: e.to_string(),
                    },
                ))
            }
        }
    }

    fn import_file(
        &self,
        collection: &Collection,
        inbox: &Path,
        entry: &FileEntry,
    ) -> Result<ImportOutcome, ImportError> {
        let extension = entry.extension();
        if self.config.ignored_extensions.contains(&extension) {
            log::debug!("Ignored extension: {}", entry.path.display());
            return Ok(ImportOutcome::Ignored {
                reason: IgnoreReason::IgnoredExtension,
                key: None,
            });
        }

        let key = self.hasher.content_key(&entry.path)?;

        if let Some(decision) = collection.decision(&key) {
            let reason = match decision {
                Decision::Accepted => IgnoreReason::AlreadyAccepted,
                Decision::Rejected => IgnoreReason::AlreadyRejected,
            };
            return Ok(ImportOutcome::Ignored {
                reason,
                key: Some(key),
            });
        }

        let target = inbox.join(key.staged_name(&extension));
        if target.exists() {
            return Ok(ImportOutcome::Ignored {
                reason: IgnoreReason::AlreadyStaged,
                key: Some(key),
            });
        }

        let copy_err = |source: io::Error| ImportError::Copy {
            from: entry.path.clone(),
            to: target.clone(),
            source,
        };

        match stage_copy(&entry.path, inbox, &target).map_err(copy_err)? {
            Some(bytes) => Ok(ImportOutcome::Copied { key, target, bytes }),
            None => Ok(ImportOutcome::Ignored {
                reason: IgnoreReason::AlreadyStaged,
                key: Some(key),
            }),
        }
    }

    fn phase_start(&self, phase: &str, total: usize) {
        if let Some(progress) = &self.progress {
            progress.on_phase_start(phase, total);
        }
    }

    fn phase_end(&self, phase: &str) {
        if let Some(progress) = &self.progress {
            progress.on_phase_end(phase);
        }
    }

    fn progress(&self, current: usize, path: &Path) {
        if let Some(progress) = &self.progress {
            progress.on_progress(current, &path.to_string_lossy());
        }
    }
}

/// Copy `source` to `target` through a temp file in `inbox`.
///
/// Returns `Ok(None)` if `target` appeared in the meantime; it is never
/// overwritten.
fn stage_copy(source: &Path, inbox: &Path, target: &Path) -> io::Result<Option<u64>> {
    let mut input = File::open(source)?;
    let mut temp = tempfile::Builder::new()
        .prefix(STAGING_TEMP_PREFIX)
        .tempfile_in(inbox)?;

    let bytes = io::copy(&mut input, temp.as_file_mut())?;
    if let Ok(metadata) = input.metadata() {
        if let Err(e) = fs::set_permissions(temp.path(), metadata.permissions()) {
            log::debug!("Cannot copy permissions to {}: {}", target.display(), e);
        }
    }
    temp.as_file().sync_all()?;

    match temp.persist_noclobber(target) {
        Ok(_) => Ok(Some(bytes)),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e.error),
    }
}
