//! Content keys with streaming SHA-256.
//!
//! # Overview
//!
//! A [`ContentKey`] is the identity of a file's bytes: a truncated SHA-256
//! digest followed by the file size, both as zero-padded lowercase hex.
//! With the default [`KeyFormat`] a key is 40 characters long, longer only
//! for files of 4 GiB and up, whose size needs more than 8 digits:
//!
//! ```text
//! 32 hex digits of (sha256 mod 2^128) ++ 8 hex digits of size
//! ```
//!
//! The size field disambiguates most truncation collisions but does not
//! eliminate them.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// Read buffer size for streaming digests (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Hex digits in a full SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Hex digits needed for any `u64`.
const MAX_SIZE_WIDTH: usize = 16;

/// Widths of the two hex fields of a content key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFormat {
    /// Number of hex digits kept from the digest (1..=64).
    pub hash_width: usize,
    /// Number of hex digits used for the file size (1..=16).
    pub size_width: usize,
}

impl Default for KeyFormat {
    fn default() -> Self {
        Self {
            hash_width: 32,
            size_width: 8,
        }
    }
}

/// A key format with a field width outside the supported range.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyFormatError {
    #[error("hash width must be between 1 and {DIGEST_HEX_LEN}, got {0}")]
    HashWidth(usize),
    #[error("size width must be between 1 and {MAX_SIZE_WIDTH}, got {0}")]
    SizeWidth(usize),
}

impl KeyFormat {
    /// Create a validated key format.
    pub fn new(hash_width: usize, size_width: usize) -> Result<Self, KeyFormatError> {
        let format = Self {
            hash_width,
            size_width,
        };
        format.validate()?;
        Ok(format)
    }

    /// Check that both widths are in range.
    pub fn validate(&self) -> Result<(), KeyFormatError> {
        if !(1..=DIGEST_HEX_LEN).contains(&self.hash_width) {
            return Err(KeyFormatError::HashWidth(self.hash_width));
        }
        if !(1..=MAX_SIZE_WIDTH).contains(&self.size_width) {
            return Err(KeyFormatError::SizeWidth(self.size_width));
        }
        Ok(())
    }

    /// Key length in characters for any file under `16^size_width` bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.hash_width + self.size_width
    }

    /// Longest possible key, reached when the size needs all 16 hex digits.
    #[must_use]
    pub fn max_key_len(&self) -> usize {
        self.hash_width + self.size_width.max(MAX_SIZE_WIDTH)
    }

    /// Render a finished digest and a byte count as a key.
    ///
    /// The digest is read as a big-endian integer, so reducing it modulo
    /// 2^(4·width) keeps its last `hash_width` hex digits. The size is
    /// never truncated: one too large for the size field widens the key.
    #[must_use]
    pub fn render(&self, digest: &[u8], size: u64) -> ContentKey {
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        let hash_part = &hex[hex.len().saturating_sub(self.hash_width)..];

        ContentKey(format!(
            "{hash_part:0>hw$}{size:0sw$x}",
            hw = self.hash_width,
            sw = self.size_width
        ))
    }
}

/// Fixed-width hex identity of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Parse a string as a key of the given format.
    ///
    /// Returns `None` unless the string is lowercase hex of exactly
    /// `key_len` digits, or longer with a size field that had to widen
    /// (no leading zero, at most 16 digits).
    #[must_use]
    pub fn parse(s: &str, format: &KeyFormat) -> Option<Self> {
        let len = s.len();
        if len < format.key_len() || len > format.max_key_len() || !is_lower_hex(s) {
            return None;
        }
        if len > format.key_len() && s.as_bytes()[format.hash_width] == b'0' {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// Wrap a stored key without validating it.
    ///
    /// Decision files may hold keys written under a different [`KeyFormat`];
    /// they still have to be matched verbatim.
    #[must_use]
    pub fn from_stored(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Recover the key from a staged file name of the form `<key><ext>`.
    ///
    /// The part before the first `.` must be a well-formed key. Anything
    /// else (for example a file dropped into the inbox by hand) yields
    /// `None`.
    #[must_use]
    pub fn from_staged_name(file_name: &str, format: &KeyFormat) -> Option<Self> {
        let head = file_name.split('.').next()?;
        Self::parse(head, format)
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Staged file name for this key and an extension (with leading dot).
    #[must_use]
    pub fn staged_name(&self, extension: &str) -> String {
        format!("{}{}", self.0, extension)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Content key hasher.
///
/// Streams files through SHA-256 in [`CHUNK_SIZE`] pieces; no file is ever
/// loaded into memory whole.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    format: KeyFormat,
}

impl Hasher {
    /// Create a hasher producing keys in the given format.
    #[must_use]
    pub fn new(format: KeyFormat) -> Self {
        Self { format }
    }

    /// The key format this hasher produces.
    #[must_use]
    pub fn format(&self) -> &KeyFormat {
        &self.format
    }

    /// Compute the content key of the file at `path`.
    ///
    /// Symbolic links are followed. The size field counts the bytes
    /// actually digested.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn content_key(&self, path: &Path) -> Result<ContentKey, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        self.content_key_from_reader(file, path)
    }

    /// Compute a content key from any reader. `path` is used for errors only.
    pub fn content_key_from_reader<R: Read>(
        &self,
        mut reader: R,
        path: &Path,
    ) -> Result<ContentKey, HashError> {
        let mut digest = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut size: u64 = 0;

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(PathBuf::from(path), e)),
            };
            digest.update(&buffer[..n]);
            size += n as u64;
        }

        let key = self.format.render(&digest.finalize(), size);
        log::trace!("Key {} for {}", key, path.display());
        Ok(key)
    }
}

/// Compute the content key of a file with the given format.
///
/// Convenience wrapper around [`Hasher::content_key`].
pub fn compute_key(path: &Path, format: &KeyFormat) -> Result<ContentKey, HashError> {
    Hasher::new(*format).content_key(path)
}
