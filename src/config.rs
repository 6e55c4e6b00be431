//! Application configuration management.
//!
//! Configuration is layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (`--config PATH`, or the platform config directory)
//! 3. `GALMAN_*` environment variables (`__` separates nested keys,
//!    e.g. `GALMAN_BINDINGS__QUIT='["q", "x"]'`)
//! 4. Command-line flags, applied by the caller
//!
//! # Example file
//!
//! ```toml
//! hash_width = 32
//! size_width = 8
//! ignored_extensions = [".tags", ".swf", ".json", ".xmp"]
//! strict = false
//! use_trash = true
//! viewer = "mpv --loop-file=inf --mute=yes"
//!
//! [bindings]
//! accept = ["4", "a"]
//! reject = ["8", "\\"]
//! quit = ["q"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::{KeyFormat, KeyFormatError};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "GALMAN_";

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or merged.
    #[error("invalid configuration: {0}")]
    Load(#[from] figment::Error),

    /// Key widths out of range.
    #[error("invalid key format: {0}")]
    KeyFormat(#[from] KeyFormatError),

    /// A review action has no key bound to it.
    #[error("no key bound to the {0} action")]
    EmptyBinding(&'static str),

    /// The slideshow delay is zero.
    #[error("view_delay must be at least 1 second")]
    ViewDelay,
}

/// Keys bound to review actions.
///
/// Each entry is a single character (`"a"`, `"\\"`) or a named key
/// (`"Esc"`, `"Enter"`, `"Ctrl+c"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    pub accept: Vec<String>,
    pub reject: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            accept: vec!["4".to_string(), "a".to_string()],
            reject: vec!["8".to_string(), "\\".to_string()],
            quit: vec!["q".to_string()],
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hex digits kept from the SHA-256 digest.
    pub hash_width: usize,
    /// Hex digits used for the file size.
    pub size_width: usize,
    /// Extensions never imported (sidecar and metadata formats).
    pub ignored_extensions: Vec<String>,
    /// Abort an import or review on the first per-file error.
    pub strict: bool,
    /// Send rejected files to the system trash instead of unlinking them.
    pub use_trash: bool,
    /// External command used to open each reviewed file, split on whitespace.
    pub viewer: Option<String>,
    /// Seconds between advances in viewing mode.
    pub view_delay: u64,
    /// Review key bindings.
    pub bindings: Bindings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_width: 32,
            size_width: 8,
            ignored_extensions: vec![".tags".into(), ".swf".into(), ".json".into()],
            strict: false,
            use_trash: false,
            viewer: None,
            view_delay: 5,
            bindings: Bindings::default(),
        }
    }
}

impl Config {
    /// Load configuration from all layers.
    ///
    /// With `explicit = Some(path)` that file must exist. Otherwise the
    /// platform default file is used if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer fails to parse or the result does
    /// not validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        if let Some(path) = &file {
            log::debug!("Loading config from {}", path.display());
        }

        let config: Self = Self::figment(file.as_deref()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "galman", "galman")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check widths, the view delay and bindings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.key_format()?;
        if self.view_delay == 0 {
            return Err(ConfigError::ViewDelay);
        }
        for (name, keys) in [
            ("accept", &self.bindings.accept),
            ("reject", &self.bindings.reject),
            ("quit", &self.bindings.quit),
        ] {
            if keys.is_empty() {
                return Err(ConfigError::EmptyBinding(name));
            }
        }
        Ok(())
    }

    /// The content key format described by this configuration.
    pub fn key_format(&self) -> Result<KeyFormat, KeyFormatError> {
        KeyFormat::new(self.hash_width, self.size_width)
    }
}
