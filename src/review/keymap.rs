//! Key bindings for review and viewing.
//!
//! Configured key specs (`"a"`, `"\\"`, `"Ctrl+q"`, `"Space"`) are parsed
//! into crossterm [`KeyEvent`]s and mapped to [`ReviewEvent`]s. `Esc` and
//! `Ctrl+C` always quit: raw mode swallows SIGINT, so the reader has to
//! translate it itself.
//!
//! # Example
//!
//! ```
//! use galman::config::Bindings;
//! use galman::review::{KeyMap, ReviewEvent};
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//!
//! let keymap = KeyMap::from_bindings(&Bindings::default()).unwrap();
//! let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
//!
//! assert_eq!(keymap.resolve(&key), Some(ReviewEvent::Accept));
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ReviewEvent;
use crate::config::Bindings;

/// Error type for key binding parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyMapError {
    /// Invalid key specification.
    #[error("Invalid key specification: '{0}'. Examples: 'a', '\\', 'Ctrl+q', 'Space', 'F1'")]
    InvalidKeySpec(String),
}

/// Mapping from key presses to session events.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(KeyEvent, ReviewEvent)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            bindings: Self::builtin(),
        }
    }
}

impl KeyMap {
    /// Build a key map from configured bindings plus the built-in quit keys.
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::InvalidKeySpec`] for the first spec that does
    /// not parse.
    pub fn from_bindings(bindings: &Bindings) -> Result<Self, KeyMapError> {
        let mut map = Vec::new();
        for (specs, event) in [
            (&bindings.accept, ReviewEvent::Accept),
            (&bindings.reject, ReviewEvent::Reject),
            (&bindings.quit, ReviewEvent::Quit),
        ] {
            for spec in specs {
                map.push((Self::parse_key(spec)?, event));
            }
        }
        map.extend(Self::builtin());
        Ok(Self { bindings: map })
    }

    fn builtin() -> Vec<(KeyEvent, ReviewEvent)> {
        vec![
            (KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), ReviewEvent::Quit),
            (
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                ReviewEvent::Quit,
            ),
        ]
    }

    /// Resolve a key event to a session event.
    ///
    /// Key release and repeat events are ignored (some terminals send them).
    /// The first matching binding wins.
    #[must_use]
    pub fn resolve(&self, key: &KeyEvent) -> Option<ReviewEvent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        self.bindings
            .iter()
            .find(|(bound, _)| Self::key_matches(bound, key))
            .map(|(_, event)| *event)
    }

    /// Match code and modifiers. Shift is ignored for characters since the
    /// terminal already folds it into the character itself.
    fn key_matches(target: &KeyEvent, actual: &KeyEvent) -> bool {
        if target.code != actual.code {
            return false;
        }
        match actual.code {
            KeyCode::Char(_) => {
                target.modifiers.difference(KeyModifiers::SHIFT)
                    == actual.modifiers.difference(KeyModifiers::SHIFT)
            }
            _ => target.modifiers == actual.modifiers,
        }
    }

    /// Parse a key specification like `"a"`, `"Ctrl+q"` or `"Esc"`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::InvalidKeySpec`] for empty specs, unknown key
    /// names and misplaced modifiers.
    pub fn parse_key(spec: &str) -> Result<KeyEvent, KeyMapError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(KeyMapError::InvalidKeySpec(spec.to_string()));
        }

        // A bare '+' is the plus key, not a separator
        let parts: Vec<&str> = if spec == "+" {
            vec!["+"]
        } else {
            spec.split('+').map(str::trim).collect()
        };

        let mut modifiers = KeyModifiers::NONE;
        let mut key_part = None;

        for (i, part) in parts.iter().enumerate() {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "meta" | "option" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => {
                    if i != parts.len() - 1 {
                        return Err(KeyMapError::InvalidKeySpec(format!(
                            "'{spec}' - unexpected modifier position for '{part}'"
                        )));
                    }
                    key_part = Some(*part);
                }
            }
        }

        let key_str = key_part.ok_or_else(|| {
            KeyMapError::InvalidKeySpec(format!("'{spec}' - missing key after modifiers"))
        })?;

        let code = Self::parse_key_code(key_str)
            .ok_or_else(|| KeyMapError::InvalidKeySpec(spec.to_string()))?;

        Ok(KeyEvent::new(code, modifiers))
    }

    fn parse_key_code(s: &str) -> Option<KeyCode> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(KeyCode::Char(c));
        }

        let lower = s.to_lowercase();
        if let Some(n) = lower.strip_prefix('f').and_then(|rest| rest.parse::<u8>().ok()) {
            if (1..=12).contains(&n) {
                return Some(KeyCode::F(n));
            }
        }

        match lower.as_str() {
            "space" | "spc" => Some(KeyCode::Char(' ')),
            "enter" | "return" | "ret" | "cr" => Some(KeyCode::Enter),
            "esc" | "escape" => Some(KeyCode::Esc),
            "tab" => Some(KeyCode::Tab),
            "backspace" | "bs" => Some(KeyCode::Backspace),
            "delete" | "del" => Some(KeyCode::Delete),
            "insert" | "ins" => Some(KeyCode::Insert),
            "up" => Some(KeyCode::Up),
            "down" => Some(KeyCode::Down),
            "left" => Some(KeyCode::Left),
            "right" => Some(KeyCode::Right),
            "pageup" | "pgup" => Some(KeyCode::PageUp),
            "pagedown" | "pgdn" => Some(KeyCode::PageDown),
            "home" => Some(KeyCode::Home),
            "end" => Some(KeyCode::End),
            _ => None,
        }
    }
}
