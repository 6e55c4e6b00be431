//! In-memory set of decided content keys.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::scanner::ContentKey;

/// A reviewer's verdict on one piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Content was whitelisted and lives in the gallery.
    Accepted,
    /// Content was blacklisted and deleted.
    Rejected,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Accepted => write!(f, "accepted"),
            Decision::Rejected => write!(f, "rejected"),
        }
    }
}

/// Set of content keys. Iteration is in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionSet {
    keys: BTreeSet<ContentKey>,
}

impl DecisionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key is in the set.
    #[must_use]
    pub fn contains(&self, key: &ContentKey) -> bool {
        self.keys.contains(key)
    }

    /// Insert a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: ContentKey) -> bool {
        self.keys.insert(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentKey> {
        self.keys.iter()
    }
}

impl FromIterator<ContentKey> for DecisionSet {
    fn from_iter<I: IntoIterator<Item = ContentKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl Extend<ContentKey> for DecisionSet {
    fn extend<I: IntoIterator<Item = ContentKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}
