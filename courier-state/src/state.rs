//! The in-memory sent-state: a set of identifiers that remembers insertion order.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::{Result, StateError};

/// Identifiers that have received a successful delivery in this or a prior run.
///
/// Membership is what matters; the order identifiers were first inserted is
/// kept only so that a persisted file is rewritten in the order it was read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SentState {
    order: Vec<String>,
    members: AHashSet<String>,
}

impl SentState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the one-identifier-per-line text format.
    ///
    /// Lines are trimmed; blank lines and repeated identifiers are skipped.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        contents.lines().map(str::trim).collect()
    }

    /// Render the one-identifier-per-line text format, with a trailing newline
    /// after every identifier.
    #[must_use]
    pub fn render(&self) -> String {
        self.order.iter().fold(String::new(), |mut out, id| {
            out.push_str(id);
            out.push('\n');
            out
        })
    }

    /// Insert an identifier, returning `true` when it was not already present.
    pub fn insert(&mut self, identifier: impl Into<String>) -> bool {
        let identifier = identifier.into();
        if identifier.is_empty() || self.members.contains(&identifier) {
            return false;
        }

        self.members.insert(identifier.clone());
        self.order.push(identifier);
        true
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.members.contains(identifier)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// A new state holding every identifier of `self` followed by the ones
    /// from `other` that were not already present.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.extend(other.iter().map(str::to_string));
        merged
    }

    /// Check that every identifier can be written one per line.
    ///
    /// # Errors
    /// Returns [`StateError::InvalidIdentifier`] for the first identifier that
    /// contains a line break.
    pub fn validate(&self) -> Result<()> {
        self.iter()
            .find(|id| id.contains(['\n', '\r']))
            .map_or(Ok(()), |id| {
                Err(StateError::InvalidIdentifier(id.to_string()))
            })
    }
}

impl<S: Into<String>> FromIterator<S> for SentState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut state = Self::new();
        state.extend(iter);
        state
    }
}

impl<S: Into<String>> Extend<S> for SentState {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for identifier in iter {
            self.insert(identifier);
        }
    }
}

impl From<Vec<String>> for SentState {
    fn from(identifiers: Vec<String>) -> Self {
        identifiers.into_iter().collect()
    }
}

impl From<SentState> for Vec<String> {
    fn from(state: SentState) -> Self {
        state.order
    }
}
