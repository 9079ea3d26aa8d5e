use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Split `text` into normalized words.
///
/// A word is a maximal run of letters and digits; any other code point is a
/// separator. Each run is lowercased. Empty runs are skipped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|run| !run.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Cumulative word-frequency counts scoped to one conversation.
///
/// Counts are monotonically non-decreasing for the lifetime of the scope:
/// ingestion only ever increments. Replaying the same chunk double-counts,
/// which is the documented at-least-once trade-off of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordCounts(HashMap<String, u64>);

impl WordCounts {
    /// Create an empty count map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `text` and accumulate each word into the counts.
    pub fn ingest(&mut self, text: &str) {
        for word in tokenize(text) {
            *self.0.entry(word).or_insert(0) += 1;
        }
    }

    /// The count for `word`, zero if the word was never seen.
    #[must_use]
    pub fn count(&self, word: &str) -> u64 {
        self.0.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no words have been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u64)> for WordCounts {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a WordCounts {
    type Item = (&'a String, &'a u64);
    type IntoIter = std::collections::hash_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
