//! Per-engine memo of finished lookups.
//!
//! Keys come from [`crate::query::cache_key`], so the same term under a
//! different state filter is a different entry. An empty set is stored like
//! any other answer and doubles as a negative entry for longer terms.
use ahash::AHashMap;
use tracing::trace;

use crate::candidate::SuggestionSet;
use crate::query::{StateFilter, cache_key};

#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: AHashMap<String, SuggestionSet>,
}

impl SuggestionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SuggestionSet> {
        self.entries.get(key)
    }

    /// Store the answer for `key`; a later answer replaces an earlier one.
    pub fn set(&mut self, key: impl Into<String>, suggestions: SuggestionSet) {
        let key = key.into();
        trace!(key = %key, count = suggestions.len(), "Caching suggestions");
        self.entries.insert(key, suggestions);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is cached with no suggestions.
    #[must_use]
    pub fn is_known_empty(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|set| set.is_empty())
    }

    /// The longest strict prefix of `term` (at least `min_chars` long) that is
    /// cached empty under the same state filter.
    ///
    /// Gazetteer matching is prefix based, so nothing can match a term whose
    /// prefix already matched nothing.
    #[must_use]
    pub fn empty_prefix_of(
        &self,
        term: &str,
        state_filter: &StateFilter,
        min_chars: usize,
    ) -> Option<String> {
        let chars: Vec<char> = term.chars().collect();
        let floor = min_chars.max(1);
        (floor..chars.len())
            .rev()
            .map(|len| chars[..len].iter().collect::<String>())
            .find(|prefix| self.is_known_empty(&cache_key(prefix, state_filter)))
    }
}
