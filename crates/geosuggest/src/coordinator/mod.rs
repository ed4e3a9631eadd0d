//! Decides how one query is answered.
//!
//! A cycle first looks for an answer that needs no backend (short term,
//! coordinate, cached key, cached-empty prefix) and only then walks the
//! provider chain. Cancellation and commit live in the engine; everything
//! here is a function of its inputs.
mod fetch;

use std::fmt;

pub(crate) use fetch::Backends;
use serde::Serialize;
use tracing::debug;

use crate::cache::SuggestionCache;
use crate::candidate::{SuggestionSet, ValidationContext, coordinate_record, validate};
use crate::config::SuggestConfig;
use crate::query::QueryDescriptor;

/// Where an engine is in its current resolution cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CoordinatorState {
    #[default]
    Idle,
    Debouncing,
    FetchingPrimary,
    FetchingSecondary,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Debouncing => "debouncing",
            Self::FetchingPrimary => "fetching-primary",
            Self::FetchingSecondary => "fetching-secondary",
        };
        f.write_str(name)
    }
}

/// The answer a cycle settles on, and whether it may be memoized.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub suggestions: SuggestionSet,
    pub cacheable: bool,
}

impl Resolution {
    pub(crate) fn answered(suggestions: SuggestionSet) -> Self {
        Self {
            suggestions,
            cacheable: true,
        }
    }

    /// Empty and never cached, so the next attempt goes back to the network.
    pub(crate) fn failed() -> Self {
        Self {
            suggestions: SuggestionSet::empty(),
            cacheable: false,
        }
    }
}

pub(crate) fn validation_context<'a>(
    query: &'a QueryDescriptor,
    config: &'a SuggestConfig,
) -> ValidationContext<'a> {
    ValidationContext {
        query,
        bounds: &config.bounds,
        min_score: config.min_score,
        precision: config.precision,
    }
}

/// Answer `query` without a backend when possible.
///
/// The returned resolution for a cache hit is marked not cacheable since it
/// is already stored.
pub(crate) fn local_answer(
    query: &QueryDescriptor,
    config: &SuggestConfig,
    cache: &SuggestionCache,
) -> Option<Resolution> {
    if query.term_len() < config.min_chars {
        debug!(term = %query.term, min_chars = config.min_chars, "Term too short");
        return Some(Resolution::failed());
    }

    if let Some(coordinate) = &query.coordinate {
        let record = coordinate_record(coordinate, config.precision);
        let candidates = validate(&record, &validation_context(query, config))
            .into_iter()
            .collect::<Vec<_>>();
        debug!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            accepted = !candidates.is_empty(),
            "Resolved coordinate input locally"
        );
        return Some(Resolution::answered(SuggestionSet::new(candidates)));
    }

    if let Some(cached) = cache.get(&query.cache_key) {
        debug!(key = %query.cache_key, count = cached.len(), "Cache hit");
        return Some(Resolution {
            suggestions: cached.clone(),
            cacheable: false,
        });
    }

    if let Some(prefix) = cache.empty_prefix_of(&query.term, &query.state_filter, config.min_chars)
    {
        debug!(
            key = %query.cache_key,
            prefix = %prefix,
            "Prefix already known to match nothing"
        );
        return Some(Resolution::answered(SuggestionSet::empty()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::tests::candidate;
    use crate::config::SuggestConfigBuilder;
    use crate::query::{StateSet, normalize};
    use geosuggest_providers::BoundingBox;

    #[test]
    fn test_short_term_is_empty_and_uncached() {
        let config = SuggestConfig::default();
        let query = normalize("au", &StateSet::All);
        let resolution = local_answer(&query, &config, &SuggestionCache::new()).unwrap();
        assert!(resolution.suggestions.is_empty());
        assert!(!resolution.cacheable);
    }

    #[test]
    fn test_coordinate_answered_locally() {
        let config = SuggestConfig::default();
        let query = normalize("44 57 53.2728 N 93 14 27.4812 W", &StateSet::All);
        let resolution = local_answer(&query, &config, &SuggestionCache::new()).unwrap();
        assert!(resolution.cacheable);
        let only = &resolution.suggestions[0];
        assert_eq!(only.source, "latlon");
        assert_eq!(only.kind, "Coordinate");
        assert_eq!(only.latitude, 44.964798);
        assert_eq!(only.longitude, -93.240967);
    }

    #[test]
    fn test_coordinate_with_state_code_answered_locally() {
        let config = SuggestConfigBuilder::new().precision(4).build().unwrap();
        let query = normalize("30.26721 -97.74312 tx", &StateSet::All);
        let resolution = local_answer(&query, &config, &SuggestionCache::new()).unwrap();
        let only = &resolution.suggestions[0];
        assert_eq!(only.kind, "Coordinate");
        assert_eq!(only.name, "30.2672, -97.7431");
        assert_eq!(only.latitude, 30.2672);
        assert_eq!(only.longitude, -97.7431);
    }

    #[test]
    fn test_coordinate_outside_bounds_is_empty() {
        let config = SuggestConfigBuilder::new()
            .bounds(BoundingBox::new(24.0, -125.0, 40.0, -66.0))
            .build()
            .unwrap();
        let query = normalize("44.5 -93.2", &StateSet::All);
        let resolution = local_answer(&query, &config, &SuggestionCache::new()).unwrap();
        assert!(resolution.suggestions.is_empty());
    }

    #[test]
    fn test_cache_hit() {
        let config = SuggestConfig::default();
        let query = normalize("austin", &StateSet::All);
        let mut cache = SuggestionCache::new();
        cache.set(
            query.cache_key.clone(),
            SuggestionSet::new(vec![candidate("City", "Austin", "Travis", "TX")]),
        );
        let resolution = local_answer(&query, &config, &cache).unwrap();
        assert_eq!(resolution.suggestions.len(), 1);
        assert!(!resolution.cacheable);
    }

    #[test]
    fn test_negative_prefix_short_circuit() {
        let config = SuggestConfig::default();
        let mut cache = SuggestionCache::new();
        cache.set("AUSTI|ALL", SuggestionSet::empty());

        let query = normalize("austin", &StateSet::All);
        let resolution = local_answer(&query, &config, &cache).unwrap();
        assert!(resolution.suggestions.is_empty());
        assert!(resolution.cacheable);

        let query = normalize("austin tx", &StateSet::All);
        assert!(local_answer(&query, &config, &cache).is_none());
    }

    #[test]
    fn test_unknown_term_needs_backend() {
        let config = SuggestConfig::default();
        let query = normalize("round rock", &StateSet::All);
        assert!(local_answer(&query, &config, &SuggestionCache::new()).is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CoordinatorState::FetchingSecondary.to_string(), "fetching-secondary");
        assert_eq!(CoordinatorState::default(), CoordinatorState::Idle);
    }
}
