use geosuggest_providers::{
    PrimaryProvider, PrimaryRequest, SecondaryProvider, SecondaryRequest,
};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use super::{CoordinatorState, Resolution, validation_context};
use crate::candidate::{SuggestionSet, validate_all};
use crate::config::SuggestConfig;
use crate::query::QueryDescriptor;

/// The providers one cycle may consult.
#[derive(Clone, Copy)]
pub(crate) struct Backends<'a> {
    pub primary: &'a dyn PrimaryProvider,
    /// `None` when the engine has no geocoder or the config disables it.
    pub secondary: Option<&'a dyn SecondaryProvider>,
}

fn primary_request(query: &QueryDescriptor, config: &SuggestConfig) -> PrimaryRequest {
    PrimaryRequest {
        term: query.term.clone(),
        states: query.state_filter.to_param(),
        bounds: config.bounds,
        include: config.include.clone(),
        max_suggestions: config.max_suggestions,
    }
}

fn secondary_request(query: &QueryDescriptor, config: &SuggestConfig) -> SecondaryRequest {
    SecondaryRequest {
        single_line: query.term.clone(),
        source_country: config.source_country.clone(),
        extent: config.bounds,
        categories: config.categories.clone(),
        max_locations: config.max_suggestions,
        out_fields: config.out_fields.clone(),
    }
}

impl Backends<'_> {
    /// Run the primary and, if needed, the secondary tier under one deadline.
    ///
    /// `on_phase` is told when the chain moves to a new tier.
    pub(crate) async fn fetch(
        self,
        query: &QueryDescriptor,
        config: &SuggestConfig,
        on_phase: &(dyn Fn(CoordinatorState) + Sync),
    ) -> Resolution {
        let deadline = Instant::now() + config.timeout;
        let ctx = validation_context(query, config);

        on_phase(CoordinatorState::FetchingPrimary);
        let request = primary_request(query, config);
        match timeout_at(deadline, self.primary.suggest(&request)).await {
            Err(_) => {
                warn!(
                    provider = self.primary.name(),
                    term = %query.term,
                    timeout = ?config.timeout,
                    "Primary provider timed out"
                );
                return Resolution::failed();
            }
            Ok(Ok(records)) => {
                let valid = validate_all(&records, &ctx);
                debug!(
                    provider = self.primary.name(),
                    received = records.len(),
                    valid = valid.len(),
                    "Primary provider answered"
                );
                if !valid.is_empty() || self.secondary.is_none() {
                    return Resolution::answered(SuggestionSet::new(valid));
                }
            }
            Ok(Err(e)) => {
                warn!(provider = self.primary.name(), error = %e, "Primary provider failed");
                if self.secondary.is_none() {
                    return Resolution::failed();
                }
            }
        }

        let Some(secondary) = self.secondary else {
            return Resolution::failed();
        };
        on_phase(CoordinatorState::FetchingSecondary);
        let request = secondary_request(query, config);
        match timeout_at(deadline, secondary.find_candidates(&request)).await {
            Err(_) => {
                warn!(
                    provider = secondary.name(),
                    term = %query.term,
                    timeout = ?config.timeout,
                    "Secondary provider timed out"
                );
                Resolution::failed()
            }
            Ok(Ok(records)) => {
                let suggestions = SuggestionSet::new(validate_all(&records, &ctx))
                    .deduplicated()
                    .sorted_by_category();
                debug!(
                    provider = secondary.name(),
                    received = records.len(),
                    kept = suggestions.len(),
                    "Secondary provider answered"
                );
                Resolution::answered(suggestions)
            }
            Ok(Err(e)) => {
                warn!(provider = secondary.name(), error = %e, "Secondary provider failed");
                Resolution::failed()
            }
        }
    }
}
