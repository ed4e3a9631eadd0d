//! Turning raw control text into a structured query.
//!
//! Normalization upper-cases the input, blanks out everything except
//! `A-Z 0-9 * - .`, collapses whitespace and expands a leading `ST` to
//! `SAINT`. A trailing token naming a state in the active state set becomes
//! the query's state filter. The descriptor also carries the parsed
//! coordinate (if the text is one) and the cache key.
mod coordinate;
mod states;

pub use coordinate::{COORDINATE_PRECISION, Coordinate, parse_coordinate};
pub(crate) use coordinate::round_to;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
pub use states::{StateFilter, StateSet, is_known_code};
use tracing::trace;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Z0-9*\-.]+").expect("static pattern is valid"));

/// Everything the coordinator needs to know about one input.
///
/// Rebuilt from scratch on every input change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    pub term: String,
    pub state_filter: StateFilter,
    pub coordinate: Option<Coordinate>,
    pub cache_key: String,
}

impl QueryDescriptor {
    /// Number of characters in the normalized term.
    #[must_use]
    pub fn term_len(&self) -> usize {
        self.term.chars().count()
    }
}

/// `term|ALL` or `term|CSV-of-sorted-codes`.
#[must_use]
pub fn cache_key(term: &str, state_filter: &StateFilter) -> String {
    format!("{term}|{state_filter}")
}

/// Upper-case, scrub, collapse and expand `ST`, returning the tokens.
fn tokenize(raw: &str) -> Vec<String> {
    let upper = raw.to_uppercase();
    let scrubbed = DISALLOWED.replace_all(&upper, " ");
    let mut tokens: Vec<String> = scrubbed.split_whitespace().map(str::to_owned).collect();
    if tokens.len() > 1 && tokens[0] == "ST" {
        tokens[0] = "SAINT".to_string();
    }
    tokens
}

/// Build the query descriptor for `raw` under the configured state set.
#[must_use]
pub fn normalize(raw: &str, states: &StateSet) -> QueryDescriptor {
    let mut tokens = tokenize(raw);

    // No hemisphere letter is a state code.
    let active = states.codes();
    let trailing_state =
        tokens.len() > 1 && tokens.last().is_some_and(|last| active.contains(last));
    let state_filter = if trailing_state {
        StateFilter::single(tokens.pop().unwrap_or_default())
    } else {
        StateFilter::from(states)
    };
    let coordinate = parse_coordinate(&tokens);

    let term = tokens.join(" ");
    let cache_key = match &coordinate {
        Some(c) => cache_key(&c.display_name(), &state_filter),
        None => cache_key(&term, &state_filter),
    };
    trace!(raw, term = %term, state_filter = %state_filter, "Normalized query");

    QueryDescriptor {
        term,
        state_filter,
        coordinate,
        cache_key,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_uppercases_and_scrubs() {
        let q = normalize("  san   antonio,  (bexar)! ", &StateSet::All);
        assert_eq!(q.term, "SAN ANTONIO BEXAR");
        assert_eq!(q.state_filter, StateFilter::All);
        assert_eq!(q.cache_key, "SAN ANTONIO BEXAR|ALL");
    }

    #[test]
    fn test_keeps_allowed_punctuation() {
        let q = normalize("wilkes-barre pa*", &StateSet::Lower48);
        assert_eq!(q.term, "WILKES-BARRE PA*");
    }

    #[test]
    fn test_expands_leading_st() {
        assert_eq!(normalize("st paul", &StateSet::All).term, "SAINT PAUL");
        assert_eq!(normalize("St. Louis", &StateSet::All).term, "ST. LOUIS");
        assert_eq!(normalize("east st louis", &StateSet::All).term, "EAST ST LOUIS");
        assert_eq!(normalize("st", &StateSet::All).term, "ST");
    }

    #[test]
    fn test_trailing_state_is_extracted() {
        let q = normalize("austin tx", &StateSet::All);
        assert_eq!(q.term, "AUSTIN");
        assert_eq!(q.state_filter, StateFilter::single("TX"));
        assert_eq!(q.cache_key, "AUSTIN|TX");
    }

    #[test]
    fn test_trailing_state_outside_active_set_stays_in_term() {
        let q = normalize("anchorage ak", &StateSet::Lower48);
        assert_eq!(q.term, "ANCHORAGE AK");
        assert!(matches!(q.state_filter, StateFilter::Only(ref codes) if codes.len() == 49));
    }

    #[test]
    fn test_explicit_code_list() {
        let states = StateSet::Codes(BTreeSet::from(["OK".to_string(), "TX".to_string()]));
        let q = normalize("paris", &states);
        assert_eq!(q.cache_key, "PARIS|OK,TX");
        let q = normalize("paris tx", &states);
        assert_eq!(q.cache_key, "PARIS|TX");
    }

    #[test]
    fn test_lone_state_code_is_a_term() {
        let q = normalize("tx", &StateSet::All);
        assert_eq!(q.term, "TX");
        assert_eq!(q.state_filter, StateFilter::All);
    }

    #[test]
    fn test_coordinate_detected() {
        let q = normalize("44°57'53.2728\" N 93°14'27.4812\" W", &StateSet::All);
        let c = q.coordinate.unwrap();
        assert_eq!(c.latitude, 44.964798);
        assert_eq!(c.longitude, -93.240967);
        assert_eq!(q.cache_key, "44.964798, -93.240967|ALL");
    }

    #[test]
    fn test_coordinate_followed_by_state_code() {
        let q = normalize("30.2672 -97.7431 tx", &StateSet::All);
        assert_eq!(q.term, "30.2672 -97.7431");
        assert_eq!(q.state_filter, StateFilter::single("TX"));
        let c = q.coordinate.unwrap();
        assert_eq!(c.latitude, 30.2672);
        assert_eq!(c.longitude, -97.7431);
        assert_eq!(q.cache_key, "30.267200, -97.743100|TX");
    }

    #[test]
    fn test_hemisphere_coordinate_keeps_all_states() {
        let q = normalize("30.2672 N 97.7431 W", &StateSet::All);
        assert_eq!(q.state_filter, StateFilter::All);
        assert_eq!(q.coordinate.unwrap().longitude, -97.7431);
    }

    #[test]
    fn test_plain_text_has_no_coordinate() {
        assert!(normalize("round rock", &StateSet::All).coordinate.is_none());
    }

    #[test]
    fn test_empty_input() {
        let q = normalize("   ,,, ", &StateSet::All);
        assert_eq!(q.term, "");
        assert_eq!(q.term_len(), 0);
        assert_eq!(q.cache_key, "|ALL");
    }
}
