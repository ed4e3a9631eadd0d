//! Validated suggestions and the sets they travel in.
mod feature;
mod validate;

use std::ops::Deref;

pub use feature::{Feature, FeatureCollection, Point};
use geosuggest_providers::{BoundingBox, RawRecord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
pub use validate::{BBOX_BUFFER_DEGREES, ValidationContext, validate, validate_all};

use crate::query::{Coordinate, round_to};

/// Provenance tag for candidates synthesized from coordinate input.
pub const COORDINATE_SOURCE: &str = "latlon";
/// Category for candidates synthesized from coordinate input.
pub const COORDINATE_TYPE: &str = "Coordinate";

/// One validated geographic point suggestion.
///
/// Only the validator builds these from provider data, so every instance
/// has passed the bounds, state and score checks in effect at the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Category, e.g. `Populated Place`, `Zip Code`, `PointAddress`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Display string.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// Upper-cased two-letter code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub bbox: BoundingBox,
    /// Match quality, 0 to 100.
    pub score: u8,
    /// Which backend and locator produced the record.
    pub source: String,
}

impl Candidate {
    /// Identity used to collapse duplicates across sources.
    #[must_use]
    pub fn identity(&self) -> (&str, &str, Option<&str>, Option<&str>) {
        (
            &self.kind,
            &self.name,
            self.county.as_deref(),
            self.state.as_deref(),
        )
    }

    #[must_use]
    pub fn to_feature(&self) -> Feature {
        Feature::from(self.clone())
    }
}

/// The raw record a parsed coordinate stands in for.
///
/// The point and the name are both rounded to `precision` places so the
/// label matches the validated coordinates.
#[must_use]
pub fn coordinate_record(coordinate: &Coordinate, precision: u32) -> RawRecord {
    let latitude = round_to(coordinate.latitude, precision);
    let longitude = round_to(coordinate.longitude, precision);
    let places = precision as usize;
    let name = format!("{latitude:.places$}, {longitude:.places$}");

    let mut record = RawRecord::new();
    record.insert("type".to_string(), Value::from(COORDINATE_TYPE));
    record.insert("name".to_string(), Value::from(name));
    record.insert("latitude".to_string(), Value::from(latitude));
    record.insert("longitude".to_string(), Value::from(longitude));
    record.insert("source".to_string(), Value::from(COORDINATE_SOURCE));
    record
}

/// An ordered list of candidates answering one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionSet(Vec<Candidate>);

impl SuggestionSet {
    #[must_use]
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self(candidates)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Candidate> {
        self.0
    }

    /// Keep the first candidate for each `(type, name, county, state)`.
    #[must_use]
    pub fn deduplicated(self) -> Self {
        let candidates = self
            .0
            .into_iter()
            .unique_by(|c| {
                let (kind, name, county, state) = c.identity();
                (
                    kind.to_owned(),
                    name.to_owned(),
                    county.map(str::to_owned),
                    state.map(str::to_owned),
                )
            })
            .collect();
        Self(candidates)
    }

    /// Stable sort by `(type, state, county)`, used for geocoder results.
    #[must_use]
    pub fn sorted_by_category(mut self) -> Self {
        self.0.sort_by(|a, b| {
            (&a.kind, &a.state, &a.county).cmp(&(&b.kind, &b.state, &b.county))
        });
        self
    }

    /// Candidates grouped by `type`, groups in order of first appearance.
    #[must_use]
    pub fn grouped_by_type(&self) -> Vec<(&str, Vec<&Candidate>)> {
        let mut groups: Vec<(&str, Vec<&Candidate>)> = Vec::new();
        for candidate in &self.0 {
            match groups.iter_mut().find(|(kind, _)| *kind == candidate.kind) {
                Some((_, members)) => members.push(candidate),
                None => groups.push((candidate.kind.as_str(), vec![candidate])),
            }
        }
        groups
    }

    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::from(self)
    }
}

impl Deref for SuggestionSet {
    type Target = [Candidate];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Candidate>> for SuggestionSet {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self(candidates)
    }
}

impl IntoIterator for SuggestionSet {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn candidate(kind: &str, name: &str, county: &str, state: &str) -> Candidate {
        Candidate {
            kind: kind.to_string(),
            name: name.to_string(),
            label: format!("{name}, {county}, {state}"),
            county: Some(county.to_string()),
            state: Some(state.to_string()),
            latitude: 30.0,
            longitude: -97.0,
            bbox: BoundingBox::around(30.0, -97.0, BBOX_BUFFER_DEGREES),
            score: 100,
            source: "gnis".to_string(),
        }
    }

    #[test]
    fn test_candidate_serializes_with_wire_names() {
        let json = serde_json::to_value(candidate("City", "Austin", "Travis", "TX")).unwrap();
        assert_eq!(json["type"], "City");
        assert!((json["latMin"].as_f64().unwrap() - 29.99).abs() < 1e-9);
        assert!((json["lonMax"].as_f64().unwrap() + 96.99).abs() < 1e-9);
        assert_eq!(json["score"], 100);
        assert!(json.get("kind").is_none());
        assert!(json.get("bbox").is_none());
    }

    #[test]
    fn test_candidate_without_optional_fields_omits_them() {
        let mut c = candidate("City", "Austin", "Travis", "TX");
        c.county = None;
        c.state = None;
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("county").is_none());
        assert!(json.get("state").is_none());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut second = candidate("City", "Austin", "Travis", "TX");
        second.source = "arcgis:World".to_string();
        let set = SuggestionSet::new(vec![
            candidate("City", "Austin", "Travis", "TX"),
            candidate("City", "Austin", "Mower", "MN"),
            second,
        ])
        .deduplicated();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].source, "gnis");
        assert_eq!(set[1].state.as_deref(), Some("MN"));
    }

    #[test]
    fn test_sort_by_type_state_county() {
        let set = SuggestionSet::new(vec![
            candidate("Zip", "78701", "Travis", "TX"),
            candidate("City", "Austin", "Travis", "TX"),
            candidate("City", "Austin", "Mower", "MN"),
            candidate("City", "Austin", "Lonoke", "AR"),
        ])
        .sorted_by_category();
        let order: Vec<_> = set
            .iter()
            .map(|c| (c.kind.as_str(), c.state.as_deref().unwrap_or("")))
            .collect();
        assert_eq!(
            order,
            vec![("City", "AR"), ("City", "MN"), ("City", "TX"), ("Zip", "TX")]
        );
    }

    #[test]
    fn test_grouped_by_type_preserves_first_appearance() {
        let set = SuggestionSet::new(vec![
            candidate("Zip", "78701", "Travis", "TX"),
            candidate("City", "Austin", "Travis", "TX"),
            candidate("Zip", "78702", "Travis", "TX"),
        ]);
        let groups = set.grouped_by_type();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Zip");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "City");
    }

    #[test]
    fn test_coordinate_record_shape() {
        let record = coordinate_record(
            &Coordinate {
                latitude: 44.964798,
                longitude: -93.240967,
            },
            6,
        );
        assert_eq!(record["source"], COORDINATE_SOURCE);
        assert_eq!(record["name"], "44.964798, -93.240967");
    }

    #[test]
    fn test_coordinate_record_name_follows_precision() {
        let record = coordinate_record(
            &Coordinate {
                latitude: 44.964798,
                longitude: -93.240967,
            },
            4,
        );
        assert_eq!(record["name"], "44.9648, -93.2410");
        assert_eq!(record["latitude"], 44.9648);
        assert_eq!(record["longitude"], -93.241);
    }
}
