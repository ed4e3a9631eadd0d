use itertools::Itertools;

use crate::BoundingBox;

/// Query sent to the gazetteer.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRequest {
    pub term: String,
    /// Two-letter codes; `None` leaves the `states` parameter off entirely.
    pub states: Option<Vec<String>>,
    pub bounds: BoundingBox,
    /// Category tokens forwarded as `include`.
    pub include: Vec<String>,
    pub max_suggestions: usize,
}

impl PrimaryRequest {
    /// Query string parameters in the order the gazetteer documents them.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("term", self.term.clone())];
        if let Some(states) = &self.states {
            pairs.push(("states", states.iter().join(",")));
        }
        pairs.extend([
            ("latitudeMin", self.bounds.lat_min.to_string()),
            ("latitudeMax", self.bounds.lat_max.to_string()),
            ("longitudeMin", self.bounds.lon_min.to_string()),
            ("longitudeMax", self.bounds.lon_max.to_string()),
        ]);
        if !self.include.is_empty() {
            pairs.push(("include", self.include.iter().join(",")));
        }
        pairs.push(("maxSuggestions", self.max_suggestions.to_string()));
        pairs
    }
}

/// Query sent to the `findAddressCandidates` geocoder.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryRequest {
    pub single_line: String,
    pub source_country: String,
    pub extent: BoundingBox,
    /// Allow-list of address and place categories.
    pub categories: Vec<String>,
    pub max_locations: usize,
    pub out_fields: Vec<String>,
}

impl SecondaryRequest {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("f", "json".to_string()),
            ("singleLine", self.single_line.clone()),
            ("sourceCountry", self.source_country.clone()),
            ("searchExtent", self.extent.to_extent_param()),
            ("category", self.categories.iter().join(",")),
            ("maxLocations", self.max_locations.to_string()),
            ("outFields", self.out_fields.iter().join(",")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_primary_pairs_omit_states_when_unfiltered() {
        let request = PrimaryRequest {
            term: "AUSTIN".to_string(),
            states: None,
            bounds: BoundingBox::WORLD,
            include: vec![],
            max_suggestions: 10,
        };
        let pairs = request.query_pairs();
        assert_eq!(lookup(&pairs, "term"), Some("AUSTIN"));
        assert_eq!(lookup(&pairs, "states"), None);
        assert_eq!(lookup(&pairs, "include"), None);
        assert_eq!(lookup(&pairs, "latitudeMin"), Some("-90"));
        assert_eq!(lookup(&pairs, "maxSuggestions"), Some("10"));
    }

    #[test]
    fn test_primary_pairs_with_states_and_include() {
        let request = PrimaryRequest {
            term: "SPRINGFIELD".to_string(),
            states: Some(vec!["IL".to_string(), "MO".to_string()]),
            bounds: BoundingBox::WORLD,
            include: vec!["gnis".to_string(), "zipcode".to_string()],
            max_suggestions: 5,
        };
        let pairs = request.query_pairs();
        assert_eq!(lookup(&pairs, "states"), Some("IL,MO"));
        assert_eq!(lookup(&pairs, "include"), Some("gnis,zipcode"));
    }

    #[test]
    fn test_secondary_pairs() {
        let request = SecondaryRequest {
            single_line: "AUSTIN".to_string(),
            source_country: "USA".to_string(),
            extent: BoundingBox::new(24.0, -125.0, 50.0, -66.0),
            categories: vec!["Address".to_string(), "Postal".to_string()],
            max_locations: 8,
            out_fields: vec!["Type".to_string(), "Score".to_string()],
        };
        let pairs = request.query_pairs();
        assert_eq!(lookup(&pairs, "f"), Some("json"));
        assert_eq!(lookup(&pairs, "searchExtent"), Some("-125,24,-66,50"));
        assert_eq!(lookup(&pairs, "category"), Some("Address,Postal"));
        assert_eq!(lookup(&pairs, "outFields"), Some("Type,Score"));
    }
}
