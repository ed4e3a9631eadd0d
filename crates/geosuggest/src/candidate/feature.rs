//! GeoJSON shapes handed to the UI layer.
use serde::{Deserialize, Serialize};

use super::{Candidate, SuggestionSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct Point {
    /// `[longitude, latitude]`, GeoJSON order.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Point,
    pub properties: Candidate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl From<Candidate> for Feature {
    fn from(candidate: Candidate) -> Self {
        Self {
            geometry: Point {
                coordinates: [candidate.longitude, candidate.latitude],
            },
            properties: candidate,
        }
    }
}

impl From<&SuggestionSet> for FeatureCollection {
    fn from(set: &SuggestionSet) -> Self {
        Self {
            features: set.iter().cloned().map(Feature::from).collect(),
        }
    }
}

impl FeatureCollection {
    /// Compact JSON text, also used to tell whether shown content changed.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::candidate::tests::candidate;

    #[test]
    fn test_feature_collection_shape() {
        let set = SuggestionSet::new(vec![candidate("City", "Austin", "Travis", "TX")]);
        let value = serde_json::to_value(set.to_feature_collection()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        let feature = &value["features"][0];
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"], json!({"type": "Point", "coordinates": [-97.0, 30.0]}));
        assert_eq!(feature["properties"]["name"], "Austin");
        assert_eq!(feature["properties"]["type"], "City");
    }

    #[test]
    fn test_empty_collection() {
        let collection = SuggestionSet::empty().to_feature_collection();
        assert_eq!(
            collection.to_json_string(),
            r#"{"type":"FeatureCollection","features":[]}"#
        );
    }

    #[test]
    fn test_feature_deserializes_back() {
        let feature = candidate("City", "Austin", "Travis", "TX").to_feature();
        let text = serde_json::to_string(&feature).unwrap();
        let parsed: Feature = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.properties.name, "Austin");
        assert_eq!(parsed.geometry.coordinates, [-97.0, 30.0]);
    }
}
