//! Geocoder (secondary tier) adapter.
//!
//! Maps `findAddressCandidates` output onto the internal field names:
//!
//! | geocoder | internal |
//! |---|---|
//! | `Type` (then `Addr_type`, then `"Address"`) | `type` |
//! | `ShortLabel` (then candidate `address`) | `name` |
//! | `Match_addr` | `label` |
//! | `Subregion` | `county` |
//! | `RegionAbbr` | `state` |
//! | `Y` / `X` | `latitude` / `longitude` |
//! | `Ymin` `Xmin` `Ymax` `Xmax` | `latMin` `lonMin` `latMax` `lonMax` |
//! | `Score` (then candidate `score`) | `score` |
//! | `Loc_name` | `source`, prefixed with [`SOURCE_PREFIX`] |
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{ProviderError, RawRecord, Result};

pub const SOURCE_PREFIX: &str = "arcgis";
pub const DEFAULT_CATEGORY: &str = "Address";

/// Attributes requested through `outFields`.
pub const DEFAULT_OUT_FIELDS: [&str; 14] = [
    "Type",
    "Addr_type",
    "Match_addr",
    "ShortLabel",
    "Subregion",
    "RegionAbbr",
    "X",
    "Y",
    "Xmin",
    "Xmax",
    "Ymin",
    "Ymax",
    "Score",
    "Loc_name",
];

/// Address and place categories the geocoder is allowed to return.
pub const DEFAULT_CATEGORIES: [&str; 4] =
    ["Address", "Postal", "Populated Place", "Point of Interest"];

#[derive(Debug, Deserialize)]
struct FindCandidatesResponse {
    #[serde(default)]
    candidates: Option<Vec<GeocodeCandidate>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

/// `Some` only for present, non-blank values.
fn attribute<'a>(attributes: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    attributes.get(key).filter(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

impl GeocodeCandidate {
    fn into_record(self) -> RawRecord {
        let attrs = &self.attributes;
        let mut record = RawRecord::new();

        let kind = attribute(attrs, "Type")
            .or_else(|| attribute(attrs, "Addr_type"))
            .cloned()
            .unwrap_or_else(|| Value::String(DEFAULT_CATEGORY.to_string()));
        record.insert("type".to_string(), kind);

        if let Some(name) = attribute(attrs, "ShortLabel")
            .cloned()
            .or_else(|| self.address.clone().map(Value::String))
        {
            record.insert("name".to_string(), name);
        }

        let copies = [
            ("Match_addr", "label"),
            ("Subregion", "county"),
            ("RegionAbbr", "state"),
            ("Y", "latitude"),
            ("X", "longitude"),
            ("Ymin", "latMin"),
            ("Xmin", "lonMin"),
            ("Ymax", "latMax"),
            ("Xmax", "lonMax"),
        ];
        for (from, to) in copies {
            if let Some(value) = attribute(attrs, from) {
                record.insert(to.to_string(), value.clone());
            }
        }

        if let Some(score) = attribute(attrs, "Score")
            .cloned()
            .or_else(|| self.score.map(Value::from))
        {
            record.insert("score".to_string(), score);
        }

        if let Some(Value::String(locator)) = attribute(attrs, "Loc_name") {
            record.insert(
                "source".to_string(),
                Value::String(format!("{SOURCE_PREFIX}:{locator}")),
            );
        }

        record
    }
}

/// Turn a geocoder response body into records in the internal vocabulary.
///
/// A missing or empty `candidates` array is "no suggestions", not an error.
pub fn parse_secondary_response(body: Value) -> Result<Vec<RawRecord>> {
    if !body.is_object() {
        return Err(ProviderError::MalformedResponse(format!(
            "expected a JSON object, got {body}"
        )));
    }
    let response: FindCandidatesResponse = serde_json::from_value(body)?;
    if let Some(error) = response.error {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), ToString::to_string);
        return Err(ProviderError::Service(message));
    }
    let records: Vec<RawRecord> = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .map(GeocodeCandidate::into_record)
        .collect();
    debug!(count = records.len(), "Parsed geocoder response");
    Ok(records)
}

#[cfg(feature = "http")]
pub use client::GeocoderClient;

#[cfg(feature = "http")]
mod client {
    use async_trait::async_trait;
    use reqwest::Client;
    use tracing::{debug, instrument};

    use super::parse_secondary_response;
    use crate::{RawRecord, Result, SecondaryProvider, SecondaryRequest};

    /// HTTP client for a `findAddressCandidates` endpoint.
    #[derive(Debug, Clone)]
    pub struct GeocoderClient {
        client: Client,
        base_url: String,
    }

    impl GeocoderClient {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self::with_client(Client::new(), base_url)
        }

        pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
            Self {
                client,
                base_url: base_url.into(),
            }
        }

        #[must_use]
        pub fn base_url(&self) -> &str {
            &self.base_url
        }
    }

    #[async_trait]
    impl SecondaryProvider for GeocoderClient {
        #[instrument(name = "Geocoder find candidates", level = "debug", skip_all, fields(term = %request.single_line))]
        async fn find_candidates(&self, request: &SecondaryRequest) -> Result<Vec<RawRecord>> {
            debug!(url = %self.base_url, "Requesting geocoder candidates");
            let body = self
                .client
                .get(&self.base_url)
                .query(&request.query_pairs())
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            parse_secondary_response(body)
        }

        fn name(&self) -> &str {
            "geocoder"
        }
    }
}
