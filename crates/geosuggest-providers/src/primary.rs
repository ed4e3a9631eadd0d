//! Gazetteer (primary tier) adapter.
//!
//! The gazetteer already answers in the internal field vocabulary, so the
//! adapter mostly checks the envelope: a JSON array of property objects on
//! success, or `{"error": "..."}` when the service handled a failure itself.
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ProviderError, RawRecord, Result};

/// Turn a gazetteer response body into records.
pub fn parse_primary_response(body: Value) -> Result<Vec<RawRecord>> {
    match body {
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<RawRecord> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    other => {
                        warn!(item = %other, "Skipping non-object gazetteer record");
                        None
                    }
                })
                .collect();
            debug!(total, kept = records.len(), "Parsed gazetteer response");
            Ok(records)
        }
        Value::Object(map) => match map.get("error") {
            Some(Value::String(message)) => Err(ProviderError::Service(message.clone())),
            Some(other) => Err(ProviderError::Service(other.to_string())),
            None => Err(ProviderError::MalformedResponse(
                "expected an array of candidates".to_string(),
            )),
        },
        other => Err(ProviderError::MalformedResponse(format!(
            "expected an array of candidates, got {other}"
        ))),
    }
}

#[cfg(feature = "http")]
pub use client::GazetteerClient;

#[cfg(feature = "http")]
mod client {
    use async_trait::async_trait;
    use reqwest::Client;
    use tracing::{debug, instrument};

    use super::parse_primary_response;
    use crate::{PrimaryProvider, PrimaryRequest, RawRecord, Result};

    /// HTTP client for the gazetteer suggestion endpoint.
    #[derive(Debug, Clone)]
    pub struct GazetteerClient {
        client: Client,
        base_url: String,
    }

    impl GazetteerClient {
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
    impl PrimaryProvider for GazetteerClient {
        #[instrument(name = "Gazetteer suggest", level = "debug", skip_all, fields(term = %request.term))]
        async fn suggest(&self, request: &PrimaryRequest) -> Result<Vec<RawRecord>> {
            debug!(url = %self.base_url, "Requesting gazetteer suggestions");
            let body = self
                .client
                .get(&self.base_url)
                .query(&request.query_pairs())
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            parse_primary_response(body)
        }

        fn name(&self) -> &str {
            "gazetteer"
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_array_of_records() {
        let body = json!([
            {"type": "Populated Place", "name": "Austin", "state": "TX", "latitude": 30.27, "longitude": -97.74, "source": "gnis"},
            {"type": "Zip Code", "name": "78701", "state": "TX", "latitude": 30.27, "longitude": -97.74, "source": "zip"}
        ]);
        let records = parse_primary_response(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Austin");
    }

    #[test]
    fn test_empty_array_is_success() {
        let records = parse_primary_response(json!([])).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_non_object_items_are_skipped() {
        let records = parse_primary_response(json!([1, "x", {"name": "Austin"}])).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_declared_error() {
        let err = parse_primary_response(json!({"error": "database unavailable"})).unwrap_err();
        assert!(matches!(err, ProviderError::Service(ref m) if m == "database unavailable"));
    }

    #[test]
    fn test_unexpected_shapes_are_malformed() {
        assert!(matches!(
            parse_primary_response(json!({"results": []})),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_primary_response(json!("nope")),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_primary_response(Value::Null),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
