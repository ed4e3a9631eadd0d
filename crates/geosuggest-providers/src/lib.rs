//! Provider seam for the geosuggest resolution engine.
//!
//! Two kinds of backend feed the engine: a structured gazetteer (the primary
//! tier) and a commercial `findAddressCandidates`-style geocoder (the
//! secondary tier). Each speaks its own schema; the adapters in this crate
//! turn both into a [`RawRecord`] using the engine's internal field names
//! (`type`, `name`, `label`, `county`, `state`, `latitude`, `longitude`,
//! `latMin`, `lonMin`, `latMax`, `lonMax`, `score`, `source`). Validation of
//! those records happens in the engine, not here.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod error;
pub mod primary;
mod request;
pub mod secondary;
#[cfg(any(test, feature = "test_data"))]
pub mod test_data;

pub use error::{ProviderError, Result};
#[cfg(feature = "http")]
pub use primary::GazetteerClient;
pub use primary::parse_primary_response;
pub use request::{PrimaryRequest, SecondaryRequest};
#[cfg(feature = "http")]
pub use secondary::GeocoderClient;
pub use secondary::parse_secondary_response;

/// One provider record expressed in the internal field vocabulary.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Axis-aligned latitude/longitude box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub const WORLD: Self = Self {
        lat_min: -90.0,
        lon_min: -180.0,
        lat_max: 90.0,
        lon_max: 180.0,
    };

    #[must_use]
    pub const fn new(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lon_min,
            lat_max,
            lon_max,
        }
    }

    /// Box of `buffer` degrees on every side of a point.
    #[must_use]
    pub fn around(latitude: f64, longitude: f64, buffer: f64) -> Self {
        Self {
            lat_min: latitude - buffer,
            lon_min: longitude - buffer,
            lat_max: latitude + buffer,
            lon_max: longitude + buffer,
        }
    }

    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lon_min..=self.lon_max).contains(&longitude)
    }

    /// Corners are ordered and inside the world box.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.lat_min <= self.lat_max
            && self.lon_min <= self.lon_max
            && Self::WORLD.contains(self.lat_min, self.lon_min)
            && Self::WORLD.contains(self.lat_max, self.lon_max)
    }

    /// `lonMin,latMin,lonMax,latMax`, the order geocoders expect for a search extent.
    #[must_use]
    pub fn to_extent_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// The structured gazetteer answering suggestion queries first.
#[async_trait]
pub trait PrimaryProvider: Send + Sync {
    async fn suggest(&self, request: &PrimaryRequest) -> Result<Vec<RawRecord>>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "primary"
    }
}

/// The fallback geocoder, only consulted when the primary tier comes back empty or fails.
#[async_trait]
pub trait SecondaryProvider: Send + Sync {
    async fn find_candidates(&self, request: &SecondaryRequest) -> Result<Vec<RawRecord>>;

    fn name(&self) -> &str {
        "secondary"
    }
}
