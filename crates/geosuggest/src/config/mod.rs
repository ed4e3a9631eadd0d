use std::time::Duration;

use geosuggest_providers::BoundingBox;
use geosuggest_providers::secondary::{DEFAULT_CATEGORIES, DEFAULT_OUT_FIELDS};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, SuggestError};
use crate::query::{COORDINATE_PRECISION, StateSet};

/// Largest accepted coordinate precision.
pub const MAX_PRECISION: u32 = 10;

/// Options for one resolution engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestConfig {
    /// Shortest normalized term that is sent to a backend.
    pub min_chars: usize,
    /// Quiet interval after the last keystroke.
    pub debounce: Duration,
    /// Ceiling for the whole primary plus secondary chain.
    pub timeout: Duration,
    pub max_suggestions: usize,
    pub states: StateSet,
    /// Gazetteer result types to request, empty meaning all.
    pub include: Vec<String>,
    /// Area every candidate must fall inside.
    pub bounds: BoundingBox,
    pub min_score: f64,
    /// Decimal places kept on coordinates.
    pub precision: u32,
    /// Consult the geocoder when the gazetteer has nothing.
    pub use_secondary: bool,
    pub categories: Vec<String>,
    pub source_country: String,
    pub out_fields: Vec<String>,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            min_chars: 3,
            debounce: Duration::from_millis(250),
            timeout: Duration::from_millis(7000),
            max_suggestions: 10,
            states: StateSet::All,
            include: Vec::new(),
            bounds: BoundingBox::WORLD,
            min_score: 0.0,
            precision: COORDINATE_PRECISION,
            use_secondary: true,
            categories: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
            source_country: "USA".to_string(),
            out_fields: DEFAULT_OUT_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }
}

fn as_millis(value: &Value) -> Option<Duration> {
    value.as_u64().map(Duration::from_millis)
}

fn as_count(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|v| usize::try_from(v).ok())
}

/// A list given either as a JSON array of strings or as one comma separated string.
fn as_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::String(s) => s.split(',').map(|item| item.trim().to_string()).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    Some(items.into_iter().filter(|item| !item.is_empty()).collect())
}

fn as_states(value: &Value) -> Option<StateSet> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        Value::Array(_) => as_list(value)
            .map(StateSet::from_codes)
            .filter(|set| !matches!(set, StateSet::Codes(codes) if codes.is_empty())),
        _ => None,
    }
}

fn as_bounds(value: &Value) -> Option<BoundingBox> {
    let corners: Vec<f64> = value
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect::<Option<_>>()?;
    match corners.as_slice() {
        &[lat_min, lon_min, lat_max, lon_max] => {
            Some(BoundingBox::new(lat_min, lon_min, lat_max, lon_max))
                .filter(BoundingBox::is_well_formed)
        }
        _ => None,
    }
}

fn set<T>(slot: &mut T, value: Option<T>) -> bool {
    let Some(value) = value else {
        return false;
    };
    *slot = value;
    true
}

impl SuggestConfig {
    pub fn builder() -> SuggestConfigBuilder {
        SuggestConfigBuilder::default()
    }

    /// Defaults with a UI option map applied on top; see [`SuggestConfig::apply_options`].
    #[must_use]
    pub fn from_options(options: &Map<String, Value>) -> Self {
        let mut config = Self::default();
        config.apply_options(options);
        config
    }

    /// Apply a UI option map key by key.
    ///
    /// Unrecognized keys and values of the wrong shape are logged and
    /// skipped; the remaining options still apply.
    pub fn apply_options(&mut self, options: &Map<String, Value>) {
        for (key, value) in options {
            let applied = match key.as_str() {
                "minChars" => set(&mut self.min_chars, as_count(value)),
                "delay" => set(&mut self.debounce, as_millis(value)),
                "timeout" => set(&mut self.timeout, as_millis(value)),
                "maxSuggestions" => set(
                    &mut self.max_suggestions,
                    as_count(value).filter(|v| *v > 0),
                ),
                "states" => set(&mut self.states, as_states(value)),
                "include" => set(&mut self.include, as_list(value)),
                "bounds" => set(&mut self.bounds, as_bounds(value)),
                "minScore" => set(
                    &mut self.min_score,
                    value.as_f64().filter(|v| (0.0..=100.0).contains(v)),
                ),
                "precision" => set(
                    &mut self.precision,
                    value
                        .as_u64()
                        .and_then(|v| u32::try_from(v).ok())
                        .filter(|v| *v <= MAX_PRECISION),
                ),
                "useSecondary" => set(&mut self.use_secondary, value.as_bool()),
                "categories" => set(&mut self.categories, as_list(value)),
                "sourceCountry" => set(
                    &mut self.source_country,
                    value
                        .as_str()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned),
                ),
                _ => {
                    warn!(option = %key, "Ignoring unrecognized option");
                    continue;
                }
            };
            if !applied {
                warn!(option = %key, value = %value, "Ignoring invalid option value");
            }
        }
    }
}

/// Builder for creating suggestion configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SuggestConfigBuilder {
    config: SuggestConfig,
}

impl SuggestConfigBuilder {
    /// Create a new builder with the stock defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SuggestConfig::default(),
        }
    }

    /// Short debounce and few results, for fast typists
    #[must_use]
    pub fn responsive() -> Self {
        let mut builder = Self::new();
        builder.config.debounce = Duration::from_millis(100);
        builder.config.max_suggestions = 5;
        builder
    }

    /// Longer timeout and more results, for slow or distant backends
    #[must_use]
    pub fn thorough() -> Self {
        let mut builder = Self::new();
        builder.config.timeout = Duration::from_secs(15);
        builder.config.max_suggestions = 25;
        builder
    }

    pub fn min_chars(mut self, min_chars: usize) -> Self {
        self.config.min_chars = min_chars;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.config.debounce = debounce;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.config.max_suggestions = max;
        self
    }

    pub fn states(mut self, states: StateSet) -> Self {
        self.config.states = states;
        self
    }

    /// Restrict gazetteer results to these types
    pub fn include<I, S>(mut self, include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.include = include.into_iter().map(Into::into).collect();
        self
    }

    pub fn bounds(mut self, bounds: BoundingBox) -> Self {
        self.config.bounds = bounds;
        self
    }

    /// Minimum match score, clamped to 0..=100
    pub fn min_score(mut self, min_score: f64) -> Self {
        self.config.min_score = min_score.clamp(0.0, 100.0);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.config.precision = precision;
        self
    }

    /// Enable or disable the geocoder fallback
    pub fn use_secondary(mut self, enabled: bool) -> Self {
        self.config.use_secondary = enabled;
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn source_country(mut self, country: impl Into<String>) -> Self {
        self.config.source_country = country.into();
        self
    }

    /// Apply a UI option map on top of what has been set so far
    pub fn options(mut self, options: &Map<String, Value>) -> Self {
        self.config.apply_options(options);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<SuggestConfig> {
        let config = self.config;
        if !config.bounds.is_well_formed() {
            return Err(SuggestError::ConfigError(format!(
                "Bounds must be ordered and inside the world box, got {:?}",
                config.bounds
            )));
        }
        if config.precision > MAX_PRECISION {
            return Err(SuggestError::ConfigError(format!(
                "Precision must be at most {MAX_PRECISION}, got {}",
                config.precision
            )));
        }
        if config.max_suggestions == 0 {
            return Err(SuggestError::ConfigError(
                "max_suggestions must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
