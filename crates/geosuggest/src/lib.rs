//! Geosuggest - Location Suggestion Resolution Engine
//!
//! Geosuggest turns what a user types into a location input into a short list
//! of validated geographic suggestions. Text is normalized and checked for a
//! coordinate first; otherwise a structured gazetteer is asked, with a
//! commercial geocoder as fallback when the gazetteer has nothing usable.
//! Every record from either tier passes the same validator before it is shown.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use geosuggest::{ResolutionEngineBuilder, SuggestConfig, init_logging};
//! use tracing::Level;
//!
//! # async fn run() -> geosuggest::error::Result<()> {
//! init_logging(Level::INFO)?;
//!
//! let engine = ResolutionEngineBuilder::http(
//!     "origin",
//!     "https://gazetteer.example.com/suggest",
//!     Some("https://geocoder.example.com/findAddressCandidates"),
//! )
//! .config(SuggestConfig::builder().max_suggestions(5).build()?)
//! .register();
//!
//! engine.resolve("st paul mn").await;
//! println!("{}", engine.suggestions_feature_collection().to_json_string());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Input normalization**: upper-casing, punctuation scrubbing, `ST` to `SAINT`, trailing state codes
//! - **Coordinate input**: degrees-minutes-seconds and decimal degrees, with or without hemispheres
//! - **Two-tier lookup**: gazetteer first, geocoder fallback, one deadline across both
//! - **Caching**: per-engine memo including known-empty prefixes
//! - **Cancellation**: newer input supersedes in-flight work, stale answers are dropped
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod cache;
mod candidate;
mod config;
mod coordinator;
mod engine;
pub mod error;
mod query;
pub mod registry;

pub use cache::SuggestionCache;
pub use candidate::{
    BBOX_BUFFER_DEGREES, COORDINATE_SOURCE, COORDINATE_TYPE, Candidate, Feature,
    FeatureCollection, Point, SuggestionSet, ValidationContext, coordinate_record, validate,
    validate_all,
};
pub use config::{MAX_PRECISION, SuggestConfig, SuggestConfigBuilder};
pub use coordinator::CoordinatorState;
pub use engine::{ResolutionEngine, ResolutionEngineBuilder, ResolveOutcome, SuggestionObserver};
pub use geosuggest_providers as providers;
pub use geosuggest_providers::{BoundingBox, RawRecord};
pub use query::{
    COORDINATE_PRECISION, Coordinate, QueryDescriptor, StateFilter, StateSet, cache_key,
    is_known_code, normalize, parse_coordinate,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the geosuggest library.
///
/// Installs a `tracing` fmt subscriber. `RUST_LOG` wins when set; otherwise
/// `level` is used. HTTP client internals are held at `warn`. Calling this
/// more than once is a no-op.
///
/// # Examples
///
/// ```rust
/// use geosuggest::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), geosuggest::error::SuggestError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> error::Result<&'static ()> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}
