//! The per-control resolution engine.
//!
//! One [`ResolutionEngine`] backs one location input. It owns the options,
//! the cache, the current suggestions and the selection, and runs at most
//! one live resolution cycle at a time.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use geosuggest::{ResolutionEngine, SuggestConfig};
//! use geosuggest::providers::{GazetteerClient, GeocoderClient};
//!
//! # async fn run() -> geosuggest::error::Result<()> {
//! let engine = ResolutionEngine::builder(
//!     "origin",
//!     Arc::new(GazetteerClient::new("https://gazetteer.example.com/suggest")),
//! )
//! .secondary(Arc::new(GeocoderClient::new(
//!     "https://geocoder.example.com/findAddressCandidates",
//! )))
//! .config(SuggestConfig::builder().min_chars(3).build()?)
//! .build();
//!
//! engine.resolve("austin tx").await;
//! for candidate in engine.suggestions().iter() {
//!     println!("{} ({})", candidate.label, candidate.kind);
//! }
//! # Ok(())
//! # }
//! ```
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future;
use geosuggest_providers::{PrimaryProvider, SecondaryProvider};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::cache::SuggestionCache;
use crate::candidate::{Candidate, Feature, FeatureCollection, SuggestionSet};
use crate::config::SuggestConfig;
use crate::coordinator::{Backends, CoordinatorState, Resolution, local_answer};
use crate::query::{QueryDescriptor, normalize};

/// Receives what the engine wants shown.
///
/// Both hooks run synchronously on the task that produced the change, after
/// the engine has released its own lock, so calling back into the engine is
/// fine.
pub trait SuggestionObserver: Send + Sync {
    fn on_suggest(&self, suggestions: &FeatureCollection);

    fn on_select(&self, _selected: &Feature) {}
}

/// How a call to [`ResolutionEngine::resolve`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The cycle committed; `changed` is true when the observer was notified.
    Completed { changed: bool },
    /// A newer input, an invalidation or a config change replaced this cycle
    /// before it committed. Nothing was cached or shown.
    Superseded,
}

#[derive(Debug)]
struct EngineState {
    config: SuggestConfig,
    cache: SuggestionCache,
    suggestions: SuggestionSet,
    selected: Option<Candidate>,
    /// Rendered form of what the observer last received, `None` when unknown.
    shown: Option<String>,
    phase: CoordinatorState,
}

impl EngineState {
    fn new(config: SuggestConfig) -> Self {
        Self {
            config,
            cache: SuggestionCache::new(),
            suggestions: SuggestionSet::empty(),
            selected: None,
            shown: Some(FeatureCollection::default().to_json_string()),
            phase: CoordinatorState::Idle,
        }
    }

    fn reset(&mut self) {
        self.cache.clear();
        self.suggestions = SuggestionSet::empty();
        self.shown = None;
        self.phase = CoordinatorState::Idle;
    }
}

/// Resolves free text typed into one control into location suggestions.
///
/// Each call to [`resolve`](Self::resolve) starts a new cycle and supersedes
/// any cycle still running, including its network calls. Only the newest
/// cycle can write the cache or notify the observer.
pub struct ResolutionEngine {
    id: String,
    primary: Arc<dyn PrimaryProvider>,
    secondary: Option<Arc<dyn SecondaryProvider>>,
    observer: Option<Arc<dyn SuggestionObserver>>,
    generation: watch::Sender<u64>,
    state: Mutex<EngineState>,
}

impl fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("id", &self.id)
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.as_ref().map(|s| s.name()))
            .field("generation", &*self.generation.borrow())
            .finish_non_exhaustive()
    }
}

/// Resolves once the engine's generation moves past `generation`.
async fn superseded(mut rx: watch::Receiver<u64>, generation: u64) {
    if rx.wait_for(|current| *current != generation).await.is_err() {
        // Sender gone means the engine is gone; nothing can supersede us.
        future::pending::<()>().await;
    }
}

impl ResolutionEngine {
    pub fn builder(
        id: impl Into<String>,
        primary: Arc<dyn PrimaryProvider>,
    ) -> ResolutionEngineBuilder {
        ResolutionEngineBuilder::new(id, primary)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.generation.borrow() == generation
    }

    #[must_use]
    pub fn config(&self) -> SuggestConfig {
        self.lock().config.clone()
    }

    /// Current phase of the live cycle, for diagnostics.
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.lock().phase
    }

    #[must_use]
    pub fn suggestions(&self) -> SuggestionSet {
        self.lock().suggestions.clone()
    }

    #[must_use]
    pub fn suggestions_feature_collection(&self) -> FeatureCollection {
        self.lock().suggestions.to_feature_collection()
    }

    #[must_use]
    pub fn selected(&self) -> Option<Candidate> {
        self.lock().selected.clone()
    }

    #[must_use]
    pub fn selected_feature(&self) -> Option<Feature> {
        self.lock().selected.as_ref().map(Candidate::to_feature)
    }

    /// Number of memoized queries.
    #[must_use]
    pub fn cached_queries(&self) -> usize {
        self.lock().cache.len()
    }

    /// Start a new cycle, superseding whatever was running.
    fn begin_cycle(&self) -> (u64, watch::Receiver<u64>) {
        let mut state = self.lock();
        self.generation.send_modify(|generation| *generation += 1);
        let generation = *self.generation.borrow();
        state.phase = CoordinatorState::Debouncing;
        (generation, self.generation.subscribe())
    }

    fn set_phase(&self, generation: u64, phase: CoordinatorState) {
        let mut state = self.lock();
        if self.is_current(generation) {
            state.phase = phase;
        }
    }

    /// Resolve `raw` into suggestions and notify the observer if they changed.
    ///
    /// Waits out the debounce interval first. Provider failures are logged and
    /// end in an empty suggestion set; nothing is returned as an error.
    #[instrument(skip(self), fields(engine = %self.id), level = "debug")]
    pub async fn resolve(&self, raw: &str) -> ResolveOutcome {
        let (generation, rx) = self.begin_cycle();
        tokio::select! {
            biased;
            () = superseded(rx, generation) => {
                debug!(generation, "Cycle superseded");
                ResolveOutcome::Superseded
            }
            outcome = self.run_cycle(raw, generation) => outcome,
        }
    }

    async fn run_cycle(&self, raw: &str, generation: u64) -> ResolveOutcome {
        let config = self.config();
        tokio::time::sleep(config.debounce).await;

        let query = normalize(raw, &config.states);
        let local = local_answer(&query, &config, &self.lock().cache);
        let resolution = match local {
            Some(resolution) => resolution,
            None => {
                let backends = Backends {
                    primary: self.primary.as_ref(),
                    secondary: self.secondary.as_deref().filter(|_| config.use_secondary),
                };
                let on_phase = |phase: CoordinatorState| self.set_phase(generation, phase);
                backends.fetch(&query, &config, &on_phase).await
            }
        };
        self.commit(generation, &query, resolution)
    }

    fn commit(
        &self,
        generation: u64,
        query: &QueryDescriptor,
        resolution: Resolution,
    ) -> ResolveOutcome {
        let update = {
            let mut state = self.lock();
            if !self.is_current(generation) {
                return ResolveOutcome::Superseded;
            }
            if resolution.cacheable {
                state
                    .cache
                    .set(query.cache_key.clone(), resolution.suggestions.clone());
            }
            let collection = resolution.suggestions.to_feature_collection();
            let rendered = collection.to_json_string();
            state.suggestions = resolution.suggestions;
            state.phase = CoordinatorState::Idle;
            if state.shown.as_deref() == Some(rendered.as_str()) {
                None
            } else {
                state.shown = Some(rendered);
                Some(collection)
            }
        };

        let changed = update.is_some();
        debug!(key = %query.cache_key, changed, "Cycle committed");
        if let (Some(collection), Some(observer)) = (update, &self.observer) {
            observer.on_suggest(&collection);
        }
        ResolveOutcome::Completed { changed }
    }

    /// Record the user's choice. Touches neither the network nor the cache.
    #[instrument(skip(self, candidate), fields(engine = %self.id, name = %candidate.name))]
    pub fn select(&self, candidate: Candidate) {
        let feature = candidate.to_feature();
        self.lock().selected = Some(candidate);
        if let Some(observer) = &self.observer {
            observer.on_select(&feature);
        }
    }

    /// Forget cached answers and current suggestions, cancelling any live cycle.
    #[instrument(skip(self), fields(engine = %self.id))]
    pub fn invalidate(&self) {
        let mut state = self.lock();
        self.generation.send_modify(|generation| *generation += 1);
        let dropped = state.cache.len();
        state.reset();
        info!(dropped, "Invalidated suggestions");
    }

    /// Replace the options wholesale; invalidates like [`invalidate`](Self::invalidate).
    #[instrument(skip(self, config), fields(engine = %self.id))]
    pub fn set_config(&self, config: SuggestConfig) {
        let mut state = self.lock();
        self.generation.send_modify(|generation| *generation += 1);
        state.config = config;
        state.reset();
        info!("Options replaced");
    }

    /// Apply a UI option map over the current options, then invalidate.
    pub fn apply_options(&self, options: &Map<String, Value>) {
        let mut config = self.config();
        config.apply_options(options);
        self.set_config(config);
    }
}

/// Builder for a [`ResolutionEngine`].
pub struct ResolutionEngineBuilder {
    id: String,
    primary: Arc<dyn PrimaryProvider>,
    secondary: Option<Arc<dyn SecondaryProvider>>,
    observer: Option<Arc<dyn SuggestionObserver>>,
    config: SuggestConfig,
}

impl ResolutionEngineBuilder {
    pub fn new(id: impl Into<String>, primary: Arc<dyn PrimaryProvider>) -> Self {
        Self {
            id: id.into(),
            primary,
            secondary: None,
            observer: None,
            config: SuggestConfig::default(),
        }
    }

    /// Engine backed by the HTTP gazetteer and, optionally, the HTTP geocoder.
    #[cfg(feature = "http")]
    pub fn http(id: impl Into<String>, primary_url: &str, secondary_url: Option<&str>) -> Self {
        use geosuggest_providers::{GazetteerClient, GeocoderClient};

        let mut builder = Self::new(id, Arc::new(GazetteerClient::new(primary_url)));
        if let Some(url) = secondary_url {
            builder = builder.secondary(Arc::new(GeocoderClient::new(url)));
        }
        builder
    }

    /// Geocoder consulted when the gazetteer has nothing usable
    #[must_use]
    pub fn secondary(mut self, secondary: Arc<dyn SecondaryProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn SuggestionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn config(mut self, config: SuggestConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> ResolutionEngine {
        info!(
            engine = %self.id,
            primary = self.primary.name(),
            secondary = self.secondary.as_ref().map(|s| s.name()),
            "Creating resolution engine"
        );
        let (generation, _) = watch::channel(0);
        ResolutionEngine {
            id: self.id,
            primary: self.primary,
            secondary: self.secondary,
            observer: self.observer,
            generation,
            state: Mutex::new(EngineState::new(self.config)),
        }
    }

    /// Build the engine and add it to the process-wide registry.
    pub fn register(self) -> Arc<ResolutionEngine> {
        crate::registry::register(self.build())
    }
}
