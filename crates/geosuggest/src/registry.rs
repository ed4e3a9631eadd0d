//! Process-wide lookup of live engines by control identifier.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ahash::AHashMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::engine::ResolutionEngine;

static ENGINES: Lazy<Mutex<AHashMap<String, Arc<ResolutionEngine>>>> =
    Lazy::new(|| Mutex::new(AHashMap::new()));

fn engines() -> MutexGuard<'static, AHashMap<String, Arc<ResolutionEngine>>> {
    ENGINES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Add `engine` under its id, replacing any engine already registered there.
pub fn register(engine: ResolutionEngine) -> Arc<ResolutionEngine> {
    let engine = Arc::new(engine);
    let previous = engines().insert(engine.id().to_string(), Arc::clone(&engine));
    if let Some(previous) = previous {
        warn!(engine = %engine.id(), "Replacing an engine that was never removed");
        previous.invalidate();
    } else {
        debug!(engine = %engine.id(), "Registered engine");
    }
    engine
}

#[must_use]
pub fn get(id: &str) -> Option<Arc<ResolutionEngine>> {
    engines().get(id).cloned()
}

/// Take the engine out of the registry, cancelling its live cycle and dropping its cache.
pub fn remove(id: &str) -> Option<Arc<ResolutionEngine>> {
    let engine = engines().remove(id)?;
    engine.invalidate();
    debug!(engine = %id, "Removed engine");
    Some(engine)
}

/// Registered ids, sorted.
#[must_use]
pub fn ids() -> Vec<String> {
    engines().keys().cloned().sorted().collect()
}
