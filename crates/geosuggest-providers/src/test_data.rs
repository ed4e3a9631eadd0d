//! In-memory providers with scripted replies, for exercising the engine without a network.
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    PrimaryProvider, PrimaryRequest, ProviderError, RawRecord, Result, SecondaryProvider,
    SecondaryRequest,
};

/// What a [`ScriptedProvider`] answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Records(Vec<RawRecord>),
    Fail(String),
}

impl Reply {
    /// Records from a JSON array of objects; anything else becomes an empty reply.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        let records = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Self::Records(records)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::Records(Vec::new())
    }
}

/// A provider that replays canned answers, keyed by the request term.
///
/// Implements both provider traits so one type can stand in for either tier.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    default_reply: Reply,
    replies: HashMap<String, Reply>,
    delay: Duration,
    calls: AtomicUsize,
    terms: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(name: impl Into<String>, default_reply: Reply) -> Self {
        Self {
            name: name.into(),
            default_reply,
            replies: HashMap::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            terms: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_reply(mut self, term: impl Into<String>, reply: Reply) -> Self {
        self.replies.insert(term.into(), reply);
        self
    }

    /// Simulated latency before every reply.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of requests that reached this provider, including ones cancelled mid-flight.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Terms requested so far, in call order.
    pub fn terms(&self) -> Vec<String> {
        self.terms
            .lock()
            .map(|terms| terms.clone())
            .unwrap_or_default()
    }

    async fn answer(&self, term: &str) -> Result<Vec<RawRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut terms) = self.terms.lock() {
            terms.push(term.to_string());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.replies.get(term).unwrap_or(&self.default_reply) {
            Reply::Records(records) => Ok(records.clone()),
            Reply::Fail(message) => Err(ProviderError::Scripted(message.clone())),
        }
    }
}

#[async_trait]
impl PrimaryProvider for ScriptedProvider {
    async fn suggest(&self, request: &PrimaryRequest) -> Result<Vec<RawRecord>> {
        self.answer(&request.term).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SecondaryProvider for ScriptedProvider {
    async fn find_candidates(&self, request: &SecondaryRequest) -> Result<Vec<RawRecord>> {
        self.answer(&request.single_line).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
