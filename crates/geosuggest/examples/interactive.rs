//! Type location queries, one per line, and see the suggestions.
//!
//! ```text
//! PRIMARY_URL=https://gazetteer.example.com/suggest \
//! SECONDARY_URL=https://geocoder.example.com/findAddressCandidates \
//!     cargo run --example interactive
//! ```
//!
//! `SECONDARY_URL` is optional. Lines starting with `:` are commands:
//! `:select N`, `:invalidate`, `:states CODES`, `:quit`.
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use geosuggest::{
    Feature, FeatureCollection, ResolutionEngineBuilder, SuggestConfig, SuggestionObserver,
    init_logging,
};
use serde_json::json;
use tracing::Level;

struct PrintObserver;

impl SuggestionObserver for PrintObserver {
    fn on_suggest(&self, suggestions: &FeatureCollection) {
        if suggestions.features.is_empty() {
            println!("  (no suggestions)");
        }
        for (i, feature) in suggestions.features.iter().enumerate() {
            let c = &feature.properties;
            println!("  [{i}] {:<20} {} ({})", c.kind, c.label, c.source);
        }
    }

    fn on_select(&self, selected: &Feature) {
        match serde_json::to_string_pretty(selected) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("could not render selection: {e}"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(Level::INFO)?;

    let primary_url = std::env::var("PRIMARY_URL").context("PRIMARY_URL must be set")?;
    let secondary_url = std::env::var("SECONDARY_URL").ok();

    let engine = ResolutionEngineBuilder::http("interactive", &primary_url, secondary_url.as_deref())
        .observer(Arc::new(PrintObserver))
        .config(SuggestConfig::builder().use_secondary(secondary_url.is_some()).build()?)
        .register();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) => break,
            (":invalidate", _) => engine.invalidate(),
            (":states", codes) => engine.apply_options(
                json!({ "states": codes })
                    .as_object()
                    .context("option map is an object")?,
            ),
            (":select", index) => {
                let suggestions = engine.suggestions();
                match index.trim().parse::<usize>().ok().and_then(|i| suggestions.get(i)) {
                    Some(candidate) => engine.select(candidate.clone()),
                    None => println!("  no suggestion {index}"),
                }
            }
            _ => {
                engine.resolve(line).await;
            }
        }
    }

    geosuggest::registry::remove(engine.id());
    Ok(())
}
