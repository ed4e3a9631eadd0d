//! The single gate between provider records and surfaced candidates.
//!
//! Every field goes through the same steps, in table order. First the raw
//! value is coerced to the field's kind. A missing value is then either
//! rejected, skipped or defaulted from fields already accepted. Last, the
//! field's check runs. Any rejection drops the whole record.
use std::fmt;

use geosuggest_providers::{BoundingBox, RawRecord};
use serde_json::{Map, Value};
use tracing::debug;

use super::Candidate;
use crate::query::{QueryDescriptor, is_known_code, round_to};

/// Half-width of the box synthesized around a point with no extent.
pub const BBOX_BUFFER_DEGREES: f64 = 0.01;

/// Everything validation depends on besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub query: &'a QueryDescriptor,
    pub bounds: &'a BoundingBox,
    pub min_score: f64,
    /// Decimal places kept on latitude, longitude and extent values.
    pub precision: u32,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Code,
    Degrees,
    Score,
}

type DefaultFn = fn(&Map<String, Value>, &ValidationContext<'_>) -> Option<Value>;
type CheckFn = fn(&Value, &ValidationContext<'_>) -> bool;

#[derive(Clone, Copy)]
enum Presence {
    Required,
    Optional,
    Defaulted(DefaultFn),
}

struct FieldSpec {
    key: &'static str,
    kind: Kind,
    presence: Presence,
    check: Option<CheckFn>,
}

const fn field(key: &'static str, kind: Kind, presence: Presence, check: Option<CheckFn>) -> FieldSpec {
    FieldSpec {
        key,
        kind,
        presence,
        check,
    }
}

/// Defaults may only read fields listed above them.
const FIELDS: [FieldSpec; 13] = [
    field("type", Kind::Text, Presence::Required, None),
    field("name", Kind::Text, Presence::Required, None),
    field("county", Kind::Text, Presence::Optional, None),
    field("state", Kind::Code, Presence::Optional, Some(state_allowed)),
    field("latitude", Kind::Degrees, Presence::Required, Some(latitude_in_bounds)),
    field("longitude", Kind::Degrees, Presence::Required, Some(longitude_in_bounds)),
    field("latMin", Kind::Degrees, Presence::Defaulted(default_lat_min), None),
    field("lonMin", Kind::Degrees, Presence::Defaulted(default_lon_min), None),
    field("latMax", Kind::Degrees, Presence::Defaulted(default_lat_max), None),
    field("lonMax", Kind::Degrees, Presence::Defaulted(default_lon_max), None),
    field("label", Kind::Text, Presence::Defaulted(default_label), None),
    field("score", Kind::Score, Presence::Defaulted(default_score), Some(score_acceptable)),
    field("source", Kind::Text, Presence::Required, None),
];

#[derive(Debug)]
enum Rejection {
    Missing(&'static str),
    Failed(&'static str, Value),
    Shape(serde_json::Error),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing or unparseable required field '{key}'"),
            Self::Failed(key, value) => write!(f, "field '{key}' failed validation with {value}"),
            Self::Shape(e) => write!(f, "could not build candidate: {e}"),
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a raw value to the field kind; `None` covers both absent and unparseable.
fn coerce(kind: Kind, raw: Option<&Value>, ctx: &ValidationContext<'_>) -> Option<Value> {
    let raw = raw?;
    match kind {
        Kind::Text => text(raw).map(Value::String),
        Kind::Code => text(raw).map(|s| Value::String(s.to_uppercase())),
        Kind::Degrees => number(raw).map(|v| Value::from(round_to(v, ctx.precision))),
        Kind::Score => number(raw).map(|v| Value::from(v.round() as i64)),
    }
}

fn accepted(out: &Map<String, Value>, key: &str) -> Option<f64> {
    out.get(key).and_then(Value::as_f64)
}

fn buffered(out: &Map<String, Value>, ctx: &ValidationContext<'_>, key: &str, offset: f64) -> Option<Value> {
    accepted(out, key).map(|v| Value::from(round_to(v + offset, ctx.precision)))
}

fn default_lat_min(out: &Map<String, Value>, ctx: &ValidationContext<'_>) -> Option<Value> {
    buffered(out, ctx, "latitude", -BBOX_BUFFER_DEGREES)
}

fn default_lon_min(out: &Map<String, Value>, ctx: &ValidationContext<'_>) -> Option<Value> {
    buffered(out, ctx, "longitude", -BBOX_BUFFER_DEGREES)
}

fn default_lat_max(out: &Map<String, Value>, ctx: &ValidationContext<'_>) -> Option<Value> {
    buffered(out, ctx, "latitude", BBOX_BUFFER_DEGREES)
}

fn default_lon_max(out: &Map<String, Value>, ctx: &ValidationContext<'_>) -> Option<Value> {
    buffered(out, ctx, "longitude", BBOX_BUFFER_DEGREES)
}

fn default_label(out: &Map<String, Value>, _ctx: &ValidationContext<'_>) -> Option<Value> {
    let parts: Vec<&str> = ["name", "county", "state"]
        .iter()
        .filter_map(|key| out.get(*key).and_then(Value::as_str))
        .collect();
    (!parts.is_empty()).then(|| Value::String(parts.join(", ")))
}

fn default_score(_out: &Map<String, Value>, _ctx: &ValidationContext<'_>) -> Option<Value> {
    Some(Value::from(100))
}

fn state_allowed(value: &Value, ctx: &ValidationContext<'_>) -> bool {
    value.as_str().is_some_and(|code| {
        code.len() == 2 && is_known_code(code) && ctx.query.state_filter.contains(code)
    })
}

fn latitude_in_bounds(value: &Value, ctx: &ValidationContext<'_>) -> bool {
    value
        .as_f64()
        .is_some_and(|lat| (ctx.bounds.lat_min..=ctx.bounds.lat_max).contains(&lat))
}

fn longitude_in_bounds(value: &Value, ctx: &ValidationContext<'_>) -> bool {
    value
        .as_f64()
        .is_some_and(|lon| (ctx.bounds.lon_min..=ctx.bounds.lon_max).contains(&lon))
}

fn score_acceptable(value: &Value, ctx: &ValidationContext<'_>) -> bool {
    value
        .as_f64()
        .is_some_and(|score| score >= ctx.min_score && (0.0..=100.0).contains(&score))
}

fn run_pipeline(raw: &RawRecord, ctx: &ValidationContext<'_>) -> Result<Candidate, Rejection> {
    let mut out = Map::new();
    for spec in &FIELDS {
        let value = match coerce(spec.kind, raw.get(spec.key), ctx) {
            Some(value) => value,
            None => match spec.presence {
                Presence::Required => return Err(Rejection::Missing(spec.key)),
                Presence::Optional => continue,
                Presence::Defaulted(default) => match default(&out, ctx) {
                    Some(value) => value,
                    None => continue,
                },
            },
        };
        if let Some(check) = spec.check
            && !check(&value, ctx)
        {
            return Err(Rejection::Failed(spec.key, value));
        }
        out.insert(spec.key.to_string(), value);
    }
    serde_json::from_value(Value::Object(out)).map_err(Rejection::Shape)
}

/// Validate one raw record, returning `None` (and logging why) on rejection.
#[must_use]
pub fn validate(raw: &RawRecord, ctx: &ValidationContext<'_>) -> Option<Candidate> {
    match run_pipeline(raw, ctx) {
        Ok(candidate) => Some(candidate),
        Err(rejection) => {
            debug!(
                term = %ctx.query.term,
                name = ?raw.get("name"),
                reason = %rejection,
                "Dropping candidate"
            );
            None
        }
    }
}

/// Validate a batch, keeping provider order and silently dropping rejects.
#[must_use]
pub fn validate_all(records: &[RawRecord], ctx: &ValidationContext<'_>) -> Vec<Candidate> {
    records
        .iter()
        .filter_map(|record| validate(record, ctx))
        .collect()
}
