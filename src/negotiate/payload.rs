//! What handlers return and what renderers consume.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::response::NegotiatedResponse;
use crate::error::HttpError;

// =============================================================================
// Payload
// =============================================================================

/// A value that can be JSON-encoded on demand.
///
/// Implemented for every `Serialize + Debug` type. Encoding is deferred to
/// render time, so a value whose `Serialize` impl fails (e.g. a map with
/// non-string keys) only fails in the renderer that needs JSON.
pub trait Renderable: fmt::Debug + Send + Sync {
    fn to_json_value(&self) -> Result<Value, serde_json::Error>;
}

impl<T> Renderable for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Data handed from a handler to a renderer.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Plain JSON data
    Value(Value),

    /// A collection of model records, rendered in the
    /// `[{"model": ..., "pk": ..., "fields": {...}}]` layout
    Records(Vec<Record>),

    /// A sequence of payloads; `None` entries encode as `null`
    List(Vec<Option<Payload>>),

    /// Any other serializable value, encoded lazily
    Opaque(Arc<dyn Renderable>),
}

impl Payload {
    /// Wrap any serializable value.
    pub fn from_serialize<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Payload::Opaque(Arc::new(value))
    }

    pub fn records(records: Vec<Record>) -> Self {
        Payload::Records(records)
    }

    /// Encode as a JSON value.
    pub fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Payload::Value(value) => Ok(value.clone()),
            Payload::Records(records) => serde_json::to_value(records),
            Payload::List(items) => items
                .iter()
                .map(|item| match item {
                    Some(payload) => payload.to_json_value(),
                    None => Ok(Value::Null),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Payload::Opaque(value) => value.to_json_value(),
        }
    }

    /// The payload's plain string form, used when JSON encoding fails.
    pub fn raw_string(&self) -> String {
        match self {
            Payload::Value(Value::String(s)) => s.clone(),
            Payload::Value(value) => value.to_string(),
            Payload::Records(records) => format!("{:?}", records),
            Payload::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Some(payload) => payload.raw_string(),
                        None => "null".to_string(),
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            Payload::Opaque(value) => format!("{:?}", value),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<Vec<Record>> for Payload {
    fn from(records: Vec<Record>) -> Self {
        Payload::Records(records)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Value(Value::String(s.to_string()))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Value(Value::String(s))
    }
}

/// A model instance, as a lazy collection of stored rows would yield it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// `<app>.<model>` label
    pub model: String,

    /// Primary key
    pub pk: Value,

    /// Field values, without the primary key
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(model: impl Into<String>, pk: impl Into<Value>) -> Self {
        Self {
            model: model.into(),
            pk: pk.into(),
            fields: Map::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

// =============================================================================
// Decimal
// =============================================================================

/// Fixed-point decimal: `mantissa * 10^-scale`.
///
/// Serializes as a JSON float. A value that does not survive the trip to
/// `f64` (it overflows, or underflows to zero) is written as its exact
/// decimal string instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

/// Error parsing a [`Decimal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid decimal: {0}")]
pub struct ParseDecimalError(String);

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if frac_part.starts_with(['+', '-']) || (int_part.is_empty() && frac_part.is_empty()) {
            return Err(invalid());
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let mantissa = format!("{}{}", int_part, frac_part)
            .parse::<i128>()
            .map_err(|_| invalid())?;
        Ok(Decimal::new(mantissa, scale))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.to_f64();
        if value.is_finite() && (value != 0.0 || self.mantissa == 0) {
            serializer.serialize_f64(value)
        } else {
            serializer.collect_str(self)
        }
    }
}

// =============================================================================
// Reply
// =============================================================================

/// What a handler hands to the negotiator.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Payload served with 200; `None` yields an empty body
    Data(Option<Payload>),

    /// Payload paired with a status. When the status does not coerce to a
    /// valid status code, the whole pair is served as the payload with 200.
    WithStatus(Option<Payload>, Value),

    /// A finished response, passed through untouched
    Response(NegotiatedResponse),
}

/// A [`Reply`] after status coercion.
#[derive(Debug, Clone)]
pub enum ResolvedReply {
    Render(Option<Payload>, StatusCode),
    Passthrough(NegotiatedResponse),
}

impl Reply {
    pub fn ok(payload: impl Into<Payload>) -> Self {
        Reply::Data(Some(payload.into()))
    }

    /// No payload, status 200.
    pub fn empty() -> Self {
        Reply::Data(None)
    }

    /// Payload with an explicit status code.
    pub fn status(payload: impl Into<Payload>, status: StatusCode) -> Self {
        Reply::WithStatus(Some(payload.into()), Value::from(status.as_u16()))
    }

    /// Payload with a status that still has to be coerced.
    pub fn with_status(payload: impl Into<Payload>, status: impl Into<Value>) -> Self {
        Reply::WithStatus(Some(payload.into()), status.into())
    }

    /// `{"error": message}` (or nothing) with the error's status.
    pub fn from_http_error(err: HttpError) -> Self {
        let payload = err.message.map(|message| Payload::Value(json!({ "error": message })));
        Reply::WithStatus(payload, Value::from(err.status.as_u16()))
    }

    pub fn resolve(self) -> ResolvedReply {
        match self {
            Reply::Data(payload) => ResolvedReply::Render(payload, StatusCode::OK),
            Reply::WithStatus(payload, status) => match coerce_status(&status) {
                Some(code) => ResolvedReply::Render(payload, code),
                None => {
                    let pair = Payload::List(vec![payload, Some(Payload::Value(status))]);
                    ResolvedReply::Render(Some(pair), StatusCode::OK)
                }
            },
            Reply::Response(response) => ResolvedReply::Passthrough(response),
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Reply::empty(),
            value => Reply::ok(value),
        }
    }
}

impl From<Payload> for Reply {
    fn from(payload: Payload) -> Self {
        Reply::ok(payload)
    }
}

impl<S: Into<Value>> From<(Value, S)> for Reply {
    fn from((value, status): (Value, S)) -> Self {
        let payload = match value {
            Value::Null => None,
            value => Some(Payload::Value(value)),
        };
        Reply::WithStatus(payload, status.into())
    }
}

impl From<NegotiatedResponse> for Reply {
    fn from(response: NegotiatedResponse) -> Self {
        Reply::Response(response)
    }
}

/// Integer-coerce a status value: integers, integral strings and floats
/// (truncated) are accepted when they name a valid status code.
pub fn coerce_status(value: &Value) -> Option<StatusCode> {
    let code = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
}
