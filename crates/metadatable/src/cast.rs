//! Type tags and the coercion/serialization table.
//!
//! Every metadata row carries a free-form type tag next to its text value.
//! [`CastType`] resolves that tag (case-insensitively, with aliases) and
//! drives both directions: [`coerce`] turns stored text into a
//! [`MetaValue`], [`serialize`] turns a [`MetaValue`] back into text.

use crate::error::{CoercionError, SerializationError};
use crate::value::{Collection, MetaValue, DATETIME_FORMAT};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// The tag used when a row has no type set.
pub const DEFAULT_TYPE_TAG: &str = "string";

/// The declared type of a metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CastType {
    Int,
    Float,
    String,
    Bool,
    /// Decoded as a generic object.
    Object,
    /// Stored as `YYYY-MM-DD HH:MM:SS`.
    DateTime,
    /// Decoded as an ordered list or keyed map (`array` / `json` tags).
    Json,
    /// Decoded and wrapped in a [`Collection`].
    Collection,
    /// Unrecognized tag, kept verbatim. Values pass through untouched.
    Unknown(String),
}

/// Recognized tags, lowercase. Adding an alias means adding an entry here.
pub const CAST_ALIASES: &[(&str, CastType)] = &[
    ("int", CastType::Int),
    ("integer", CastType::Int),
    ("real", CastType::Float),
    ("float", CastType::Float),
    ("double", CastType::Float),
    ("string", CastType::String),
    ("bool", CastType::Bool),
    ("boolean", CastType::Bool),
    ("object", CastType::Object),
    ("datetime", CastType::DateTime),
    ("date", CastType::DateTime),
    ("timestamp", CastType::DateTime),
    ("array", CastType::Json),
    ("json", CastType::Json),
    ("collection", CastType::Collection),
];

impl CastType {
    /// Resolve a stored type tag. Missing or blank tags mean `string`.
    pub fn from_tag(tag: Option<&str>) -> CastType {
        let tag = match tag.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return CastType::String,
        };
        let lowered = tag.to_ascii_lowercase();
        CAST_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, cast)| cast.clone())
            .unwrap_or_else(|| CastType::Unknown(tag.to_string()))
    }

    /// Canonical tag written back to storage.
    pub fn tag(&self) -> &str {
        match self {
            CastType::Int => "integer",
            CastType::Float => "float",
            CastType::String => "string",
            CastType::Bool => "boolean",
            CastType::Object => "object",
            CastType::DateTime => "datetime",
            CastType::Json => "json",
            CastType::Collection => "collection",
            CastType::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CastType::Unknown(_))
    }

    /// Types whose stored form is a JSON document.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            CastType::Json | CastType::Object | CastType::Collection
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, CastType::DateTime)
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Coerce stored text to its declared type.
///
/// Unknown tags are not an error: the raw text comes back unchanged.
pub fn coerce(cast: &CastType, raw: &str) -> Result<MetaValue, CoercionError> {
    match cast {
        CastType::Int => parse_int(raw)
            .map(MetaValue::Int)
            .ok_or_else(|| CoercionError::malformed(cast, raw, "not an integer")),
        CastType::Float => raw
            .trim()
            .parse::<f64>()
            .map(MetaValue::Float)
            .map_err(|e| CoercionError::malformed(cast, raw, e)),
        CastType::String => Ok(MetaValue::String(raw.to_string())),
        CastType::Bool => parse_bool(raw)
            .map(MetaValue::Bool)
            .ok_or_else(|| CoercionError::malformed(cast, raw, "not a boolean")),
        CastType::Object => decode_json(cast, raw).map(MetaValue::Object),
        CastType::DateTime => NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
            .map(MetaValue::DateTime)
            .map_err(|e| CoercionError::malformed(cast, raw, e)),
        CastType::Json => decode_json(cast, raw).map(MetaValue::Json),
        CastType::Collection => {
            decode_json(cast, raw).map(|v| MetaValue::Collection(Collection::new(v)))
        }
        CastType::Unknown(tag) => {
            debug!(tag = %tag, "unknown metadata type tag, returning raw value");
            Ok(MetaValue::String(raw.to_string()))
        }
    }
}

/// Serialize an in-memory value to its stored text form. `Null` stores nothing.
///
/// `value` is a typed value, never stored text: a string handed to a
/// container type is encoded as a JSON string. Temporal types accept
/// date-times, date-time text and unix seconds, and always store the fixed
/// layout.
pub fn serialize(cast: &CastType, value: &MetaValue) -> Result<Option<String>, SerializationError> {
    if value.is_null() {
        return Ok(None);
    }

    if cast.is_container() {
        return Ok(Some(serde_json::to_string(&value.to_json())?));
    }

    if cast.is_temporal() {
        let dt = match value {
            MetaValue::DateTime(dt) => *dt,
            MetaValue::String(text) => parse_datetime_text(text)
                .ok_or_else(|| SerializationError::InvalidDateTime(text.clone()))?,
            MetaValue::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| SerializationError::InvalidDateTime(secs.to_string()))?,
            other => {
                return Err(SerializationError::Incompatible {
                    cast: cast.clone(),
                    value: other.to_string(),
                })
            }
        };
        return Ok(Some(dt.format(DATETIME_FORMAT).to_string()));
    }

    Ok(value.to_text())
}

fn decode_json(cast: &CastType, raw: &str) -> Result<Value, CoercionError> {
    serde_json::from_str(raw).map_err(|e| CoercionError::malformed(cast, raw, e))
}

fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    // Integral text written by a float column, e.g. "42.0"
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64)
        .map(|v| v as i64)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    text.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
}
