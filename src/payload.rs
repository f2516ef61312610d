//! License payload and its canonical byte encoding.
//!
//! The signature covers the exact bytes produced by [`encode`], so the
//! encoding must be a pure function of the field values: compact JSON, keys
//! in lexicographic order, dates as `YYYY-MM-DD`, an unbound hardware id as
//! `null`.
//!
//! ```text
//! {"ablaufdatum":"2025-06-01","ausgestellt_am":"2024-06-01","hardware_id":null,"version":"Pro"}
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use time::Date;

use crate::error::{LicenseError, OptionExt as _, Result, ResultExt as _};
use crate::util;

const FIELD_EXPIRES: &str = "ablaufdatum";
const FIELD_ISSUED: &str = "ausgestellt_am";
const FIELD_HARDWARE_ID: &str = "hardware_id";
const FIELD_VERSION: &str = "version";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// The signed licensing facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensePayload {
    /// Product edition, e.g. "Pro".
    pub version: String,
    pub issued_at: Date,
    /// Last calendar day on which the license is valid.
    pub expires_at: Date,
    /// Machine the license is bound to; `None` means unbound.
    pub hardware_id: Option<String>,
}

/// Wire form. Field declaration order is the serialization order and must
/// stay lexicographic.
#[derive(Serialize)]
struct CanonicalPayload<'a> {
    ablaufdatum: String,
    ausgestellt_am: String,
    hardware_id: Option<&'a str>,
    version: &'a str,
}

impl<'a> From<&'a LicensePayload> for CanonicalPayload<'a> {
    fn from(p: &'a LicensePayload) -> Self {
        Self {
            ablaufdatum: util::format_date(p.expires_at),
            ausgestellt_am: util::format_date(p.issued_at),
            hardware_id: p.hardware_id.as_deref(),
            version: &p.version,
        }
    }
}

impl LicensePayload {
    /// Indented JSON in the wire field names, for display.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&CanonicalPayload::from(self))
            .ctx_payload_format("serialize payload for display")
    }

    /// JSON value in the wire field names, for embedding in reports.
    pub fn to_json_value(&self) -> Result<Value> {
        serde_json::to_value(CanonicalPayload::from(self))
            .ctx_payload_format("serialize payload as JSON value")
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Canonical bytes of `payload`. Equal payloads always yield equal bytes.
pub fn encode(payload: &LicensePayload) -> Result<Vec<u8>> {
    serde_json::to_vec(&CanonicalPayload::from(payload)).ctx_payload_format("encode payload")
}

/// Parse canonical payload bytes.
///
/// Missing fields and non-JSON input are [`LicenseError::PayloadFormat`];
/// fields of the wrong shape are [`LicenseError::PayloadType`]. Unknown
/// fields are ignored.
pub fn decode(bytes: &[u8]) -> Result<LicensePayload> {
    let doc: Value = serde_json::from_slice(bytes).ctx_payload_format("parse payload JSON")?;
    let obj = doc
        .as_object()
        .required_payload("payload is not a JSON object")?;

    let version = required_str(obj, FIELD_VERSION)?.to_string();
    let expires_at = required_date(obj, FIELD_EXPIRES)?;
    let issued_at = required_date(obj, FIELD_ISSUED)?;
    let hardware_id = match obj.get(FIELD_HARDWARE_ID) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(LicenseError::PayloadType(format!(
                "field `{FIELD_HARDWARE_ID}` must be a string or null, got {}",
                json_kind(other)
            )))
        }
    };

    Ok(LicensePayload {
        version,
        issued_at,
        expires_at,
        hardware_id,
    })
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    let value = obj
        .get(field)
        .required_payload(&format!("missing field `{field}`"))?;
    value.as_str().ok_or_else(|| {
        LicenseError::PayloadType(format!(
            "field `{field}` must be a string, got {}",
            json_kind(value)
        ))
    })
}

fn required_date(obj: &Map<String, Value>, field: &str) -> Result<Date> {
    let s = required_str(obj, field)?;
    util::parse_date(s).ctx_payload_type(&format!("field `{field}` is not a YYYY-MM-DD date"))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
