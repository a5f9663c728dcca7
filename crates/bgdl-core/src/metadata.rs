//! Metadata codec for the native boundary.
//!
//! Callers attach structured metadata to a download. The native layer stores
//! it as an opaque JSON string and hands it back when listing downloads, so
//! decoding must never fail past this module.

use serde_json::{Map, Value};

/// Result of decoding a metadata string from native.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedMetadata {
    /// The blob parsed to a structured value.
    Structured(Value),
    /// The blob was not valid JSON.
    Malformed {
        /// The raw string as received.
        raw: String,
        /// Parser error description.
        reason: String,
    },
}

impl DecodedMetadata {
    /// The structured value, or an empty object when the blob was malformed.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value) => value,
            Self::Malformed { .. } => empty(),
        }
    }

    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// An empty metadata object.
#[must_use]
pub fn empty() -> Value {
    Value::Object(Map::new())
}

/// Keep object and array metadata as is; anything else becomes `{}`.
#[must_use]
pub fn normalize(metadata: Option<Value>) -> Value {
    match metadata {
        Some(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => empty(),
    }
}

/// Serialize metadata for transmission to native.
#[must_use]
pub fn encode(value: &Value) -> String {
    // Serializing a `Value` cannot fail: every map key is already a string.
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Decode a metadata string received from native.
///
/// An empty string decodes to `{}`.
#[must_use]
pub fn decode(raw: &str) -> DecodedMetadata {
    if raw.trim().is_empty() {
        return DecodedMetadata::Structured(empty());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value) => DecodedMetadata::Structured(value),
        Err(e) => DecodedMetadata::Malformed {
            raw: raw.to_string(),
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_nested_value() {
        let value = json!({
            "title": "episode 4",
            "tags": ["a", "b"],
            "size": 12.5,
            "nested": { "ok": true, "none": null }
        });
        assert_eq!(decode(&encode(&value)), DecodedMetadata::Structured(value));
    }

    #[test]
    fn test_round_trip_array() {
        let value = normalize(Some(json!([1, {"k": "v"}])));
        assert_eq!(decode(&encode(&value)), DecodedMetadata::Structured(value));
    }

    #[test]
    fn test_decode_malformed_never_panics() {
        let decoded = decode("{not json");
        assert!(decoded.is_malformed());
        assert_eq!(decoded.into_value(), empty());
    }

    #[test]
    fn test_decode_empty_string() {
        assert_eq!(decode(""), DecodedMetadata::Structured(empty()));
    }

    #[test]
    fn test_normalize_keeps_structured_values() {
        assert_eq!(normalize(Some(json!("text"))), empty());
        assert_eq!(normalize(Some(json!(42))), empty());
        assert_eq!(normalize(Some(json!([1, 2]))), json!([1, 2]));
        assert_eq!(normalize(None), empty());
        assert_eq!(normalize(Some(json!({"k": 1}))), json!({"k": 1}));
    }
}
