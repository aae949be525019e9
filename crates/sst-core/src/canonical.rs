//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the construction path for bytes that feed digests
//! of structured values (agent decisions, exposure snapshots, audit payloads).
//!
//! ## Coercion Rules
//!
//! 1. Reject floats: counts and scores are integers.
//! 2. Normalize RFC 3339 datetimes to UTC with `Z` suffix, truncated to seconds.
//! 3. Sort object keys lexicographically (`serde_json::Map` is ordered).
//! 4. Compact separators, no whitespace.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonical serialization.
///
/// The inner `Vec<u8>` is private; downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        Ok(Self(serde_json::to_vec(&coerced)?))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Number(n) => {
            if n.is_f64() {
                return Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ));
            }
            Ok(Value::Number(n))
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => Ok(Value::Array(
            arr.into_iter()
                .map(coerce_json_value)
                .collect::<Result<_, _>>()?,
        )),
        Value::String(s) => match chrono::DateTime::parse_from_rfc3339(&s) {
            Ok(dt) => {
                let utc = dt.with_timezone(&chrono::Utc);
                Ok(Value::String(utc.format("%Y-%m-%dT%H:%M:%SZ").to_string()))
            }
            Err(_) => Ok(Value::String(s)),
        },
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_and_compact() {
        let cb = CanonicalBytes::new(&json!({"b": 1, "a": [true, null]})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn floats_are_rejected() {
        let err = CanonicalBytes::new(&json!({"score": 1.5})).unwrap_err();
        assert!(matches!(err, CanonicalizationError::FloatRejected(_)));
    }

    #[test]
    fn datetimes_normalize_to_utc_seconds() {
        let cb = CanonicalBytes::new(&json!({"t": "2026-03-01T10:15:30.123-03:00"})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"t":"2026-03-01T13:15:30Z"}"#);
    }

    #[test]
    fn plain_strings_pass_through() {
        let cb = CanonicalBytes::new(&json!(["Setor A", "2026-13-99"])).unwrap();
        assert_eq!(cb.as_bytes(), br#"["Setor A","2026-13-99"]"#);
    }

    #[test]
    fn into_bytes_matches_as_bytes() {
        let cb = CanonicalBytes::new(&json!({"k": 7})).unwrap();
        let copy = cb.as_bytes().to_vec();
        assert_eq!(cb.into_bytes(), copy);
    }
}
