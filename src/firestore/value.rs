use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::{GeoPoint, Timestamp};

/// Field map of a stored document.
pub type DocumentData = BTreeMap<String, FirestoreValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct FirestoreValue {
    kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(Vec<u8>),
    Reference(String),
    GeoPoint(GeoPoint),
    Array(Vec<FirestoreValue>),
    Map(DocumentData),
}

impl FirestoreValue {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_timestamp(value: Timestamp) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ValueKind::Bytes(value.into()),
        }
    }

    pub fn from_reference(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Reference(path.into()),
        }
    }

    pub fn from_geo_point(value: GeoPoint) -> Self {
        Self {
            kind: ValueKind::GeoPoint(value),
        }
    }

    pub fn from_array(values: Vec<FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Array(values),
        }
    }

    pub fn from_map(map: DocumentData) -> Self {
        Self {
            kind: ValueKind::Map(map),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.kind {
            ValueKind::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(value) => Some(value),
            _ => None,
        }
    }

    /// Converts plain JSON. Numbers that fit in `i64` become integers, every
    /// other number becomes a double.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::null(),
            JsonValue::Bool(boolean) => Self::from_bool(*boolean),
            JsonValue::Number(number) => match number.as_i64() {
                Some(integer) => Self::from_integer(integer),
                None => Self::from_double(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(string) => Self::from_string(string.clone()),
            JsonValue::Array(values) => Self::from_array(values.iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::from_map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as plain JSON for reporting. Non-JSON types use their
    /// textual forms: RFC 3339 timestamps, base64 bytes, reference paths.
    pub fn to_json(&self) -> JsonValue {
        match &self.kind {
            ValueKind::Null => JsonValue::Null,
            ValueKind::Boolean(boolean) => JsonValue::Bool(*boolean),
            ValueKind::Integer(integer) => JsonValue::from(*integer),
            ValueKind::Double(double) => Number::from_f64(*double)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ValueKind::Timestamp(timestamp) => JsonValue::String(timestamp.to_rfc3339()),
            ValueKind::String(string) => JsonValue::String(string.clone()),
            ValueKind::Bytes(bytes) => JsonValue::String(BASE64_STANDARD.encode(bytes)),
            ValueKind::Reference(reference) => JsonValue::String(reference.clone()),
            ValueKind::GeoPoint(point) => serde_json::json!({
                "latitude": point.latitude(),
                "longitude": point.longitude(),
            }),
            ValueKind::Array(values) => {
                JsonValue::Array(values.iter().map(FirestoreValue::to_json).collect())
            }
            ValueKind::Map(map) => JsonValue::Object(document_data_to_json(map)),
        }
    }
}

impl From<bool> for FirestoreValue {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<i64> for FirestoreValue {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<f64> for FirestoreValue {
    fn from(value: f64) -> Self {
        Self::from_double(value)
    }
}

impl From<&str> for FirestoreValue {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

impl From<String> for FirestoreValue {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

/// Converts a JSON object into document fields.
pub fn document_data_from_json(value: &JsonValue) -> FirestoreResult<DocumentData> {
    match FirestoreValue::from_json(value).kind {
        ValueKind::Map(map) => Ok(map),
        _ => Err(invalid_argument(
            "Document data must be a JSON object",
        )),
    }
}

pub fn document_data_to_json(data: &DocumentData) -> Map<String, JsonValue> {
    data.iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_keep_their_kind() {
        assert_eq!(FirestoreValue::from_json(&json!(42)).as_integer(), Some(42));
        assert_eq!(
            FirestoreValue::from_json(&json!(2.5)).kind(),
            &ValueKind::Double(2.5)
        );
        assert!(matches!(
            FirestoreValue::from_json(&json!(u64::MAX)).kind(),
            ValueKind::Double(_)
        ));
    }

    #[test]
    fn document_data_requires_object() {
        let data = document_data_from_json(&json!({ "name": "Test", "value": 42 })).unwrap();
        assert_eq!(data["name"].as_str(), Some("Test"));
        assert!(document_data_from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn special_types_render_as_text() {
        let value = FirestoreValue::from_map(BTreeMap::from([
            ("raw".to_string(), FirestoreValue::from_bytes(b"hi".to_vec())),
            (
                "at".to_string(),
                FirestoreValue::from_timestamp(Timestamp::new(0, 0)),
            ),
            ("nan".to_string(), FirestoreValue::from_double(f64::NAN)),
        ]));
        assert_eq!(
            value.to_json(),
            json!({ "raw": "aGk=", "at": "1970-01-01T00:00:00Z", "nan": null })
        );
    }
}
