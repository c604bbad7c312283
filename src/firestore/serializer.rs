use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value as JsonValue};

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::{GeoPoint, Timestamp};
use crate::firestore::value::{DocumentData, FirestoreValue, ValueKind};

/// Wraps document fields the way the REST documents API expects them.
pub fn encode_document(data: &DocumentData) -> JsonValue {
    json!({ "fields": encode_fields(data) })
}

/// Reads the `fields` of a REST document. A document without user fields
/// decodes to an empty map.
pub fn decode_document(document: &JsonValue) -> FirestoreResult<DocumentData> {
    decode_map_value(document)
}

fn encode_fields(data: &DocumentData) -> JsonValue {
    let mut fields = Map::new();
    for (key, value) in data {
        fields.insert(key.clone(), encode_value(value));
    }
    JsonValue::Object(fields)
}

pub fn encode_value(value: &FirestoreValue) -> JsonValue {
    match value.kind() {
        ValueKind::Null => json!({ "nullValue": JsonValue::Null }),
        ValueKind::Boolean(boolean) => json!({ "booleanValue": boolean }),
        ValueKind::Integer(integer) => json!({ "integerValue": integer.to_string() }),
        ValueKind::Double(double) => json!({ "doubleValue": encode_double(*double) }),
        ValueKind::Timestamp(timestamp) => json!({ "timestampValue": timestamp.to_rfc3339() }),
        ValueKind::String(string) => json!({ "stringValue": string }),
        ValueKind::Bytes(bytes) => json!({ "bytesValue": BASE64_STANDARD.encode(bytes) }),
        ValueKind::Reference(reference) => json!({ "referenceValue": reference }),
        ValueKind::GeoPoint(point) => json!({
            "geoPointValue": {
                "latitude": point.latitude(),
                "longitude": point.longitude(),
            }
        }),
        ValueKind::Array(values) => {
            let values = values.iter().map(encode_value).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        ValueKind::Map(map) => json!({
            "mapValue": {
                "fields": encode_fields(map)
            }
        }),
    }
}

/// JSON has no NaN or infinities; the REST API spells them as strings.
fn encode_double(double: f64) -> JsonValue {
    if double.is_nan() {
        json!("NaN")
    } else if double.is_infinite() {
        json!(if double > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        json!(double)
    }
}

fn decode_map_value(value: &JsonValue) -> FirestoreResult<DocumentData> {
    let map = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected object for map value"))?;
    let fields_object = match map.get("fields") {
        Some(fields_value) => fields_value
            .as_object()
            .ok_or_else(|| invalid_argument("Expected 'fields' to be an object"))?,
        None => return Ok(DocumentData::new()),
    };

    fields_object
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

pub fn decode_value(value: &JsonValue) -> FirestoreResult<FirestoreValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected Firestore value object"))?;

    if object.contains_key("nullValue") {
        return Ok(FirestoreValue::null());
    }
    if let Some(bool_value) = object.get("booleanValue") {
        let value = bool_value
            .as_bool()
            .ok_or_else(|| invalid_argument("booleanValue must be bool"))?;
        return Ok(FirestoreValue::from_bool(value));
    }
    if let Some(integer_value) = object.get("integerValue") {
        let parsed = match integer_value {
            JsonValue::String(value) => i64::from_str(value)
                .map_err(|err| invalid_argument(format!("Invalid integerValue: {err}")))?,
            JsonValue::Number(number) => number
                .as_i64()
                .ok_or_else(|| invalid_argument("Integer out of range"))?,
            _ => return Err(invalid_argument("integerValue must be a string or number")),
        };
        return Ok(FirestoreValue::from_integer(parsed));
    }
    if let Some(double_value) = object.get("doubleValue") {
        let parsed = match double_value {
            JsonValue::Number(number) => number
                .as_f64()
                .ok_or_else(|| invalid_argument("Invalid doubleValue"))?,
            // NaN and the infinities arrive as strings.
            JsonValue::String(value) => value
                .parse::<f64>()
                .map_err(|err| invalid_argument(format!("Invalid doubleValue: {err}")))?,
            _ => return Err(invalid_argument("doubleValue must be a number or string")),
        };
        return Ok(FirestoreValue::from_double(parsed));
    }
    if let Some(timestamp_value) = object.get("timestampValue") {
        let timestamp = timestamp_value
            .as_str()
            .ok_or_else(|| invalid_argument("timestampValue must be string"))?;
        return Ok(FirestoreValue::from_timestamp(Timestamp::parse_rfc3339(
            timestamp,
        )?));
    }
    if let Some(string_value) = object.get("stringValue") {
        let value = string_value
            .as_str()
            .ok_or_else(|| invalid_argument("stringValue must be string"))?;
        return Ok(FirestoreValue::from_string(value));
    }
    if let Some(bytes_value) = object.get("bytesValue") {
        let encoded = bytes_value
            .as_str()
            .ok_or_else(|| invalid_argument("bytesValue must be base64 string"))?;
        let decoded = BASE64_STANDARD
            .decode(encoded)
            .map_err(|err| invalid_argument(format!("Invalid bytesValue: {err}")))?;
        return Ok(FirestoreValue::from_bytes(decoded));
    }
    if let Some(reference_value) = object.get("referenceValue") {
        let reference = reference_value
            .as_str()
            .ok_or_else(|| invalid_argument("referenceValue must be string"))?;
        return Ok(FirestoreValue::from_reference(reference));
    }
    if let Some(geo_point) = object.get("geoPointValue") {
        // Zero coordinates are omitted from the wire form.
        let latitude = geo_point
            .get("latitude")
            .and_then(JsonValue::as_f64)
            .unwrap_or_default();
        let longitude = geo_point
            .get("longitude")
            .and_then(JsonValue::as_f64)
            .unwrap_or_default();
        return Ok(FirestoreValue::from_geo_point(GeoPoint::new(
            latitude, longitude,
        )?));
    }
    if let Some(array_value) = object.get("arrayValue") {
        let decoded = match array_value.get("values").and_then(JsonValue::as_array) {
            Some(entries) => entries
                .iter()
                .map(decode_value)
                .collect::<FirestoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        return Ok(FirestoreValue::from_array(decoded));
    }
    if let Some(map_value) = object.get("mapValue") {
        return Ok(FirestoreValue::from_map(decode_map_value(map_value)?));
    }

    Err(invalid_argument("Unknown Firestore value type"))
}
