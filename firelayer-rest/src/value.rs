//! Conversion between plain JSON values and Firestore's typed value encoding.
//!
//! Firestore's REST protocol tags every value with its type, e.g.
//! `{"integerValue": "30"}` or `{"mapValue": {"fields": {...}}}`. Records cross
//! the facade as plain JSON, so values are encoded on the way in and decoded on
//! the way out. Types without a JSON counterpart decode to the tagged objects
//! of [`firelayer_core::value`], which encode back to the same type.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use firelayer_core::{
    document::Record,
    value::{BYTES_TAG, GEO_POINT_TAG, REFERENCE_TAG, TIMESTAMP_TAG},
};

/// A Firestore value in its REST wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integer, transmitted as a decimal string.
    IntegerValue(#[serde(deserialize_with = "int64")] String),
    DoubleValue(#[serde(deserialize_with = "double")] f64),
    /// RFC 3339 timestamp.
    TimestampValue(String),
    StringValue(String),
    /// Base64-encoded bytes.
    BytesValue(String),
    /// Resource name of another document.
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
}

impl WireValue {
    /// Encodes a plain JSON value.
    ///
    /// Integers that fit in 64 bits become `integerValue`; every other number
    /// becomes `doubleValue`. Single-key objects carrying a value tag become
    /// the tagged type.
    pub fn encode(value: &Value) -> WireValue {
        match value {
            Value::Null => WireValue::NullValue(()),
            Value::Bool(b) => WireValue::BooleanValue(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => WireValue::IntegerValue(i.to_string()),
                (None, Some(f)) => WireValue::DoubleValue(f),
                (None, None) => WireValue::NullValue(()),
            },
            Value::String(s) => WireValue::StringValue(s.clone()),
            Value::Array(arr) => WireValue::ArrayValue(ArrayValue {
                values: arr
                    .iter()
                    .map(WireValue::encode)
                    .collect(),
            }),
            Value::Object(map) => encode_tagged(map).unwrap_or_else(|| {
                WireValue::MapValue(MapValue {
                    fields: encode_fields(map),
                })
            }),
        }
    }

    /// Decodes into a plain JSON value.
    pub fn decode(&self) -> Value {
        match self {
            WireValue::NullValue(()) => Value::Null,
            WireValue::BooleanValue(b) => Value::Bool(*b),
            WireValue::IntegerValue(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            WireValue::DoubleValue(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            WireValue::TimestampValue(s) => tagged(TIMESTAMP_TAG, Value::String(normalize_timestamp(s))),
            WireValue::StringValue(s) => Value::String(s.clone()),
            WireValue::BytesValue(s) => tagged(BYTES_TAG, Value::String(s.clone())),
            WireValue::ReferenceValue(s) => tagged(REFERENCE_TAG, Value::String(s.clone())),
            WireValue::GeoPointValue(point) => {
                let mut map = Map::new();
                map.insert("latitude".into(), Value::from(point.latitude));
                map.insert("longitude".into(), Value::from(point.longitude));
                tagged(GEO_POINT_TAG, Value::Object(map))
            }
            WireValue::ArrayValue(arr) => Value::Array(
                arr.values
                    .iter()
                    .map(WireValue::decode)
                    .collect(),
            ),
            WireValue::MapValue(map) => Value::Object(decode_fields(&map.fields)),
        }
    }

    /// Returns `true` for `nullValue`.
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::NullValue(()))
    }
}

/// Encodes every field of a record.
pub fn encode_fields(record: &Record) -> BTreeMap<String, WireValue> {
    record
        .iter()
        .map(|(k, v)| (k.clone(), WireValue::encode(v)))
        .collect()
}

/// Decodes a wire field map into a record.
pub fn decode_fields(fields: &BTreeMap<String, WireValue>) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.decode()))
        .collect()
}

fn tagged(tag: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), value);
    Value::Object(map)
}

/// The typed value a tagged object stands for, if it is one.
///
/// A tag with a malformed payload is left to encode as an ordinary map.
fn encode_tagged(map: &Map<String, Value>) -> Option<WireValue> {
    let mut entries = map.iter();
    let (tag, value) = entries.next()?;
    if entries.next().is_some() {
        return None;
    }

    match (tag.as_str(), value) {
        (TIMESTAMP_TAG, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|_| WireValue::TimestampValue(s.clone())),
        (REFERENCE_TAG, Value::String(s)) => Some(WireValue::ReferenceValue(s.clone())),
        (BYTES_TAG, Value::String(s)) => Some(WireValue::BytesValue(s.clone())),
        (GEO_POINT_TAG, Value::Object(point)) => Some(WireValue::GeoPointValue(LatLng {
            latitude: point.get("latitude")?.as_f64()?,
            longitude: point.get("longitude")?.as_f64()?,
        })),
        _ => None,
    }
}

/// Rewrites a timestamp in UTC with the shortest exact fractional part.
fn normalize_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| {
            ts.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Text(String),
        Number(i64),
    }

    Ok(match Int64::deserialize(deserializer)? {
        Int64::Text(s) => s,
        Int64::Number(n) => n.to_string(),
    })
}

fn double<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Double {
        Number(f64),
        Text(String),
    }

    match Double::deserialize(deserializer)? {
        Double::Number(f) => Ok(f),
        Double::Text(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other.parse().map_err(serde::de::Error::custom),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use firelayer_core::value::{GeoPoint, Timestamp};
    use serde_json::json;

    #[test]
    fn encodes_plain_json() {
        let encoded = WireValue::encode(&json!({
            "name": "Jane Smith",
            "age": 30,
            "score": 4.5,
            "active": true,
            "nickname": null,
            "tags": ["a", 1]
        }));

        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!({ "mapValue": { "fields": {
                "name": { "stringValue": "Jane Smith" },
                "age": { "integerValue": "30" },
                "score": { "doubleValue": 4.5 },
                "active": { "booleanValue": true },
                "nickname": { "nullValue": null },
                "tags": { "arrayValue": { "values": [
                    { "stringValue": "a" },
                    { "integerValue": "1" }
                ] } }
            } } })
        );
    }

    #[test]
    fn decodes_service_responses() {
        let wire: BTreeMap<String, WireValue> = serde_json::from_value(json!({
            "age": { "integerValue": "35" },
            "ratio": { "doubleValue": 1 },
            "createdAt": { "timestampValue": "2024-01-03T00:00:00.000000Z" },
            "author": { "referenceValue": "projects/p/databases/(default)/documents/users/u1" },
            "home": { "geoPointValue": { "latitude": 52.5 } },
            "empty": { "arrayValue": {} },
            "nested": { "mapValue": {} },
            "nan": { "doubleValue": "NaN" }
        }))
        .unwrap();

        assert_eq!(
            Value::Object(decode_fields(&wire)),
            json!({
                "age": 35,
                "ratio": 1.0,
                "createdAt": { "__timestamp__": "2024-01-03T00:00:00Z" },
                "author": { "__reference__": "projects/p/databases/(default)/documents/users/u1" },
                "home": { "__geopoint__": { "latitude": 52.5, "longitude": 0.0 } },
                "empty": [],
                "nested": {},
                "nan": null
            })
        );
    }

    #[test]
    fn records_survive_encoding() {
        let record = json!({
            "name": "Bob Johnson",
            "age": 35,
            "weight": 80.25,
            "createdAt": "2024-01-03T00:00:00Z",
            "joinedAt": { "__timestamp__": "2024-01-03T00:00:00.500Z" },
            "address": { "city": "Paris", "zip": ["75001"] }
        });
        let Value::Object(record) = record else { unreachable!() };

        assert_eq!(decode_fields(&encode_fields(&record)), record);
    }

    #[test]
    fn tagged_values_encode_to_their_types() {
        let encoded = WireValue::encode(&json!({
            "createdAt": { "__timestamp__": "2024-01-03T00:00:00Z" },
            "author": { "__reference__": "projects/p/databases/(default)/documents/users/u1" },
            "avatar": { "__bytes__": "aGVsbG8=" },
            "home": { "__geopoint__": { "latitude": 52.5, "longitude": 13.4 } }
        }));

        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!({ "mapValue": { "fields": {
                "createdAt": { "timestampValue": "2024-01-03T00:00:00Z" },
                "author": { "referenceValue": "projects/p/databases/(default)/documents/users/u1" },
                "avatar": { "bytesValue": "aGVsbG8=" },
                "home": { "geoPointValue": { "latitude": 52.5, "longitude": 13.4 } }
            } } })
        );
    }

    #[test]
    fn malformed_tags_stay_maps() {
        let not_a_time = json!({ "__timestamp__": "yesterday" });
        let two_keys = json!({ "__reference__": "users/u1", "note": "x" });

        assert!(matches!(WireValue::encode(&not_a_time), WireValue::MapValue(_)));
        assert!(matches!(WireValue::encode(&two_keys), WireValue::MapValue(_)));
    }

    #[test]
    fn typed_helpers_encode_like_tags() {
        let at = Timestamp(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());

        assert_eq!(
            WireValue::encode(&Value::from(at)),
            WireValue::TimestampValue("2024-01-03T00:00:00Z".into())
        );
        assert_eq!(
            WireValue::encode(&Value::from(GeoPoint::new(1.5, 2.0))),
            WireValue::GeoPointValue(LatLng { latitude: 1.5, longitude: 2.0 })
        );
    }

    #[test]
    fn integer_values_accept_numbers() {
        let value: WireValue = serde_json::from_value(json!({ "integerValue": 7 })).unwrap();

        assert_eq!(value, WireValue::IntegerValue("7".into()));
        assert_eq!(value.decode(), json!(7));
    }
}
