//! Firestore value types that have no plain JSON counterpart.
//!
//! Records cross the facade as JSON. A timestamp, document reference, byte
//! string or geo point travels as a single-key object whose key is one of the
//! tags below, e.g. `{"__timestamp__": "2024-01-03T00:00:00Z"}`. Firestore
//! reserves field names of the form `__*__`, so a stored map is never mistaken
//! for a tag, and a record read from one adapter can be written back through
//! either adapter without changing field types.
//!
//! The typed wrappers serialize to these tags and can be used directly as
//! record fields, filter values and cursors:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     created_at: Timestamp,
//! }
//! ```

use std::{fmt, str::FromStr};

use chrono::{DateTime, ParseError, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TIMESTAMP_TAG: &str = "__timestamp__";
pub const REFERENCE_TAG: &str = "__reference__";
/// Tag of a base64-encoded byte string.
pub const BYTES_TAG: &str = "__bytes__";
pub const GEO_POINT_TAG: &str = "__geopoint__";

fn tagged(tag: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), value);
    Value::Object(map)
}

/// A point in time, stored as a Firestore timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "TaggedTimestamp", into = "TaggedTimestamp")]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// RFC 3339 in UTC with the shortest exact fractional part.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = ParseError;

    /// Parses an RFC 3339 timestamp in any offset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s).map(|ts| Self(ts.with_timezone(&Utc)))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        tagged(TIMESTAMP_TAG, Value::String(value.to_rfc3339()))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaggedTimestamp {
    #[serde(rename = "__timestamp__")]
    timestamp: DateTime<Utc>,
}

impl From<TaggedTimestamp> for Timestamp {
    fn from(value: TaggedTimestamp) -> Self {
        Self(value.timestamp)
    }
}

impl From<Timestamp> for TaggedTimestamp {
    fn from(value: Timestamp) -> Self {
        Self { timestamp: value.0 }
    }
}

/// Full resource name of another document,
/// `projects/{p}/databases/{d}/documents/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TaggedReference", into = "TaggedReference")]
pub struct DocumentReference(pub String);

impl From<DocumentReference> for Value {
    fn from(value: DocumentReference) -> Self {
        tagged(REFERENCE_TAG, Value::String(value.0))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaggedReference {
    #[serde(rename = "__reference__")]
    reference: String,
}

impl From<TaggedReference> for DocumentReference {
    fn from(value: TaggedReference) -> Self {
        Self(value.reference)
    }
}

impl From<DocumentReference> for TaggedReference {
    fn from(value: DocumentReference) -> Self {
        Self { reference: value.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaggedGeoPoint", into = "TaggedGeoPoint")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl From<GeoPoint> for Value {
    fn from(value: GeoPoint) -> Self {
        let mut point = Map::new();
        point.insert("latitude".into(), Value::from(value.latitude));
        point.insert("longitude".into(), Value::from(value.longitude));
        tagged(GEO_POINT_TAG, Value::Object(point))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaggedGeoPoint {
    #[serde(rename = "__geopoint__")]
    point: LatLng,
}

#[derive(Serialize, Deserialize)]
struct LatLng {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

impl From<TaggedGeoPoint> for GeoPoint {
    fn from(value: TaggedGeoPoint) -> Self {
        Self::new(value.point.latitude, value.point.longitude)
    }
}

impl From<GeoPoint> for TaggedGeoPoint {
    fn from(value: GeoPoint) -> Self {
        Self {
            point: LatLng {
                latitude: value.latitude,
                longitude: value.longitude,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Visit {
        created_at: Timestamp,
        author: DocumentReference,
        place: GeoPoint,
    }

    fn jan_3() -> Timestamp {
        Timestamp(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap())
    }

    #[test]
    fn typed_fields_serialize_to_tags() {
        let visit = Visit {
            created_at: jan_3(),
            author: DocumentReference("projects/p/databases/(default)/documents/users/u1".into()),
            place: GeoPoint::new(52.5, 13.4),
        };
        let expected = json!({
            "createdAt": { "__timestamp__": "2024-01-03T00:00:00Z" },
            "author": { "__reference__": "projects/p/databases/(default)/documents/users/u1" },
            "place": { "__geopoint__": { "latitude": 52.5, "longitude": 13.4 } }
        });

        assert_eq!(serde_json::to_value(&visit).unwrap(), expected);
        assert_eq!(serde_json::from_value::<Visit>(expected).unwrap(), visit);
    }

    #[test]
    fn conversions_into_json_match_serde() {
        assert_eq!(Value::from(jan_3()), serde_json::to_value(jan_3()).unwrap());
        assert_eq!(
            Value::from(GeoPoint::new(1.5, 2.0)),
            serde_json::to_value(GeoPoint::new(1.5, 2.0)).unwrap()
        );
    }

    #[test]
    fn plain_strings_are_not_timestamps() {
        assert!(serde_json::from_value::<Timestamp>(json!("2024-01-03T00:00:00Z")).is_err());
        assert!(
            serde_json::from_value::<Timestamp>(json!({ "__timestamp__": "2024-01-03T00:00:00Z", "x": 1 }))
                .is_err()
        );
    }

    #[test]
    fn parses_and_displays_rfc3339() {
        assert_eq!("2024-01-03T01:00:00+01:00".parse::<Timestamp>().unwrap(), jan_3());
        assert_eq!(jan_3().to_string(), "2024-01-03T00:00:00Z");
        assert!("last tuesday".parse::<Timestamp>().is_err());
    }
}
