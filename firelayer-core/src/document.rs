//! Document records, typed conversions and native snapshot traits.
//!
//! Documents cross the facade as [`Record`]s: plain field maps without the
//! document identifier. Typed callers convert with [`to_record`] and
//! [`from_record`]. The snapshot traits describe the metadata every backend's
//! native result object exposes beyond plain field data.

use std::{any::Any, fmt::Debug};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{DatabaseError, DatabaseResult};

/// Decoded field data of a single document.
pub type Record = Map<String, Value>;

/// Serializes a typed value into a [`Record`].
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidDocument`] if the value does not serialize to a
/// JSON object, and [`DatabaseError::Serialization`] if serialization fails.
pub fn to_record<T: Serialize + ?Sized>(value: &T) -> DatabaseResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        other => Err(DatabaseError::InvalidDocument(format!(
            "expected a field map, got {}",
            kind_of(&other)
        ))),
    }
}

/// Deserializes a [`Record`] into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> DatabaseResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A backend's native result for a single-document read.
pub trait NativeDocumentSnapshot: Send + Sync + Debug {
    /// The document id within its collection.
    fn id(&self) -> &str;

    /// The full resource path of the document.
    fn path(&self) -> &str;

    /// Whether the document existed at read time.
    fn exists(&self) -> bool;

    /// Decodes the field data, or `None` when the document does not exist.
    fn data(&self) -> DatabaseResult<Option<Record>>;

    /// Server time of the last write, if the document exists.
    fn update_time(&self) -> Option<&str>;

    fn as_any(&self) -> &dyn Any;
}

/// A backend's native result for a query.
pub trait NativeQuerySnapshot: Send + Sync + Debug {
    type Document: NativeDocumentSnapshot;

    /// Matching documents in result order.
    fn docs(&self) -> &[Self::Document];

    /// Server time at which the query was evaluated.
    fn read_time(&self) -> Option<&str>;

    fn len(&self) -> usize {
        self.docs().len()
    }

    fn is_empty(&self) -> bool {
        self.docs().is_empty()
    }

    fn as_any(&self) -> &dyn Any;
}

impl NativeDocumentSnapshot for Box<dyn NativeDocumentSnapshot> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn path(&self) -> &str {
        (**self).path()
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn data(&self) -> DatabaseResult<Option<Record>> {
        (**self).data()
    }

    fn update_time(&self) -> Option<&str> {
        (**self).update_time()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
}

/// Query snapshot with type-erased documents, used behind dynamic dispatch.
#[derive(Debug)]
pub struct DynQuerySnapshot {
    docs: Vec<Box<dyn NativeDocumentSnapshot>>,
    read_time: Option<String>,
    native: Box<dyn Any + Send + Sync>,
}

impl DynQuerySnapshot {
    /// Erases a concrete query snapshot, keeping the original for downcasting.
    pub fn new<Q>(snapshot: Q) -> Self
    where
        Q: NativeQuerySnapshot + Clone + 'static,
        Q::Document: Clone + 'static,
    {
        Self {
            docs: snapshot
                .docs()
                .iter()
                .cloned()
                .map(|doc| Box::new(doc) as Box<dyn NativeDocumentSnapshot>)
                .collect(),
            read_time: snapshot.read_time().map(str::to_string),
            native: Box::new(snapshot),
        }
    }

    /// Returns the concrete snapshot this value was created from.
    pub fn downcast_ref<Q: 'static>(&self) -> Option<&Q> {
        self.native.downcast_ref()
    }
}

impl NativeQuerySnapshot for DynQuerySnapshot {
    type Document = Box<dyn NativeDocumentSnapshot>;

    fn docs(&self) -> &[Self::Document] {
        &self.docs
    }

    fn read_time(&self) -> Option<&str> {
        self.read_time.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn typed_values_convert_through_records() {
        let user = User {
            name: "Jane Smith".into(),
            age: 30,
        };

        let record = to_record(&user).unwrap();
        assert_eq!(Value::Object(record.clone()), json!({ "name": "Jane Smith", "age": 30 }));
        assert_eq!(from_record::<User>(record).unwrap(), user);
    }

    #[test]
    fn non_object_values_are_invalid_documents() {
        assert_eq!(
            to_record(&vec![1, 2]).unwrap_err(),
            DatabaseError::InvalidDocument("expected a field map, got an array".into())
        );
        assert!(matches!(
            to_record(&"text").unwrap_err(),
            DatabaseError::InvalidDocument(_)
        ));
    }

    #[test]
    fn missing_fields_fail_to_decode() {
        let record = to_record(&json!({ "name": "John Doe" })).unwrap();

        assert!(matches!(
            from_record::<User>(record).unwrap_err(),
            DatabaseError::Serialization(_)
        ));
    }
}
