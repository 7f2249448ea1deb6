//! Commit writes for set, update and delete.
//!
//! All three mutations go through the `documents:commit` method with a single
//! write, so each one is atomic on the service side:
//!
//! - set: an `update` write without a mask, replacing or creating the document
//! - update: an `update` write with a field mask and an `exists` precondition
//! - delete: a `delete` write without precondition, so missing documents succeed

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use firelayer_core::document::Record;

use crate::{
    document::WireDocument,
    path::canonical_field_path,
    value::{MapValue, WireValue, encode_fields},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

impl From<Write> for CommitRequest {
    fn from(write: Write) -> Self {
        Self {
            writes: vec![write],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitResponse {
    pub commit_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    #[serde(flatten)]
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Update(WireDocument),
    /// Resource name of the document to delete.
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Precondition {
    pub exists: bool,
}

impl Write {
    /// Replaces the document `name` with `data`, creating it if needed.
    pub fn set(name: String, data: &Record) -> Self {
        Self {
            operation: Operation::Update(WireDocument {
                name,
                fields: encode_fields(data),
                ..WireDocument::default()
            }),
            update_mask: None,
            current_document: None,
        }
    }

    /// Overwrites only the given fields of the existing document `name`.
    ///
    /// Keys containing dots address nested fields: `{"address.city": "Paris"}`
    /// changes `city` inside `address` and keeps its siblings.
    pub fn update(name: String, data: &Record) -> Self {
        let mut fields = BTreeMap::new();
        let mut field_paths = Vec::with_capacity(data.len());

        for (key, value) in data {
            let segments: Vec<&str> = key.split('.').collect();
            insert_nested(&mut fields, &segments, WireValue::encode(value));
            field_paths.push(canonical_field_path(key));
        }

        Self {
            operation: Operation::Update(WireDocument {
                name,
                fields,
                ..WireDocument::default()
            }),
            update_mask: Some(DocumentMask { field_paths }),
            current_document: Some(Precondition { exists: true }),
        }
    }

    pub fn delete(name: String) -> Self {
        Self {
            operation: Operation::Delete(name),
            update_mask: None,
            current_document: None,
        }
    }
}

fn insert_nested(fields: &mut BTreeMap<String, WireValue>, segments: &[&str], value: WireValue) {
    match segments {
        [] => {}
        [last] => {
            fields.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = fields
                .entry(first.to_string())
                .or_insert_with(|| WireValue::MapValue(MapValue::default()));

            if !matches!(entry, WireValue::MapValue(_)) {
                *entry = WireValue::MapValue(MapValue::default());
            }
            if let WireValue::MapValue(map) = entry {
                insert_nested(&mut map.fields, rest, value);
            }
        }
    }
}
