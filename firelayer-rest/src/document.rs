//! Firestore documents and the native snapshot types returned by both adapters.

use std::{any::Any, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use firelayer_core::{
    document::{NativeDocumentSnapshot, NativeQuerySnapshot, Record},
    error::DatabaseResult,
};

use crate::value::{WireValue, decode_fields};

/// A document resource as sent and received by the REST protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireDocument {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{path}`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub fields: BTreeMap<String, WireValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl WireDocument {
    /// The last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map(|(_, id)| id)
            .unwrap_or(&self.name)
    }
}

/// Body of `documents:batchGet`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchGetRequest {
    /// Full resource names of the documents to read.
    pub documents: Vec<String>,
}

/// One element of the `documents:batchGet` response stream.
///
/// Exactly one of `found` and `missing` is set for each requested document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchGetResponse {
    pub found: Option<WireDocument>,
    /// Resource name of a requested document that does not exist.
    pub missing: Option<String>,
    pub read_time: Option<String>,
}

impl BatchGetResponse {
    /// The snapshot this element describes, if it describes a document at all.
    pub fn into_snapshot(self) -> Option<FirestoreDocumentSnapshot> {
        match (self.found, self.missing) {
            (Some(document), _) => Some(FirestoreDocumentSnapshot::found(document, self.read_time)),
            (None, Some(path)) => Some(FirestoreDocumentSnapshot::missing(path, self.read_time)),
            (None, None) => None,
        }
    }
}

/// Result of a single-document read.
///
/// A read of a missing document still produces a snapshot, with
/// [`exists`](NativeDocumentSnapshot::exists) returning `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreDocumentSnapshot {
    id: String,
    path: String,
    document: Option<WireDocument>,
    read_time: Option<String>,
}

impl FirestoreDocumentSnapshot {
    pub fn found(document: WireDocument, read_time: Option<String>) -> Self {
        Self {
            id: document.id().to_string(),
            path: document.name.clone(),
            document: Some(document),
            read_time,
        }
    }

    pub fn missing(path: impl Into<String>, read_time: Option<String>) -> Self {
        let path = path.into();
        let id = path
            .rsplit_once('/')
            .map(|(_, id)| id)
            .unwrap_or(&path)
            .to_string();

        Self {
            id,
            path,
            document: None,
            read_time,
        }
    }

    /// The raw document, with fields still in their typed wire form.
    pub fn document(&self) -> Option<&WireDocument> {
        self.document.as_ref()
    }

    /// Server time at which the document was created.
    pub fn create_time(&self) -> Option<&str> {
        self.document
            .as_ref()
            .and_then(|doc| doc.create_time.as_deref())
    }

    pub fn read_time(&self) -> Option<&str> {
        self.read_time.as_deref()
    }
}

impl NativeDocumentSnapshot for FirestoreDocumentSnapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn exists(&self) -> bool {
        self.document.is_some()
    }

    fn data(&self) -> DatabaseResult<Option<Record>> {
        Ok(self
            .document
            .as_ref()
            .map(|doc| decode_fields(&doc.fields)))
    }

    fn update_time(&self) -> Option<&str> {
        self.document
            .as_ref()
            .and_then(|doc| doc.update_time.as_deref())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Result of a query, documents in result order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirestoreQuerySnapshot {
    docs: Vec<FirestoreDocumentSnapshot>,
    read_time: Option<String>,
}

impl FirestoreQuerySnapshot {
    pub fn new(docs: Vec<FirestoreDocumentSnapshot>, read_time: Option<String>) -> Self {
        Self { docs, read_time }
    }

    pub fn into_docs(self) -> Vec<FirestoreDocumentSnapshot> {
        self.docs
    }
}

impl NativeQuerySnapshot for FirestoreQuerySnapshot {
    type Document = FirestoreDocumentSnapshot;

    fn docs(&self) -> &[FirestoreDocumentSnapshot] {
        &self.docs
    }

    fn read_time(&self) -> Option<&str> {
        self.read_time.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
