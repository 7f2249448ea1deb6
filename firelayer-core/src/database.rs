//! The unified facade implemented by every backend adapter.
//!
//! # Overview
//!
//! [`DocumentDatabase`] is the capability set shared by the client and the admin
//! adapters: single-document CRUD, queries, and two escape hatches returning the
//! backend's native snapshot objects. Calling code depends only on this trait (or
//! on [`DynDocumentDatabase`] when the adapter is chosen at runtime) and never on
//! which adapter backs it.
//!
//! # Traits
//!
//! - [`DocumentDatabase`]: the facade, with the native snapshot types as associated types
//! - [`DynDocumentDatabase`]: an object-safe form for dynamic dispatch
//! - [`DatabaseBuilder`]: factory trait for creating adapter instances
//!
//! # Initialization
//!
//! Adapters establish their connection lazily. Every method waits for that
//! initialization before issuing a request; if it failed, every method fails with
//! the same [`DatabaseError::Initialization`](crate::error::DatabaseError::Initialization).

use async_trait::async_trait;
use std::{any::Any, fmt::Debug};

use crate::{
    document::{DynQuerySnapshot, NativeDocumentSnapshot, NativeQuerySnapshot, Record},
    error::DatabaseResult,
    query::QueryOptions,
};

/// Abstract CRUD and query interface over one document database.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Calls may be issued concurrently; the
/// adapter performs no ordering of its own, so two concurrent writes to the same
/// document resolve however the database service resolves them.
///
/// # Error Handling
///
/// Failures reported by the database service are returned verbatim. A missing
/// document on [`get_document`](Self::get_document) is `Ok(None)`, never an error.
#[async_trait]
pub trait DocumentDatabase: Send + Sync + Debug {
    /// The native result of a single-document read.
    type DocumentSnapshot: NativeDocumentSnapshot + 'static;
    /// The native result of a query.
    type QuerySnapshot: NativeQuerySnapshot + 'static;

    /// Fetches one document by id, or `None` if it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> DatabaseResult<Option<Record>> {
        self.get_document_snapshot(collection, id)
            .await?
            .data()
    }

    /// Runs a query and returns the decoded documents in result order.
    ///
    /// With `None` this is an unfiltered scan of the collection.
    async fn get_documents(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Vec<Record>> {
        let snapshot = self.get_query_snapshot(collection, options).await?;
        let mut records = Vec::with_capacity(snapshot.len());

        for doc in snapshot.docs() {
            if let Some(record) = doc.data()? {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Writes the document at `id`, replacing any existing content.
    async fn set_document(&self, collection: &str, id: &str, data: Record) -> DatabaseResult<()>;

    /// Merges the given fields into the existing document at `id`.
    ///
    /// Fails with the backend's error if the document does not exist. Keys
    /// containing dots address nested fields.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> DatabaseResult<()>;

    /// Removes the document at `id`. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()>;

    /// Same as [`get_documents`](Self::get_documents) with mandatory options.
    async fn query(&self, collection: &str, options: QueryOptions) -> DatabaseResult<Vec<Record>> {
        DocumentDatabase::get_documents(self, collection, Some(options)).await
    }

    /// Reads one document and returns the backend's native snapshot.
    async fn get_document_snapshot(
        &self,
        collection: &str,
        id: &str,
    ) -> DatabaseResult<Self::DocumentSnapshot>;

    /// Runs a query and returns the backend's native snapshot.
    async fn get_query_snapshot(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Self::QuerySnapshot>;
}

/// Object-safe form of [`DocumentDatabase`] with type-erased snapshots.
///
/// Every [`DocumentDatabase`] implements this trait, and
/// `Box<dyn DynDocumentDatabase>` implements [`DocumentDatabase`] again, so a
/// runtime-selected adapter can be used anywhere a static one can.
#[async_trait]
pub trait DynDocumentDatabase: Send + Sync + Debug {
    async fn dyn_get_document(&self, collection: &str, id: &str) -> DatabaseResult<Option<Record>>;
    async fn dyn_get_documents(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Vec<Record>>;
    async fn dyn_set_document(&self, collection: &str, id: &str, data: Record) -> DatabaseResult<()>;
    async fn dyn_update_document(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> DatabaseResult<()>;
    async fn dyn_delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()>;
    async fn dyn_query(&self, collection: &str, options: QueryOptions) -> DatabaseResult<Vec<Record>>;
    async fn dyn_get_document_snapshot(
        &self,
        collection: &str,
        id: &str,
    ) -> DatabaseResult<Box<dyn NativeDocumentSnapshot>>;
    async fn dyn_get_query_snapshot(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<DynQuerySnapshot>;

    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<B> DynDocumentDatabase for B
where
    B: DocumentDatabase + 'static,
    B::DocumentSnapshot: Clone,
    B::QuerySnapshot: Clone,
    <B::QuerySnapshot as NativeQuerySnapshot>::Document: Clone + 'static,
{
    async fn dyn_get_document(&self, collection: &str, id: &str) -> DatabaseResult<Option<Record>> {
        DocumentDatabase::get_document(self, collection, id).await
    }

    async fn dyn_get_documents(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Vec<Record>> {
        DocumentDatabase::get_documents(self, collection, options).await
    }

    async fn dyn_set_document(&self, collection: &str, id: &str, data: Record) -> DatabaseResult<()> {
        DocumentDatabase::set_document(self, collection, id, data).await
    }

    async fn dyn_update_document(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> DatabaseResult<()> {
        DocumentDatabase::update_document(self, collection, id, data).await
    }

    async fn dyn_delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()> {
        DocumentDatabase::delete_document(self, collection, id).await
    }

    async fn dyn_query(&self, collection: &str, options: QueryOptions) -> DatabaseResult<Vec<Record>> {
        DocumentDatabase::query(self, collection, options).await
    }

    async fn dyn_get_document_snapshot(
        &self,
        collection: &str,
        id: &str,
    ) -> DatabaseResult<Box<dyn NativeDocumentSnapshot>> {
        Ok(Box::new(
            self.get_document_snapshot(collection, id)
                .await?,
        ))
    }

    async fn dyn_get_query_snapshot(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<DynQuerySnapshot> {
        Ok(DynQuerySnapshot::new(
            self.get_query_snapshot(collection, options)
                .await?,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[async_trait]
impl DocumentDatabase for Box<dyn DynDocumentDatabase> {
    type DocumentSnapshot = Box<dyn NativeDocumentSnapshot>;
    type QuerySnapshot = DynQuerySnapshot;

    async fn get_document(&self, collection: &str, id: &str) -> DatabaseResult<Option<Record>> {
        (**self).dyn_get_document(collection, id).await
    }

    async fn get_documents(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Vec<Record>> {
        (**self).dyn_get_documents(collection, options).await
    }

    async fn set_document(&self, collection: &str, id: &str, data: Record) -> DatabaseResult<()> {
        (**self).dyn_set_document(collection, id, data).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> DatabaseResult<()> {
        (**self).dyn_update_document(collection, id, data).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()> {
        (**self).dyn_delete_document(collection, id).await
    }

    async fn query(&self, collection: &str, options: QueryOptions) -> DatabaseResult<Vec<Record>> {
        (**self).dyn_query(collection, options).await
    }

    async fn get_document_snapshot(
        &self,
        collection: &str,
        id: &str,
    ) -> DatabaseResult<Self::DocumentSnapshot> {
        (**self)
            .dyn_get_document_snapshot(collection, id)
            .await
    }

    async fn get_query_snapshot(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Self::QuerySnapshot> {
        (**self)
            .dyn_get_query_snapshot(collection, options)
            .await
    }
}

/// Factory trait for creating adapter instances from configuration.
pub trait DatabaseBuilder {
    type Database: DocumentDatabase;

    /// Constructs the adapter. Its connection is established on first use.
    fn build(self) -> Self::Database;
}
