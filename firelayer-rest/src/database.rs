//! The facade implementation both adapters share.
//!
//! [`RestDatabase`] implements [`DocumentDatabase`] once on top of a
//! [`Readiness<RestConnection>`]. Each adapter owns one and forwards the facade
//! to it with [`delegate_document_database!`](crate::delegate_document_database),
//! so the client and admin paths differ only in how the connection is set up.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use firelayer_core::{
    database::DocumentDatabase,
    document::Record,
    error::DatabaseResult,
    query::QueryOptions,
    ready::Readiness,
};

use crate::{
    connection::RestConnection,
    document::{FirestoreDocumentSnapshot, FirestoreQuerySnapshot},
};

/// A lazily connected Firestore database.
#[derive(Debug, Clone)]
pub struct RestDatabase {
    ready: Readiness<RestConnection>,
}

impl RestDatabase {
    /// Wraps the connection setup. Nothing runs until the first operation.
    pub fn new<F>(init: F) -> Self
    where
        F: Future<Output = DatabaseResult<RestConnection>> + Send + 'static,
    {
        Self {
            ready: Readiness::new(init),
        }
    }

    /// Waits for the connection to be set up, surfacing initialization errors early.
    pub async fn ready(&self) -> DatabaseResult<()> {
        self.ready.wait().await.map(|_| ())
    }

    pub async fn connection(&self) -> DatabaseResult<Arc<RestConnection>> {
        self.ready.wait().await
    }

    pub fn readiness(&self) -> &Readiness<RestConnection> {
        &self.ready
    }
}

#[async_trait]
impl DocumentDatabase for RestDatabase {
    type DocumentSnapshot = FirestoreDocumentSnapshot;
    type QuerySnapshot = FirestoreQuerySnapshot;

    async fn set_document(&self, collection: &str, id: &str, data: Record) -> DatabaseResult<()> {
        self.connection()
            .await?
            .set_document(collection, id, &data)
            .await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Record,
    ) -> DatabaseResult<()> {
        self.connection()
            .await?
            .update_document(collection, id, &data)
            .await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()> {
        self.connection()
            .await?
            .delete_document(collection, id)
            .await
    }

    async fn get_document_snapshot(
        &self,
        collection: &str,
        id: &str,
    ) -> DatabaseResult<FirestoreDocumentSnapshot> {
        self.connection()
            .await?
            .get_document(collection, id)
            .await
    }

    async fn get_query_snapshot(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<FirestoreQuerySnapshot> {
        self.connection()
            .await?
            .run_query(collection, options.as_ref())
            .await
    }
}

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use firelayer_core::{
        database::DocumentDatabase,
        document::Record,
        error::DatabaseResult,
        query::QueryOptions,
    };
}

/// Implements [`DocumentDatabase`] for an adapter by forwarding every operation
/// to its [`RestDatabase`] field.
///
/// ```ignore
/// pub struct FirestoreClient {
///     database: RestDatabase,
/// }
///
/// firelayer_rest::delegate_document_database!(FirestoreClient => database);
/// ```
#[macro_export]
macro_rules! delegate_document_database {
    ($adapter:ty => $field:ident) => {
        #[$crate::database::__private::async_trait]
        impl $crate::database::__private::DocumentDatabase for $adapter {
            type DocumentSnapshot = $crate::FirestoreDocumentSnapshot;
            type QuerySnapshot = $crate::FirestoreQuerySnapshot;

            async fn set_document(
                &self,
                collection: &str,
                id: &str,
                data: $crate::database::__private::Record,
            ) -> $crate::database::__private::DatabaseResult<()> {
                $crate::database::__private::DocumentDatabase::set_document(&self.$field, collection, id, data)
                    .await
            }

            async fn update_document(
                &self,
                collection: &str,
                id: &str,
                data: $crate::database::__private::Record,
            ) -> $crate::database::__private::DatabaseResult<()> {
                $crate::database::__private::DocumentDatabase::update_document(&self.$field, collection, id, data)
                    .await
            }

            async fn delete_document(
                &self,
                collection: &str,
                id: &str,
            ) -> $crate::database::__private::DatabaseResult<()> {
                $crate::database::__private::DocumentDatabase::delete_document(&self.$field, collection, id).await
            }

            async fn get_document_snapshot(
                &self,
                collection: &str,
                id: &str,
            ) -> $crate::database::__private::DatabaseResult<$crate::FirestoreDocumentSnapshot> {
                $crate::database::__private::DocumentDatabase::get_document_snapshot(&self.$field, collection, id)
                    .await
            }

            async fn get_query_snapshot(
                &self,
                collection: &str,
                options: Option<$crate::database::__private::QueryOptions>,
            ) -> $crate::database::__private::DatabaseResult<$crate::FirestoreQuerySnapshot> {
                $crate::database::__private::DocumentDatabase::get_query_snapshot(&self.$field, collection, options)
                    .await
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use firelayer_core::error::DatabaseError;
    use futures::executor::block_on;

    #[derive(Debug, Clone)]
    struct Adapter {
        database: RestDatabase,
    }

    crate::delegate_document_database!(Adapter => database);

    fn failing() -> Adapter {
        Adapter {
            database: RestDatabase::new(async {
                Err::<RestConnection, _>(DatabaseError::Initialization("no project".into()))
            }),
        }
    }

    #[test]
    fn delegated_operations_share_the_setup_outcome() {
        let adapter = failing();

        let read = block_on(adapter.get_document("users", "user1")).unwrap_err();
        let write = block_on(adapter.set_document("users", "user1", Record::new())).unwrap_err();
        let ready = block_on(adapter.database.ready()).unwrap_err();

        assert_eq!(read, DatabaseError::Initialization("no project".into()));
        assert_eq!(read, write);
        assert_eq!(read, ready);
        assert!(adapter.database.readiness().peek().is_some());
    }
}
