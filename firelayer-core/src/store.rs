//! Typed document store over any [`DocumentDatabase`].
//!
//! [`DocumentStore`] adds serde-typed versions of the facade operations on top of
//! an adapter. [`DynDocumentStore`] is the same wrapper around a runtime-selected
//! adapter.
//!
//! # Example
//!
//! ```ignore
//! use firelayer::prelude::*;
//!
//! let store = DocumentStore::new(FirestoreAdmin::new());
//! store.set_document("users", "user1", &user).await?;
//! let user: Option<User> = store.get_document("users", "user1").await?;
//! ```

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    database::{DocumentDatabase, DynDocumentDatabase},
    document::{Record, from_record, to_record},
    error::DatabaseResult,
    query::QueryOptions,
};

/// A typed document store bound to a specific adapter.
#[derive(Debug)]
pub struct DocumentStore<B: DocumentDatabase> {
    database: B,
}

/// A typed document store bound to a runtime-selected adapter.
pub type DynDocumentStore = DocumentStore<Box<dyn DynDocumentDatabase>>;

impl<B: DocumentDatabase> DocumentStore<B> {
    /// Creates a new store over the given adapter.
    pub fn new(database: B) -> Self {
        Self { database }
    }

    /// Returns the underlying adapter.
    pub fn database(&self) -> &B {
        &self.database
    }

    /// Consumes the store and returns the underlying adapter.
    pub fn into_inner(self) -> B {
        self.database
    }

    /// Fetches and decodes one document, or `None` if it does not exist.
    pub async fn get_document<T>(&self, collection: &str, id: &str) -> DatabaseResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.database
            .get_document(collection, id)
            .await?
            .map(from_record)
            .transpose()
    }

    /// Runs an optional query and decodes every result.
    pub async fn get_documents<T>(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        decode_all(
            self.database
                .get_documents(collection, options)
                .await?,
        )
    }

    /// Writes `data` to the document at `id`, replacing any existing content.
    pub async fn set_document<T>(&self, collection: &str, id: &str, data: &T) -> DatabaseResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.database
            .set_document(collection, id, to_record(data)?)
            .await
    }

    /// Merges the serialized fields of `data` into the existing document at `id`.
    ///
    /// Fields that serialize to nothing (e.g. skipped `None`s) are left untouched.
    pub async fn update_document<T>(
        &self,
        collection: &str,
        id: &str,
        data: &T,
    ) -> DatabaseResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.database
            .update_document(collection, id, to_record(data)?)
            .await
    }

    /// Removes the document at `id`. Deleting a missing document succeeds.
    pub async fn delete_document(&self, collection: &str, id: &str) -> DatabaseResult<()> {
        self.database
            .delete_document(collection, id)
            .await
    }

    /// Runs a query and decodes every result.
    pub async fn query<T>(&self, collection: &str, options: QueryOptions) -> DatabaseResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        decode_all(
            self.database
                .query(collection, options)
                .await?,
        )
    }

    /// Reads one document and returns the adapter's native snapshot.
    pub async fn get_document_snapshot(
        &self,
        collection: &str,
        id: &str,
    ) -> DatabaseResult<B::DocumentSnapshot> {
        self.database
            .get_document_snapshot(collection, id)
            .await
    }

    /// Runs a query and returns the adapter's native snapshot.
    pub async fn get_query_snapshot(
        &self,
        collection: &str,
        options: Option<QueryOptions>,
    ) -> DatabaseResult<B::QuerySnapshot> {
        self.database
            .get_query_snapshot(collection, options)
            .await
    }
}

impl<B> DocumentStore<B>
where
    B: DocumentDatabase + 'static,
    B::DocumentSnapshot: Clone,
    B::QuerySnapshot: Clone,
    <B::QuerySnapshot as crate::document::NativeQuerySnapshot>::Document: Clone + 'static,
{
    /// Erases the adapter type.
    pub fn into_dyn(self) -> DynDocumentStore {
        DocumentStore::new(Box::new(self.database))
    }
}

fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> DatabaseResult<Vec<T>> {
    records.into_iter().map(from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{NativeDocumentSnapshot, NativeQuerySnapshot},
        error::DatabaseError,
        query::{Direction, Field},
    };
    use async_trait::async_trait;
    use futures::executor::block_on;
    use serde::Deserialize;
    use serde_json::{Value, json};
    use std::{any::Any, collections::BTreeMap, sync::Mutex};

    #[derive(Debug, Clone)]
    struct FakeSnapshot {
        id: String,
        data: Option<Record>,
    }

    impl NativeDocumentSnapshot for FakeSnapshot {
        fn id(&self) -> &str {
            &self.id
        }

        fn path(&self) -> &str {
            &self.id
        }

        fn exists(&self) -> bool {
            self.data.is_some()
        }

        fn data(&self) -> DatabaseResult<Option<Record>> {
            Ok(self.data.clone())
        }

        fn update_time(&self) -> Option<&str> {
            None
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug, Clone)]
    struct FakeQuerySnapshot(Vec<FakeSnapshot>);

    impl NativeQuerySnapshot for FakeQuerySnapshot {
        type Document = FakeSnapshot;

        fn docs(&self) -> &[FakeSnapshot] {
            &self.0
        }

        fn read_time(&self) -> Option<&str> {
            None
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Single-collection fake that honours equality filters and ignores the rest.
    #[derive(Debug, Default)]
    struct FakeDatabase {
        docs: Mutex<BTreeMap<String, Record>>,
    }

    #[async_trait]
    impl DocumentDatabase for FakeDatabase {
        type DocumentSnapshot = FakeSnapshot;
        type QuerySnapshot = FakeQuerySnapshot;

        async fn set_document(&self, _: &str, id: &str, data: Record) -> DatabaseResult<()> {
            self.docs.lock().unwrap().insert(id.to_string(), data);
            Ok(())
        }

        async fn update_document(&self, _: &str, id: &str, data: Record) -> DatabaseResult<()> {
            let mut docs = self.docs.lock().unwrap();
            let doc = docs.get_mut(id).ok_or_else(|| DatabaseError::Backend {
                status: 404,
                code: "NOT_FOUND".into(),
                message: format!("no entity to update: {id}"),
            })?;
            doc.extend(data);
            Ok(())
        }

        async fn delete_document(&self, _: &str, id: &str) -> DatabaseResult<()> {
            self.docs.lock().unwrap().remove(id);
            Ok(())
        }

        async fn get_document_snapshot(&self, _: &str, id: &str) -> DatabaseResult<FakeSnapshot> {
            Ok(FakeSnapshot {
                id: id.to_string(),
                data: self.docs.lock().unwrap().get(id).cloned(),
            })
        }

        async fn get_query_snapshot(
            &self,
            _: &str,
            options: Option<QueryOptions>,
        ) -> DatabaseResult<FakeQuerySnapshot> {
            let filters = options.map(|o| o.filters).unwrap_or_default();
            let docs = self.docs.lock().unwrap();

            Ok(FakeQuerySnapshot(
                docs.iter()
                    .filter(|(_, doc)| {
                        filters
                            .iter()
                            .all(|clause| doc.get(&clause.field) == Some(&clause.value))
                    })
                    .map(|(id, doc)| FakeSnapshot {
                        id: id.clone(),
                        data: Some(doc.clone()),
                    })
                    .collect(),
            ))
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[derive(Serialize)]
    struct AgePatch {
        age: u32,
    }

    fn john() -> User {
        User {
            name: "John Doe".into(),
            age: 30,
        }
    }

    #[test]
    fn typed_round_trip_and_missing_document() {
        let store = DocumentStore::new(FakeDatabase::default());

        block_on(async {
            store.set_document("users", "user1", &john()).await.unwrap();

            assert_eq!(
                store.get_document::<User>("users", "user1").await.unwrap(),
                Some(john())
            );
            assert_eq!(store.get_document::<User>("users", "nobody").await.unwrap(), None);
        });
    }

    #[test]
    fn typed_update_keeps_untouched_fields() {
        let store = DocumentStore::new(FakeDatabase::default());

        block_on(async {
            store.set_document("users", "user1", &john()).await.unwrap();
            store
                .update_document("users", "user1", &AgePatch { age: 31 })
                .await
                .unwrap();

            let user: User = store.get_document("users", "user1").await.unwrap().unwrap();
            assert_eq!(user.age, 31);
            assert_eq!(user.name, "John Doe");
        });
    }

    #[test]
    fn update_of_missing_document_passes_backend_error_through() {
        let store = DocumentStore::new(FakeDatabase::default());

        let err = block_on(store.update_document("users", "ghost", &AgePatch { age: 1 }))
            .unwrap_err();

        assert_eq!(err.backend_code(), Some("NOT_FOUND"));
    }

    #[test]
    fn non_object_data_is_rejected_before_reaching_the_backend() {
        let store = DocumentStore::new(FakeDatabase::default());

        let err = block_on(store.set_document("users", "user1", &[1, 2, 3])).unwrap_err();

        assert!(matches!(err, DatabaseError::InvalidDocument(_)));
        assert!(store.database().docs.lock().unwrap().is_empty());
    }

    #[test]
    fn dyn_store_behaves_like_the_static_one() {
        let store = DocumentStore::new(FakeDatabase::default()).into_dyn();

        block_on(async {
            store.set_document("users", "user1", &john()).await.unwrap();
            store
                .set_document("users", "user2", &json!({ "name": "Jane Smith", "age": 25 }))
                .await
                .unwrap();

            let adults: Vec<User> = store
                .query(
                    "users",
                    QueryOptions::builder()
                        .filter(Field::new("age").eq(30))
                        .order_by("age", Direction::Asc)
                        .build(),
                )
                .await
                .unwrap();
            assert_eq!(adults, vec![john()]);

            let snapshot = store.get_query_snapshot("users", None).await.unwrap();
            assert_eq!(snapshot.len(), 2);
            assert!(snapshot.downcast_ref::<FakeQuerySnapshot>().is_some());

            let doc = store.get_document_snapshot("users", "user2").await.unwrap();
            assert!(doc.exists());
            assert!(doc.as_any().downcast_ref::<FakeSnapshot>().is_some());

            store.delete_document("users", "user2").await.unwrap();
            store.delete_document("users", "user2").await.unwrap();
            assert_eq!(store.get_document::<Value>("users", "user2").await.unwrap(), None);

            assert!((**store.database()).as_any().downcast_ref::<FakeDatabase>().is_some());
        });
    }
}
