//! Convenient re-exports of commonly used types from firelayer.
//!
//! ```ignore
//! use firelayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The facade traits and the typed store
//! - Both adapters and the selector
//! - Query construction and typed values
//! - Configuration and error types

pub use firelayer_core::{
    config::FirebaseConfig,
    database::{DatabaseBuilder, DocumentDatabase, DynDocumentDatabase},
    document::{NativeDocumentSnapshot, NativeQuerySnapshot, Record},
    error::{DatabaseError, DatabaseResult},
    query::{Direction, Field, OrderByClause, QueryBuilder, QueryOptions, WhereClause, WhereOp},
    store::{DocumentStore, DynDocumentStore},
    value::{DocumentReference, GeoPoint, Timestamp},
};
pub use firelayer_admin::FirestoreAdmin;
pub use firelayer_client::FirestoreClient;

pub use crate::select::{ExecutionContext, create_database};
