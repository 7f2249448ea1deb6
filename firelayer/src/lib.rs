//! Main firelayer crate: one CRUD and query interface over Firestore's client and admin access paths.
//!
//! Application code that runs both in end-user processes and in trusted server
//! processes usually ends up with two copies of every data access routine, one
//! per Firestore access path. This crate puts both paths behind the same trait,
//! so the routine is written once and the access path is chosen at startup.
//!
//! # Features
//!
//! - **One facade** - [`database::DocumentDatabase`] with get, set, update, delete and query
//! - **Two adapters** - [`client::FirestoreClient`] (security rules apply) and [`admin::FirestoreAdmin`] (privileged)
//! - **Declarative queries** - [`query::QueryOptions`] with where, orderBy, limit and startAfter
//! - **Typed access** - [`store::DocumentStore`] converts records with serde
//! - **Escape hatches** - native document and query snapshots for metadata the facade does not expose
//!
//! # Quick Start
//!
//! ```ignore
//! use firelayer::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context: ExecutionContext = std::env::var("FIRELAYER_CONTEXT")?.parse()?;
//!     let store = create_database(
//!         context,
//!         FirebaseConfig::new()
//!             .with_project_id("my-project")
//!             .with_api_key("AIza..."),
//!     );
//!
//!     store.set_document("users", "user1", &User { name: "John Doe".into(), age: 30 }).await?;
//!
//!     let over_28: Vec<User> = store
//!         .query(
//!             "users",
//!             QueryOptions::builder()
//!                 .filter(Field::new("age").gt(28))
//!                 .order_by("age", Direction::Asc)
//!                 .limit(10)
//!                 .build(),
//!         )
//!         .await?;
//!
//!     println!("{over_28:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Static Dispatch
//!
//! When the access path is known at compile time the adapter can be used
//! directly, which keeps its native snapshot types:
//!
//! ```ignore
//! use firelayer::{prelude::*, admin::FirestoreAdmin};
//!
//! let store = DocumentStore::new(FirestoreAdmin::new());
//! let snapshot = store.get_document_snapshot("users", "user1").await?;
//! println!("last written at {:?}", snapshot.update_time());
//! ```
//!
//! # Adapters
//!
//! - [`client`] - Firebase web API key and optional user ID token
//! - [`admin`] - OAuth2 access token, or the emulator's owner token

pub mod prelude;
pub mod select;

pub use firelayer_core::{config, database, document, error, query, ready, store, value};

pub use select::{ExecutionContext, ParseExecutionContextError, create_database};

/// Client-side adapter, subject to security rules.
pub mod client {
    pub use firelayer_client::{FirestoreClient, FirestoreClientBuilder};
}

/// Admin adapter with privileged access.
pub mod admin {
    pub use firelayer_admin::{EMULATOR_OWNER_TOKEN, FirestoreAdmin, FirestoreAdminBuilder};
}

/// Firestore REST wire types and native snapshots.
pub mod rest {
    pub use firelayer_rest::{
        Credentials, FirestoreDocumentSnapshot, FirestoreQuerySnapshot, RestConnection,
        document::WireDocument,
        value::WireValue,
    };
}
