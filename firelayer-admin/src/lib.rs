//! Admin Firestore adapter for firelayer.
//!
//! This crate provides the adapter used by trusted server-side code. Requests
//! carry an OAuth2 access token (or the emulator's `owner` token) and are not
//! evaluated against security rules.
//!
//! Settings missing from the explicit configuration are taken from the process
//! environment when the adapter initializes:
//!
//! | Variable                     | Setting                     |
//! |------------------------------|-----------------------------|
//! | `FIRESTORE_EMULATOR_HOST`    | emulator `host:port`        |
//! | `GOOGLE_CLOUD_PROJECT`       | project id                  |
//! | `GCLOUD_PROJECT`             | project id (legacy name)    |
//! | `GOOGLE_OAUTH_ACCESS_TOKEN`  | access token                |
//!
//! # Example
//!
//! ```ignore
//! use firelayer::{admin::FirestoreAdmin, prelude::*};
//!
//! // FIRESTORE_EMULATOR_HOST=localhost:8080 GOOGLE_CLOUD_PROJECT=demo-test-project
//! let store = DocumentStore::new(FirestoreAdmin::new());
//! let users: Vec<serde_json::Value> = store.get_documents("users", None).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as firelayer_admin;

pub mod database;

pub use database::{EMULATOR_OWNER_TOKEN, FirestoreAdmin, FirestoreAdminBuilder};
