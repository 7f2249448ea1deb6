//! Client-side Firestore adapter for firelayer.
//!
//! This crate provides the adapter used by end-user applications: requests are
//! authorized with the Firebase web API key and, when a user is signed in, their
//! Firebase Authentication ID token, so every read and write is subject to the
//! project's security rules.
//!
//! Only the explicit [`FirebaseConfig`](firelayer_core::config::FirebaseConfig)
//! is consulted. Ambient environment variables are ignored, so the same
//! configuration behaves the same on every machine.
//!
//! # Quick Start
//!
//! ```ignore
//! use firelayer::{client::FirestoreClient, prelude::*};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FirestoreClient::new(
//!         FirebaseConfig::new()
//!             .with_project_id("my-project")
//!             .with_api_key("AIza..."),
//!     );
//!     client.ready().await?;
//!
//!     let store = DocumentStore::new(client);
//!     store.set_document("users", "user1", &json!({ "name": "John Doe", "age": 30 })).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as firelayer_client;

pub mod database;

pub use database::{FirestoreClient, FirestoreClientBuilder};
