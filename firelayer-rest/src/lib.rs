//! Firestore REST protocol shared by the client and admin adapters.
//!
//! Both adapters talk to the same service through the same wire format and
//! differ only in how requests are authorized. This crate holds everything they
//! have in common:
//!
//! - [`value`]: typed value encoding (`{"integerValue": "30"}`) to and from plain JSON
//! - [`query`]: the [`QueryTranslator`](firelayer_core::query::QueryTranslator) for structured queries
//! - [`write`]: commit writes for set, update and delete
//! - [`document`]: the native document and query snapshots
//! - [`connection`]: the HTTP connection and error decoding
//! - [`database`]: the facade implementation each adapter delegates to
//!
//! Requests go to `https://firestore.googleapis.com/v1/`, or to
//! `http://{FIRESTORE_EMULATOR_HOST}/v1/` when an emulator host is configured.

#[allow(unused_extern_crates)]
extern crate self as firelayer_rest;

pub mod connection;
pub mod database;
pub mod document;
pub mod path;
pub mod query;
pub mod value;
pub mod write;

pub use connection::{Credentials, RestConnection};
pub use database::RestDatabase;
pub use document::{FirestoreDocumentSnapshot, FirestoreQuerySnapshot};
