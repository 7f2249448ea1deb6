//! A unified CRUD and query interface over Firestore's client and admin access paths.
//!
//! This crate is the core of the firelayer project and provides:
//!
//! - **Query descriptors** ([`query`]) - Backend-neutral where/orderBy/limit/cursor options and the translation contract
//! - **Facade traits** ([`database`]) - The operation set every adapter implements, static and dynamic
//! - **Records and snapshots** ([`document`]) - Decoded field maps and the native snapshot traits
//! - **Typed values** ([`value`]) - Timestamps, references and geo points inside JSON records
//! - **Typed store** ([`store`]) - Serde-typed access on top of any adapter
//! - **Readiness** ([`ready`]) - The shared one-shot initialization future each adapter awaits
//! - **Configuration** ([`config`]) - Project, credential and emulator settings
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
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
//! let store = DocumentStore::new(FirestoreAdmin::new());
//! let over_28: Vec<User> = store
//!     .query("users", QueryOptions::builder().filter(Field::new("age").gt(28)).build())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as firelayer_core;

pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod query;
pub mod ready;
pub mod store;
pub mod value;
