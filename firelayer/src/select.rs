//! Runtime choice between the client and the admin adapter.
//!
//! The choice is made once, when the store is created. Code written against the
//! returned [`DynDocumentStore`] does not know or care which adapter backs it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use firelayer_admin::FirestoreAdmin;
use firelayer_client::FirestoreClient;
use firelayer_core::{
    config::FirebaseConfig,
    database::DynDocumentDatabase,
    store::{DocumentStore, DynDocumentStore},
};

/// Which access path the current process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// End-user code; requests are subject to security rules.
    Client,
    /// Trusted server code with administrative privileges.
    Admin,
}

impl ExecutionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionContext::Client => "client",
            ExecutionContext::Admin => "admin",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown execution context {0:?}, expected \"client\" or \"admin\"")]
pub struct ParseExecutionContextError(pub String);

impl FromStr for ExecutionContext {
    type Err = ParseExecutionContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(ExecutionContext::Client),
            "admin" => Ok(ExecutionContext::Admin),
            _ => Err(ParseExecutionContextError(s.to_string())),
        }
    }
}

/// Creates the adapter for `context` and wraps it in a typed store.
///
/// The adapter connects on first use; configuration problems surface from the
/// first operation (or from `ready()` on the concrete adapter).
pub fn create_database(context: ExecutionContext, config: FirebaseConfig) -> DynDocumentStore {
    let database: Box<dyn DynDocumentDatabase> = match context {
        ExecutionContext::Client => Box::new(FirestoreClient::new(config)),
        ExecutionContext::Admin => Box::new(FirestoreAdmin::with_config(config)),
    };

    DocumentStore::new(database)
}
