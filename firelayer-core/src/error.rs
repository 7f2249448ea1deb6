//! Error types and result types for document database operations.
//!
//! Use [`DatabaseResult<T>`] as the return type for fallible operations. Failures
//! raised by the database service are carried through unchanged in
//! [`DatabaseError::Backend`]; the only condition normalised by this crate is a
//! missing document on a single read, which is `Ok(None)` rather than an error.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a document database.
///
/// The type is `Clone` so that a failed initialisation can be stored once and
/// handed to every later caller of the same adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// Serialization/deserialization error when converting between records and typed values.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during adapter initialization or connection setup.
    ///
    /// Once an adapter has failed to initialize, every call on it returns this error.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The value passed as document data is not a field map.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The request could not be delivered or no response was received.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The database service rejected the request.
    ///
    /// `status` is the HTTP status, `code` the canonical status name reported by
    /// the service (for example `NOT_FOUND` or `PERMISSION_DENIED`).
    #[error("Backend error ({status} {code}): {message}")]
    Backend {
        status: u16,
        code: String,
        message: String,
    },
}

impl DatabaseError {
    /// Returns the canonical backend status code, if this error came from the service.
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            DatabaseError::Backend { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// A specialized `Result` type for document database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl From<SerdeJsonError> for DatabaseError {
    fn from(err: SerdeJsonError) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}
