//! One-shot, shared initialization of an adapter's connection.
//!
//! A [`Readiness`] is created when the adapter is constructed and wraps the
//! future that establishes its connection. The future is not polled until the
//! first caller awaits [`Readiness::wait`]; from then on every caller observes the
//! same outcome. A failed initialization is kept and returned to every later
//! caller. There is no retry.

use std::{fmt, future::Future, sync::Arc};

use futures::{
    FutureExt, TryFutureExt,
    future::{BoxFuture, Shared},
};

use crate::error::{DatabaseError, DatabaseResult};

type InitFuture<C> = Shared<BoxFuture<'static, Result<Arc<C>, DatabaseError>>>;

/// Shared handle to a lazily established connection of type `C`.
pub struct Readiness<C> {
    init: InitFuture<C>,
}

impl<C> Readiness<C>
where
    C: Send + Sync + 'static,
{
    /// Wraps the initialization future. Nothing runs until the first [`wait`](Self::wait).
    pub fn new<F>(init: F) -> Self
    where
        F: Future<Output = DatabaseResult<C>> + Send + 'static,
    {
        Self {
            init: init.map_ok(Arc::new).boxed().shared(),
        }
    }

    /// Waits for initialization and returns the connection.
    ///
    /// All concurrent and later callers share one run of the initialization future.
    pub async fn wait(&self) -> DatabaseResult<Arc<C>> {
        self.init.clone().await
    }

    /// Returns the outcome if initialization has already finished.
    pub fn peek(&self) -> Option<DatabaseResult<Arc<C>>> {
        self.init.peek().cloned()
    }
}

impl<C> Clone for Readiness<C> {
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
        }
    }
}

impl<C> fmt::Debug for Readiness<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.init.peek() {
            None => "pending",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };

        f.debug_struct("Readiness").field("state", &state).finish()
    }
}
