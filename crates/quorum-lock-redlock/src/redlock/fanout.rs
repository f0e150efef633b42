//! Scatter/gather execution of one store operation across every store.

use std::future::Future;
use std::sync::Arc;

use quorum_lock_core::error::LockResult;
use tracing::warn;

/// Per-store outcome of one fanned-out operation, indexed by store position.
#[derive(Debug, Clone)]
pub struct StoreResults {
    /// `true` where the store accepted the operation.
    pub results: Vec<bool>,
}

impl StoreResults {
    /// Returns the number of stores that accepted the operation.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|&&ok| ok).count()
    }

    /// Returns the number of stores that rejected or failed the operation.
    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}

/// Runs `op` against every store in parallel and waits for all of them.
///
/// A slow or failing store never aborts the others. Errors and panicked
/// tasks count as failures; `accept` decides whether a returned value counts
/// as a success.
pub async fn settle_all<S, F, Fut, T>(
    operation: &'static str,
    stores: &[Arc<S>],
    op: F,
    accept: fn(&T) -> bool,
) -> StoreResults
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>) -> Fut,
    Fut: Future<Output = LockResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let tasks: Vec<tokio::task::JoinHandle<LockResult<T>>> = stores
        .iter()
        .map(|store| tokio::spawn(op(store.clone())))
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.into_iter().enumerate() {
        let ok = match task.await {
            Ok(Ok(value)) => accept(&value),
            Ok(Err(e)) => {
                warn!(store = index, operation, error = %e, "store operation failed");
                false
            }
            Err(e) => {
                warn!(store = index, operation, error = %e, "store task did not complete");
                false
            }
        };
        results.push(ok);
    }

    StoreResults { results }
}
