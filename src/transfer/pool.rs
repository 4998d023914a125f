//! Bounded-concurrency executor shared by every transfer flow

use super::types::{TransferFailure, TransferUnit};
use crate::error::{DataHubError, Result};
use crate::progress::TransferProgress;
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Results of one batch
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Worker results in completion order
    pub successes: Vec<R>,
    pub failures: Vec<TransferFailure>,
}

impl<R> Default for BatchOutcome<R> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Run `worker` over `items` with at most `max_workers` in flight.
///
/// A unit's weight is credited to `progress` only after its worker returns
/// `Ok`. Errors and panics are recorded as failures and reported to the sink;
/// they never stop the remaining units.
pub async fn run_bounded<T, R, F, Fut>(
    items: Vec<T>,
    max_workers: usize,
    progress: Arc<TransferProgress>,
    worker: F,
) -> BatchOutcome<R>
where
    T: TransferUnit + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let max_workers = max_workers.max(1);
    let semaphore = Arc::new(Semaphore::new(max_workers));
    let worker = Arc::new(worker);
    let mut tasks = FuturesUnordered::new();

    debug!("pool_start: units={} workers={}", items.len(), max_workers);

    for item in items {
        let label = item.label();
        let weight = item.weight();
        let semaphore = semaphore.clone();
        let worker = worker.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| DataHubError::Io(std::io::Error::other(e)))?;
            worker(item).await
        });

        tasks.push(async move { (label, weight, handle.await) });
    }

    // The collector is the only writer of progress and results
    let mut outcome = BatchOutcome::default();
    while let Some((label, weight, joined)) = tasks.next().await {
        let error = match joined {
            Ok(Ok(result)) => {
                progress.advance(weight);
                outcome.successes.push(result);
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) if e.is_panic() => format!("worker panicked: {}", e),
            Err(e) => format!("worker aborted: {}", e),
        };

        warn!("transfer_failed: {} error={}", label, error);
        progress.report_failure(&label, &error);
        outcome.failures.push(TransferFailure { item: label, error });
    }

    debug!(
        "pool_done: ok={} failed={}",
        outcome.successes.len(),
        outcome.failures.len()
    );
    outcome
}
