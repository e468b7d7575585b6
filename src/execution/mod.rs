//! Execution options for ingestion runs.
//!
//! Files are fetched and decoded one at a time by default. A bounded number of files may be in
//! flight at once, but results are always yielded in input order, so merge order never depends
//! on which fetch finishes first.

mod metrics;

use std::future::Future;

use futures::StreamExt;

pub use metrics::{RunMetrics, RunMetricsSnapshot};

/// Configuration for how the orchestrator schedules per-file work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Upper bound on files being fetched/decoded concurrently.
    ///
    /// `1` (the default) means strictly sequential processing.
    pub max_in_flight_files: usize,
}

impl ExecutionOptions {
    /// One file at a time.
    pub fn sequential() -> Self {
        Self {
            max_in_flight_files: 1,
        }
    }

    /// Up to `n` files at a time (clamped to at least 1).
    pub fn bounded(n: usize) -> Self {
        Self {
            max_in_flight_files: n.max(1),
        }
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Run `task` for every item with at most `limit` tasks in flight.
///
/// Outputs are returned in the order of `items`, regardless of completion order.
pub async fn run_ordered<I, T, F, Fut>(items: I, limit: usize, task: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    futures::stream::iter(items)
        .map(task)
        .buffered(limit.max(1))
        .collect()
        .await
}
