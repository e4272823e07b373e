//! Parallel peer polling.
//!
//! One tokio task per input, each in an isolated failure domain: a panic, a
//! deadline expiry, or a `None` result drops that input from the output.
//! The join waits for every worker; output order mirrors input order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Per-worker deadline. A hung peer must not stall the join.
    pub deadline: Duration,
    /// Bound on concurrently running workers (unbounded if `None`).
    pub max_in_flight: Option<usize>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(5),
            max_in_flight: None,
        }
    }
}

impl PollerConfig {
    /// Set the per-worker deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Bound concurrently running workers.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = Some(max);
        self
    }
}

/// Evaluate `f` on every input in parallel, collecting successful results.
///
/// Each evaluation runs in its own task with the configured deadline;
/// timeouts, `None` returns, and panicking workers are dropped silently.
/// The output preserves the input order of the successes.
pub async fn poll_parallel<I, T, F, Fut>(inputs: Vec<I>, config: &PollerConfig, f: F) -> Vec<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    let limiter = config
        .max_in_flight
        .map(|max| Arc::new(Semaphore::new(max)));

    let mut workers = Vec::with_capacity(inputs.len());
    for input in inputs {
        let fut = f(input);
        let deadline = config.deadline;
        let limiter = limiter.clone();
        workers.push(tokio::spawn(async move {
            let _permit = match &limiter {
                Some(semaphore) => Some(semaphore.acquire().await.ok()?),
                None => None,
            };
            match tokio::time::timeout(deadline, fut).await {
                Ok(result) => result,
                Err(_) => {
                    debug!("peer poll worker hit deadline, dropped");
                    None
                }
            }
        }));
    }

    let mut results = Vec::new();
    for worker in workers {
        match worker.await {
            Ok(Some(value)) => results.push(value),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "peer poll worker crashed, dropped"),
        }
    }
    results
}
