//! Fan-in: wait for every promise and reduce to one outcome

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::error::{Result, BatchResizeError};
use crate::parallel::promise::Promise;

/// Aggregate outcome of a set of promises
#[derive(Debug)]
pub struct BatchOutcome<V> {
    /// Promises that fulfilled
    pub completed: usize,
    /// Promises that rejected
    pub failed: usize,
    /// Fulfilled values, in completion order
    pub values: Vec<V>,
    /// First rejection observed, in completion order
    pub first_error: Option<BatchResizeError>,
}

impl<V> BatchOutcome<V> {
    fn empty(capacity: usize) -> Self {
        Self {
            completed: 0,
            failed: 0,
            values: Vec::with_capacity(capacity),
            first_error: None,
        }
    }

    /// Number of promises that settled
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.first_error.is_none()
    }

    /// Fulfilled values, or the first error wrapped with the batch counts
    pub fn into_result(self) -> Result<Vec<V>> {
        let total = self.total();
        match self.first_error {
            None => Ok(self.values),
            Some(error) => Err(BatchResizeError::batch(self.completed, total, error)),
        }
    }
}

/// Wait until every promise has settled.
///
/// Nothing is cancelled when a promise rejects: the remaining promises are
/// still awaited. Settlements are consumed as they happen, so `first_error`
/// is the earliest rejection in completion time, not in input order. Later
/// rejections are logged and dropped.
pub async fn await_all<V>(promises: Vec<Promise<V>>) -> BatchOutcome<V> {
    let mut outcome = BatchOutcome::empty(promises.len());
    let mut pending: FuturesUnordered<Promise<V>> = promises.into_iter().collect();

    while let Some(settled) = pending.next().await {
        match settled {
            Ok(value) => {
                outcome.completed += 1;
                outcome.values.push(value);
            }
            Err(error) => {
                outcome.failed += 1;
                if outcome.first_error.is_none() {
                    outcome.first_error = Some(error);
                } else {
                    debug!("Additional task failure: {}", error);
                }
            }
        }
    }

    debug!(
        "All {} promises settled ({} fulfilled, {} rejected)",
        outcome.total(),
        outcome.completed,
        outcome.failed
    );

    outcome
}
