//! Promise: the single eventual outcome of one blocking task

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Semaphore};
use tracing::{debug, info};

use crate::error::{Result, BatchResizeError};

/// Settles a [`Promise`]. Handed to the task's work function.
///
/// Both settling methods consume the resolver, so a promise is settled at
/// most once. Dropping it unsettled (including by panicking) rejects the
/// promise with [`BatchResizeError::TaskAbandoned`].
#[derive(Debug)]
pub struct Resolver<V> {
    sender: oneshot::Sender<Result<V>>,
}

impl<V> Resolver<V> {
    /// Fulfil the promise with `value`
    pub fn resolve(self, value: V) {
        self.settle(Ok(value));
    }

    /// Reject the promise with `error`
    pub fn reject(self, error: BatchResizeError) {
        self.settle(Err(error));
    }

    /// Fulfil or reject depending on `result`
    pub fn settle(self, result: Result<V>) {
        // the waiter may have gone away; nothing left to tell it
        let _ = self.sender.send(result);
    }
}

/// Handle to a task's eventual value.
///
/// Awaiting the promise waits until the task settles and yields its value or
/// its error. A value is only ever observed after settlement.
#[derive(Debug)]
#[must_use = "a promise does nothing useful unless awaited"]
pub struct Promise<V> {
    receiver: oneshot::Receiver<Result<V>>,
}

impl<V: Send + 'static> Promise<V> {
    /// Create an unsettled promise together with its resolver
    pub fn pending() -> (Resolver<V>, Self) {
        let (sender, receiver) = oneshot::channel();
        (Resolver { sender }, Self { receiver })
    }

    /// Start `work` immediately on its own blocking thread.
    ///
    /// No concurrency limit applies; see [`WorkerPool::spawn`] for the bounded
    /// variant. Must be called from within a Tokio runtime.
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce(Resolver<V>) + Send + 'static,
    {
        let (resolver, promise) = Self::pending();
        tokio::task::spawn_blocking(move || work(resolver));
        promise
    }

    /// Promise that is already fulfilled
    pub fn fulfilled(value: V) -> Self {
        let (resolver, promise) = Self::pending();
        resolver.resolve(value);
        promise
    }

    /// Promise that is already rejected
    pub fn rejected(error: BatchResizeError) -> Self {
        let (resolver, promise) = Self::pending();
        resolver.reject(error);
        promise
    }
}

impl<V> Future for Promise<V> {
    type Output = Result<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|settled| {
            settled.unwrap_or_else(|_| {
                Err(BatchResizeError::task_abandoned(
                    "resolver dropped without resolving or rejecting",
                ))
            })
        })
    }
}

/// Bounded pool for promise work.
///
/// At most `limit` work functions run at once; the rest wait for a permit in
/// submission order. Fan-out and fan-in are unchanged: every spawn still
/// returns a [`Promise`].
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    /// Create a pool running at most `limit` tasks at once (minimum 1)
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);

        info!("Initializing worker pool with {} concurrent workers", limit);

        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Pool sized to the number of logical CPUs
    pub fn with_cpu_count() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits not currently held by running work
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queue `work`; it starts on a blocking thread once a permit is free.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<V, F>(&self, work: F) -> Promise<V>
    where
        V: Send + 'static,
        F: FnOnce(Resolver<V>) + Send + 'static,
    {
        let (resolver, promise) = Promise::pending();
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let Ok(permit) = permits.acquire_owned().await else {
                resolver.reject(BatchResizeError::task_abandoned("worker pool closed"));
                return;
            };

            // the permit is released only after the work function returns
            let finished = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                work(resolver);
            })
            .await;

            if let Err(e) = finished {
                debug!("Worker task ended abnormally: {}", e);
            }
        });

        promise
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_cpu_count()
    }
}
