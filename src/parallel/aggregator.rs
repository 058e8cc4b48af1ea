//! Thread-safe ordered collection filled by concurrent tasks

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered collection appended to by concurrently running tasks.
///
/// Every append happens inside the mutex. Items are meant to be drained with
/// [`ResultAggregator::take`] once all appending tasks have settled.
#[derive(Debug)]
pub struct ResultAggregator<T> {
    items: Mutex<Vec<T>>,
}

impl<T> ResultAggregator<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Append one item
    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return everything collected so far, in append order
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // Vec::push cannot leave a torn state, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for ResultAggregator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_push_and_take() {
        let aggregator = ResultAggregator::new();
        assert!(aggregator.is_empty());

        aggregator.push("a");
        aggregator.push("b");
        assert_eq!(aggregator.len(), 2);

        assert_eq!(aggregator.take(), vec!["a", "b"]);
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_concurrent_pushes() {
        let aggregator = Arc::new(ResultAggregator::new());

        let handles: Vec<_> = (0..16)
            .map(|thread| {
                let aggregator = Arc::clone(&aggregator);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        aggregator.push(thread * 100 + i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut items = aggregator.take();
        assert_eq!(items.len(), 1600);
        items.sort_unstable();
        items.dedup();
        assert_eq!(items.len(), 1600);
    }

    #[test]
    fn test_survives_poisoning() {
        let aggregator = Arc::new(ResultAggregator::new());
        aggregator.push(1);

        let poisoner = Arc::clone(&aggregator);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.items.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        aggregator.push(2);
        let aggregator = Arc::try_unwrap(aggregator).unwrap();
        assert_eq!(aggregator.into_inner(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_filled_by_promises() {
        use crate::parallel::{await_all, Promise};

        let aggregator = Arc::new(ResultAggregator::new());
        let promises: Vec<Promise<()>> = (0..10)
            .map(|i| {
                let aggregator = Arc::clone(&aggregator);
                Promise::new(move |resolver| {
                    aggregator.push(i);
                    resolver.resolve(());
                })
            })
            .collect();

        let outcome = await_all(promises).await;
        assert_eq!(outcome.completed, 10);

        // every push happened before its promise settled
        assert_eq!(aggregator.take().len(), 10);
    }
}
