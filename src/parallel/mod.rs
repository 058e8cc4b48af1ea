//! Concurrent task orchestration primitives
//!
//! - [`Promise`] / [`Resolver`]: one task, one settlement
//! - [`WorkerPool`]: bounded execution of promise work
//! - [`await_all`]: fan-in to a single [`BatchOutcome`]
//! - [`ResultAggregator`]: mutex-guarded collection shared by tasks

pub mod aggregator;
pub mod await_all;
pub mod promise;

pub use aggregator::*;
pub use await_all::*;
pub use promise::*;
