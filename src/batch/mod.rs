//! Batching and execution of resolved calls.
//!
//! - [`scheduler`]: groups calls into size- or time-bounded batches
//! - [`executor`]: runs one batch as a single aggregated request with retry

pub mod executor;
pub mod scheduler;

pub use executor::{BatchOutcome, MulticallExecutor};
pub use scheduler::{BatchScheduler, PendingBatch, WeakBatchScheduler};
