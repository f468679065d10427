//! Span creation helpers for farmscan operations.
//!
//! Telemetry is kept out of business logic: each instrumented operation has a
//! span helper here, and the operation enters or instruments with it.
//!
//! Usage pattern:
//! ```rust,ignore
//! let span = spans::execute_batch(batch.len());
//! tokio::spawn(async move { /* ... */ }.instrument(span));
//! ```

use alloy_primitives::Address;
use tracing::Span;

/// Span for executing one batch as an aggregated request.
///
/// Parent: None (spawned task)
/// Children: rpc_request spans from the transport logging layer
#[inline]
pub(crate) fn execute_batch(batch_size: usize) -> Span {
    tracing::debug_span!("farmscan.execute_batch", batch_size)
}

/// Span for applying a height transition to the cache.
#[inline]
pub(crate) fn invalidate(height: u64) -> Span {
    tracing::debug_span!("farmscan.invalidate", height, refreshed = tracing::field::Empty)
}

/// Span for reading and deriving the metrics of one farm.
///
/// Parent: caller
/// Children: none (reads are executed on batch tasks)
#[inline]
pub(crate) fn fetch_farm(lp: Address, pid: Option<u64>) -> Span {
    tracing::info_span!("farmscan.fetch_farm", lp = %lp, pid = ?pid)
}
