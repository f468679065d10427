// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Result caching keyed by call identity and block height.
//!
//! The [`ResultCache`] holds one [`CacheEntry`] per [`CallKey`](crate::CallKey).
//! Entries carry the last [`Observation`], a stale flag set by height
//! transitions, an in-flight flag used for deduplication, and the watch channel
//! subscribers are notified on.

mod store;

use alloy_dyn_abi::DynSolValue;
use serde::{Deserialize, Serialize};

pub use store::{CacheEntry, Claim, ResultCache, WriteOutcome};

use crate::errors::CallError;

/// Decoded value of one call, or the per-call error it resolved to.
pub type CallResult = Result<DynSolValue, CallError>;

/// A result together with the height it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub height: u64,
    pub result: CallResult,
}

impl Observation {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn value(&self) -> Option<&DynSolValue> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CallError> {
        self.result.as_ref().err()
    }
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Requests served from a fresh entry.
    pub hits: u64,
    /// Requests that scheduled remote work.
    pub misses: u64,
    /// Requests merged into an in-flight call.
    pub joins: u64,
    /// Writes dropped because the entry already held a later height.
    pub stale_writes: u64,
    /// Height transitions applied.
    pub invalidations: u64,
    /// Stale entries rescheduled for their subscribers.
    pub refreshes: u64,
}

impl CacheStats {
    /// Fraction of requests that needed no new remote call.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.joins;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.joins) as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);

        let stats = CacheStats {
            hits: 2,
            misses: 1,
            joins: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
