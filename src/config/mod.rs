//! Configuration for farmscan operations
//!
//! [`EngineConfig`] controls batching, RPC deadlines and retries of the
//! [`ReadEngine`](crate::ReadEngine). [`MetricsConfig`] controls how raw
//! scheduler values are scaled by the metric derivations.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use farmscan::EngineConfig;
//!
//! // 50 calls per batch, 10ms window, 30s timeout, 3 attempts
//! let config = EngineConfig::default();
//! assert_eq!(config.max_batch_size, 50);
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use farmscan::{EngineConfigBuilder, RetryPolicy};
//! use std::time::Duration;
//!
//! let config = EngineConfigBuilder::new()
//!     .max_batch_size(100)
//!     .max_wait(Duration::from_millis(25))
//!     .rpc_timeout(Duration::from_secs(10))
//!     .retry(RetryPolicy::aggressive())
//!     .build();
//!
//! assert_eq!(config.max_batch_size, 100);
//! ```

use std::time::Duration;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::transport::RetryPolicy;

pub mod constants;

use constants::{engine, BONUS_MULTIPLIER_SCALE, DEFAULT_REWARD_DECIMALS};

/// Configuration of the read engine's batching and execution.
///
/// Use [`EngineConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum calls carried by one aggregated request
    /// Default: 50
    pub max_batch_size: usize,

    /// Maximum time a batch stays open after its first call
    /// Default: 10ms
    pub max_wait: Duration,

    /// Deadline for each attempt of an aggregated request
    /// Default: 30 seconds
    pub rpc_timeout: Duration,

    /// Retry policy applied to failed batches
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: engine::DEFAULT_MAX_BATCH_SIZE,
            max_wait: engine::DEFAULT_MAX_WAIT,
            rpc_timeout: engine::DEFAULT_RPC_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Batch size actually used, never zero.
    pub fn effective_batch_size(&self) -> usize {
        self.max_batch_size.max(1)
    }
}

/// Builder for [`EngineConfig`]
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a builder starting from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum calls per batch (clamped to at least 1)
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size.max(1);
        self
    }

    pub fn max_wait(mut self, wait: Duration) -> Self {
        self.config.max_wait = wait;
        self
    }

    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.config.rpc_timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Shorthand for setting only the attempt count of the retry policy
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry = self.config.retry.with_max_attempts(attempts);
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// Scaling used when deriving farm metrics from raw scheduler values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Fixed-point scale of the raw bonus multiplier.
    ///
    /// A raw multiplier at or above this value is divided by it; smaller raw
    /// values are taken as plain integers. Zero disables descaling.
    pub multiplier_scale: U256,

    /// Decimals of the scheduler's reward token, used to normalize the
    /// per-block emission rate.
    pub reward_decimals: u8,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            multiplier_scale: U256::from(BONUS_MULTIPLIER_SCALE),
            reward_decimals: DEFAULT_REWARD_DECIMALS,
        }
    }
}

impl MetricsConfig {
    #[must_use]
    pub fn with_multiplier_scale(mut self, scale: U256) -> Self {
        self.multiplier_scale = scale;
        self
    }

    #[must_use]
    pub fn with_reward_decimals(mut self, decimals: u8) -> Self {
        self.reward_decimals = decimals;
        self
    }
}
