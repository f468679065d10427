// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batched, deduplicated, block-height cached contract reads for EVM chains,
//! with fixed-precision yield farm metrics on top.
//!
//! Many callers ask for the same on-chain values (token balances, LP supply,
//! a scheduler's pool slot) at the same time. The [`ReadEngine`] turns those
//! requests into as few remote round trips as possible:
//!
//! - identical reads share one [`CallKey`] and one in-flight request
//! - distinct reads are collected into batches by size or by a short timer
//! - each batch is one Multicall3 `tryBlockAndAggregate` call, retried with
//!   backoff on transport failure; a reverting call fails only its own key
//! - results are cached per block height and pushed to [`Subscription`]s,
//!   whose observed heights never go backwards
//!
//! [`compute_farm_metrics`] derives prices, weights and emission rates from
//! the raw values with [`bigdecimal`] arithmetic, and [`FarmReader`] ties the
//! two together.
//!
//! # Example
//!
//! ```rust,ignore
//! use farmscan::provider::{connect_http_engine, ProviderConfig};
//! use farmscan::{EngineConfig, FarmConfig, FarmReader};
//! use std::time::Duration;
//!
//! let (engine, _poller) = connect_http_engine(
//!     ProviderConfig::public_endpoint("https://bsc-dataseed.bnbchain.org"),
//!     EngineConfig::default(),
//!     Duration::from_secs(3),
//! )?;
//!
//! let reader = FarmReader::new(engine);
//! let metrics = reader
//!     .fetch(&FarmConfig::staked(1, lp, token, busd, master_chef))
//!     .await?;
//! println!("price: {}", metrics.price_vs_quote);
//! ```

pub mod batch;
pub mod cache;
pub mod call;
pub mod config;
pub mod engine;
pub mod errors;
pub mod farm;
pub mod height;
pub mod metrics;
pub mod provider;
pub(crate) mod spans;
pub mod subscription;
pub mod transport;
pub mod types;

pub use batch::{BatchOutcome, BatchScheduler, MulticallExecutor, PendingBatch};
pub use cache::{CacheStats, CallResult, Observation, ResultCache};
pub use call::abi::{ContractAbi, MethodAbi, SchedulerMethods};
pub use call::spec::{CallKey, CallSpec, ResolvedCall};
pub use config::{EngineConfig, EngineConfigBuilder, MetricsConfig};
pub use engine::ReadEngine;
pub use errors::{CallError, ConfigurationError, EngineError, FarmscanError, RpcError};
pub use farm::{FarmConfig, FarmReader};
pub use height::{follow_heights, spawn_block_poller, HeightPublisher, HeightWatch};
pub use metrics::{
    compute_farm_metrics, DerivedFarmMetrics, FarmRef, Metric, RawFarmValues, SchedulerMetrics,
};
pub use subscription::Subscription;
pub use transport::{AggregateTransport, Multicall3Transport, RetryPolicy};
pub use types::tokens::{TokenAmount, TokenDecimals};
