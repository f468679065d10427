// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Remote aggregation transport.
//!
//! The executor never talks to a provider directly. It hands an ordered list of
//! `(target, calldata)` pairs to an [`AggregateTransport`] and gets back the
//! height the calls were evaluated at plus one `(success, bytes)` outcome per
//! call, in the same order.
//!
//! [`Multicall3Transport`] implements the trait over any alloy provider using
//! Multicall3's `tryBlockAndAggregate`. Tests substitute their own
//! implementation.
//!
//! The module also provides Tower layers for the underlying RPC client:
//!
//! - [`RateLimitLayer`]: token-bucket throttling of JSON-RPC requests
//! - [`LoggingLayer`]: per-request tracing with timing and slow-call warnings
//!
//! ## Usage
//!
//! ```rust,ignore
//! use farmscan::transport::{LoggingLayer, Multicall3Transport, RateLimitLayer};
//! use alloy_rpc_client::ClientBuilder;
//! use alloy_provider::ProviderBuilder;
//!
//! let client = ClientBuilder::default()
//!     .layer(LoggingLayer::new())
//!     .layer(RateLimitLayer::per_second(10))
//!     .http(rpc_url);
//!
//! let provider = ProviderBuilder::new().connect_client(client);
//! let transport = Multicall3Transport::new(provider);
//! ```

mod logging;
mod multicall;
mod rate_limit;
mod retry;

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

pub use logging::{LoggingLayer, LoggingService};
pub use multicall::Multicall3Transport;
pub use rate_limit::{RateLimitLayer, RateLimitService};
pub use retry::RetryPolicy;

use crate::errors::RpcError;

/// One call inside an aggregated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCall {
    pub target: Address,
    pub call_data: Bytes,
}

/// Raw per-call outcome as returned by the remote aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutcome {
    pub success: bool,
    pub return_data: Bytes,
}

impl RawOutcome {
    pub fn success(return_data: impl Into<Bytes>) -> Self {
        Self {
            success: true,
            return_data: return_data.into(),
        }
    }

    pub fn failure(return_data: impl Into<Bytes>) -> Self {
        Self {
            success: false,
            return_data: return_data.into(),
        }
    }
}

/// Response of one aggregated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResponse {
    /// Block height the calls were evaluated at.
    pub height: u64,
    /// One outcome per call, positionally matched to the request.
    pub outcomes: Vec<RawOutcome>,
}

/// A remote data source able to evaluate many read calls in one round trip.
///
/// Implementations must return outcomes in request order. A response carrying
/// a different number of outcomes is treated as a transport failure by the
/// executor.
#[async_trait]
pub trait AggregateTransport: Send + Sync {
    async fn aggregate(&self, calls: &[AggregateCall]) -> Result<AggregateResponse, RpcError>;
}

#[async_trait]
impl<T: AggregateTransport + ?Sized> AggregateTransport for Arc<T> {
    async fn aggregate(&self, calls: &[AggregateCall]) -> Result<AggregateResponse, RpcError> {
        (**self).aggregate(calls).await
    }
}
