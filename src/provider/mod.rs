// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider construction for the read engine
//!
//! The engine itself only needs an [`AggregateTransport`]; this module builds
//! the alloy side of one:
//! - [`create_http_provider`] - an HTTP provider with optional rate limiting
//!   and request logging
//! - [`create_ws_provider`] - a WebSocket provider (requires `ws` feature)
//! - [`connect_http_engine`] - provider, Multicall3 transport, block poller
//!   and engine in one call
//!
//! # Example
//!
//! ```rust,ignore
//! use farmscan::provider::{connect_http_engine, ProviderConfig};
//! use farmscan::EngineConfig;
//! use std::time::Duration;
//!
//! let (engine, poller) = connect_http_engine(
//!     ProviderConfig::public_endpoint("https://bsc-dataseed.bnbchain.org").with_logging(true),
//!     EngineConfig::default(),
//!     Duration::from_secs(3),
//! )?;
//! ```
//!
//! [`AggregateTransport`]: crate::transport::AggregateTransport

mod config;
mod factory;

use std::time::Duration;

use alloy_network::AnyNetwork;
use tokio::task::JoinHandle;

pub use config::ProviderConfig;
#[cfg(feature = "ws")]
pub use factory::create_ws_provider;
pub use factory::{create_http_provider, create_typed_http_provider};

use crate::config::EngineConfig;
use crate::engine::ReadEngine;
use crate::errors::RpcError;
use crate::height::{spawn_block_poller, HeightWatch};
use crate::transport::Multicall3Transport;

/// HTTP provider over `AnyNetwork`
pub type AnyHttpProvider = alloy_provider::RootProvider<AnyNetwork>;

/// Multicall3 transport over an [`AnyHttpProvider`]
pub type HttpMulticallTransport = Multicall3Transport<AnyHttpProvider, AnyNetwork>;

/// Build an HTTP-backed [`ReadEngine`] that follows the chain head.
///
/// The returned handle is the block poller; it stops once the engine (and
/// every clone of it) is dropped. Must be called within a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the provider URL is invalid.
pub fn connect_http_engine(
    provider: ProviderConfig,
    engine: EngineConfig,
    poll_interval: Duration,
) -> Result<(ReadEngine, JoinHandle<()>), RpcError> {
    let provider = create_http_provider(provider)?;
    let transport: HttpMulticallTransport = Multicall3Transport::new(provider.clone());

    let (publisher, heights) = HeightWatch::new(0);
    let poller = spawn_block_poller::<_, AnyNetwork>(provider, publisher, poll_interval);

    Ok((ReadEngine::new(transport, heights, engine), poller))
}
