// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider factory functions

use alloy_network::{AnyNetwork, Network};
use alloy_provider::{ProviderBuilder, RootProvider};
use alloy_rpc_client::ClientBuilder;
use tracing::warn;

use crate::errors::RpcError;
use crate::transport::{LoggingLayer, RateLimitLayer};

use super::config::ProviderConfig;
use super::AnyHttpProvider;

/// Create an HTTP provider over `AnyNetwork`.
///
/// Multicall reads only need `eth_call` and `eth_blockNumber`, which behave
/// the same on every EVM chain, so the network is erased.
///
/// # Errors
///
/// Returns [`RpcError::ProviderUrlInvalid`] if the URL cannot be parsed.
pub fn create_http_provider(config: ProviderConfig) -> Result<AnyHttpProvider, RpcError> {
    create_typed_http_provider::<AnyNetwork>(config)
}

/// Create an HTTP provider for a network known at compile time.
///
/// # Errors
///
/// Returns [`RpcError::ProviderUrlInvalid`] if the URL cannot be parsed.
pub fn create_typed_http_provider<N>(config: ProviderConfig) -> Result<RootProvider<N>, RpcError>
where
    N: Network,
{
    let url: url::Url = config
        .url
        .parse()
        .map_err(|e| RpcError::ProviderUrlInvalid(format!("{e}")))?;

    // Recommended fillers are disabled: reads never fill transactions
    match (rate_limiter(&config), config.logging_enabled) {
        (Some(limiter), true) => {
            let client = ClientBuilder::default()
                .layer(LoggingLayer::new())
                .layer(limiter)
                .http(url);

            Ok(ProviderBuilder::new()
                .disable_recommended_fillers()
                .network::<N>()
                .connect_client(client))
        }

        (Some(limiter), false) => {
            let client = ClientBuilder::default().layer(limiter).http(url);

            Ok(ProviderBuilder::new()
                .disable_recommended_fillers()
                .network::<N>()
                .connect_client(client))
        }

        (None, true) => {
            let client = ClientBuilder::default()
                .layer(LoggingLayer::new())
                .http(url);

            Ok(ProviderBuilder::new()
                .disable_recommended_fillers()
                .network::<N>()
                .connect_client(client))
        }

        (None, false) => Ok(ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<N>()
            .connect_http(url)),
    }
}

/// Create a WebSocket provider.
///
/// # Errors
///
/// Returns [`RpcError::ProviderConnectionFailed`] if the handshake fails.
#[cfg(feature = "ws")]
pub async fn create_ws_provider(config: ProviderConfig) -> Result<AnyHttpProvider, RpcError> {
    use alloy_provider::WsConnect;

    let ws = WsConnect::new(&config.url);

    match (rate_limiter(&config), config.logging_enabled) {
        (Some(limiter), true) => {
            let client = ClientBuilder::default()
                .layer(LoggingLayer::new())
                .layer(limiter)
                .ws(ws)
                .await
                .map_err(|e| RpcError::ProviderConnectionFailed(e.to_string()))?;

            Ok(ProviderBuilder::new()
                .disable_recommended_fillers()
                .network::<AnyNetwork>()
                .connect_client(client))
        }

        (Some(limiter), false) => {
            let client = ClientBuilder::default()
                .layer(limiter)
                .ws(ws)
                .await
                .map_err(|e| RpcError::ProviderConnectionFailed(e.to_string()))?;

            Ok(ProviderBuilder::new()
                .disable_recommended_fillers()
                .network::<AnyNetwork>()
                .connect_client(client))
        }

        (None, true) => {
            let client = ClientBuilder::default()
                .layer(LoggingLayer::new())
                .ws(ws)
                .await
                .map_err(|e| RpcError::ProviderConnectionFailed(e.to_string()))?;

            Ok(ProviderBuilder::new()
                .disable_recommended_fillers()
                .network::<AnyNetwork>()
                .connect_client(client))
        }

        (None, false) => ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<AnyNetwork>()
            .connect_ws(ws)
            .await
            .map_err(|e| RpcError::ProviderConnectionFailed(e.to_string())),
    }
}

fn rate_limiter(config: &ProviderConfig) -> Option<RateLimitLayer> {
    match (config.rate_limit_per_second, config.min_delay) {
        (Some(rps), Some(_)) => {
            warn!("Both rate_limit_per_second and min_delay specified, using rate_limit_per_second");
            Some(RateLimitLayer::per_second(rps))
        }
        (Some(rps), None) => Some(RateLimitLayer::per_second(rps)),
        (None, Some(delay)) => Some(RateLimitLayer::with_min_delay(delay)),
        (None, None) => None,
    }
}
