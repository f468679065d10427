// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Multicall3-backed [`AggregateTransport`].

use std::marker::PhantomData;

use alloy_network::{AnyNetwork, Network, TransactionBuilder};
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use tracing::{debug, trace};

use super::{AggregateCall, AggregateResponse, AggregateTransport, RawOutcome};
use crate::config::constants::MULTICALL3_ADDRESS;
use crate::errors::RpcError;

sol! {
    /// Subset of the Multicall3 interface used for read aggregation.
    interface IMulticall3 {
        struct Call {
            address target;
            bytes callData;
        }

        struct CallOutcome {
            bool success;
            bytes returnData;
        }

        function tryBlockAndAggregate(bool requireSuccess, Call[] calldata calls)
            external
            payable
            returns (uint256 blockNumber, bytes32 blockHash, CallOutcome[] memory returnData);
    }
}

/// Evaluates batches with a single `eth_call` to Multicall3's
/// `tryBlockAndAggregate(false, calls)`.
///
/// `requireSuccess` is always `false`, so a reverting call yields a failed
/// outcome instead of reverting its siblings. The returned block number is
/// the height every outcome was read at.
///
/// # Example
///
/// ```rust,ignore
/// use farmscan::provider::{create_http_provider, ProviderConfig};
/// use farmscan::Multicall3Transport;
///
/// let provider = create_http_provider(ProviderConfig::new("https://bsc-dataseed.bnbchain.org"))?;
/// let transport = Multicall3Transport::new(provider);
/// ```
#[derive(Debug, Clone)]
pub struct Multicall3Transport<P, N = AnyNetwork> {
    provider: P,
    address: Address,
    _network: PhantomData<fn() -> N>,
}

impl<P, N> Multicall3Transport<P, N>
where
    P: Provider<N>,
    N: Network,
{
    /// Use the canonical Multicall3 deployment.
    pub fn new(provider: P) -> Self {
        Self::with_address(provider, MULTICALL3_ADDRESS)
    }

    /// Use a Multicall3 deployment at a non-canonical address.
    pub fn with_address(provider: P, address: Address) -> Self {
        Self {
            provider,
            address,
            _network: PhantomData,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P, N> AggregateTransport for Multicall3Transport<P, N>
where
    P: Provider<N>,
    N: Network,
{
    async fn aggregate(&self, calls: &[AggregateCall]) -> Result<AggregateResponse, RpcError> {
        let input = IMulticall3::tryBlockAndAggregateCall {
            requireSuccess: false,
            calls: calls
                .iter()
                .map(|call| IMulticall3::Call {
                    target: call.target,
                    callData: call.call_data.clone(),
                })
                .collect(),
        }
        .abi_encode();

        let tx = N::TransactionRequest::default()
            .with_to(self.address)
            .with_input(input);

        trace!(multicall = %self.address, calls = calls.len(), "Sending aggregated call");

        let raw = self
            .provider
            .call(tx)
            .await
            .map_err(|e| RpcError::aggregate_call_failed(calls.len(), e))?;

        let decoded = IMulticall3::tryBlockAndAggregateCall::abi_decode_returns(&raw)
            .map_err(RpcError::envelope_decode_failed)?;

        let height = decoded.blockNumber.saturating_to::<u64>();
        debug!(
            height,
            calls = calls.len(),
            outcomes = decoded.returnData.len(),
            "Aggregated call returned"
        );

        Ok(AggregateResponse {
            height,
            outcomes: decoded
                .returnData
                .into_iter()
                .map(|outcome| RawOutcome {
                    success: outcome.success,
                    return_data: outcome.returnData,
                })
                .collect(),
        })
    }
}
