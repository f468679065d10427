// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for farmscan integration tests
//!
//! Provides a scripted [`AggregateTransport`] so the engine can be exercised
//! without a node.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{address, Address, Bytes};
use async_trait::async_trait;
use farmscan::transport::{AggregateCall, AggregateResponse, RawOutcome};
use farmscan::{
    AggregateTransport, CallSpec, ContractAbi, EngineConfig, HeightPublisher, HeightWatch,
    ReadEngine, ResolvedCall, RpcError,
};

pub const TOKEN: Address = address!("1111111111111111111111111111111111111111");
pub const QUOTE: Address = address!("2222222222222222222222222222222222222222");
pub const LP: Address = address!("3333333333333333333333333333333333333333");
pub const CHEF: Address = address!("4444444444444444444444444444444444444444");
pub const HOLDER: Address = address!("5555555555555555555555555555555555555555");

/// What the next aggregated request does instead of answering.
#[derive(Debug, Clone, Copy)]
enum Fault {
    /// Fail immediately with a transport error.
    Fail,
    /// Never answer within any reasonable deadline.
    Hang,
}

#[derive(Default)]
struct MockState {
    height: AtomicU64,
    attempts: AtomicUsize,
    responses: Mutex<HashMap<(Address, Bytes), Bytes>>,
    reverting: Mutex<HashSet<Address>>,
    faults: Mutex<VecDeque<Fault>>,
    requests: Mutex<Vec<Vec<AggregateCall>>>,
}

/// Scripted aggregation primitive.
///
/// Calls answer with the return data registered through [`respond`](Self::respond).
/// Unregistered calls and calls to [`revert`](Self::revert)ed targets fail
/// individually, like a reverting contract would.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockTransport::new(7);
/// mock.respond(&ContractAbi::erc20(), &CallSpec::new(TOKEN, "decimals"), DynSolValue::Uint(U256::from(6), 8));
/// mock.fail_next(2);
/// let engine = ReadEngine::new(mock.clone(), heights, EngineConfig::default());
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new(height: u64) -> Self {
        let mock = Self::default();
        mock.set_height(height);
        mock
    }

    /// Answer `spec` (resolved against `abi`) with `value`.
    pub fn respond(&self, abi: &ContractAbi, spec: &CallSpec, value: DynSolValue) {
        let call = ResolvedCall::resolve(spec, abi).expect("test call spec must resolve");
        self.state.responses.lock().unwrap().insert(
            (call.target(), call.call_data().clone()),
            Bytes::from(value.abi_encode_params()),
        );
    }

    /// Answer `spec` with raw bytes, e.g. malformed return data.
    pub fn respond_raw(&self, abi: &ContractAbi, spec: &CallSpec, data: Bytes) {
        let call = ResolvedCall::resolve(spec, abi).expect("test call spec must resolve");
        self.state
            .responses
            .lock()
            .unwrap()
            .insert((call.target(), call.call_data().clone()), data);
    }

    /// Make every call to `target` revert.
    pub fn revert(&self, target: Address) {
        self.state.reverting.lock().unwrap().insert(target);
    }

    /// Fail the next `count` aggregated requests with a transport error.
    pub fn fail_next(&self, count: usize) {
        self.push_faults(Fault::Fail, count);
    }

    /// Let the next `count` aggregated requests hang past any timeout.
    pub fn hang_next(&self, count: usize) {
        self.push_faults(Fault::Hang, count);
    }

    pub fn clear_faults(&self) {
        self.state.faults.lock().unwrap().clear();
    }

    /// Block height reported with every response.
    pub fn set_height(&self, height: u64) {
        self.state.height.store(height, Ordering::SeqCst);
    }

    /// Aggregated requests received, including failed ones.
    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Calls carried by every request received, in arrival order.
    pub fn requests(&self) -> Vec<Vec<AggregateCall>> {
        self.state.requests.lock().unwrap().clone()
    }

    /// How many times `spec` was sent to the remote side across all requests.
    pub fn sent_count(&self, abi: &ContractAbi, spec: &CallSpec) -> usize {
        let call = ResolvedCall::resolve(spec, abi).expect("test call spec must resolve");
        self.requests()
            .iter()
            .flatten()
            .filter(|sent| sent.target == call.target() && sent.call_data == *call.call_data())
            .count()
    }

    fn push_faults(&self, fault: Fault, count: usize) {
        self.state
            .faults
            .lock()
            .unwrap()
            .extend(std::iter::repeat_n(fault, count));
    }

    fn outcome(&self, call: &AggregateCall) -> RawOutcome {
        if self.state.reverting.lock().unwrap().contains(&call.target) {
            return RawOutcome::failure(Vec::<u8>::new());
        }
        match self
            .state
            .responses
            .lock()
            .unwrap()
            .get(&(call.target, call.call_data.clone()))
        {
            Some(data) => RawOutcome::success(data.clone()),
            None => RawOutcome::failure(Vec::<u8>::new()),
        }
    }
}

#[async_trait]
impl AggregateTransport for MockTransport {
    async fn aggregate(&self, calls: &[AggregateCall]) -> Result<AggregateResponse, RpcError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().unwrap().push(calls.to_vec());

        let fault = self.state.faults.lock().unwrap().pop_front();
        match fault {
            Some(Fault::Fail) => {
                return Err(RpcError::envelope_decode_failed("scripted transport failure"))
            }
            Some(Fault::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                return Err(RpcError::envelope_decode_failed("scripted hang elapsed"));
            }
            None => {}
        }

        Ok(AggregateResponse {
            height: self.state.height.load(Ordering::SeqCst),
            outcomes: calls.iter().map(|call| self.outcome(call)).collect(),
        })
    }
}

/// Start an engine over `mock` at `height`, returning the height publisher.
pub fn engine_with(
    mock: &MockTransport,
    height: u64,
    config: EngineConfig,
) -> (ReadEngine, HeightPublisher) {
    let (publisher, heights) = HeightWatch::new(height);
    let engine = ReadEngine::new(mock.clone(), heights, config);
    engine.register_contract(TOKEN, ContractAbi::erc20());
    engine.register_contract(QUOTE, ContractAbi::erc20());
    engine.register_contract(LP, ContractAbi::erc20());
    (engine, publisher)
}

/// Route engine logs to the test output; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
