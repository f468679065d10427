// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batch execution with retry.
//!
//! One aggregated request per attempt. Outcomes are matched to calls by
//! position; a failed or undecodable outcome only affects its own call. Any
//! transport failure retries the whole batch under the [`RetryPolicy`]; after
//! the last attempt every call resolves to [`CallError::Transport`].

use std::time::Duration;

use tracing::{debug, warn};

use super::scheduler::PendingBatch;
use crate::cache::CallResult;
use crate::call::spec::{CallKey, ResolvedCall};
use crate::config::EngineConfig;
use crate::errors::{CallError, RpcError};
use crate::transport::{AggregateCall, AggregateResponse, AggregateTransport, RawOutcome, RetryPolicy};

/// Per-call results of one executed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Height the results were read at. `None` when every attempt failed.
    pub height: Option<u64>,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// One result per call, in batch order.
    pub results: Vec<(CallKey, CallResult)>,
}

impl BatchOutcome {
    pub fn is_transport_failure(&self) -> bool {
        self.height.is_none()
    }
}

/// Executes [`PendingBatch`]es against an [`AggregateTransport`].
#[derive(Debug, Clone)]
pub struct MulticallExecutor<T> {
    transport: T,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<T: AggregateTransport> MulticallExecutor<T> {
    pub fn new(transport: T, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            retry,
            timeout,
        }
    }

    pub fn from_config(transport: T, config: &EngineConfig) -> Self {
        Self::new(transport, config.retry, config.rpc_timeout)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `batch`, retrying transport failures.
    ///
    /// Never fails as a whole: errors are reported per call in the outcome.
    pub async fn execute(&self, batch: &PendingBatch) -> BatchOutcome {
        if batch.is_empty() {
            return BatchOutcome {
                height: None,
                attempts: 0,
                results: Vec::new(),
            };
        }

        let calls = batch.aggregate_calls();
        let max_attempts = self.retry.attempts();
        let mut last_error = None;

        for attempt in 0..max_attempts {
            match self.attempt(&calls).await {
                Ok(response) => {
                    debug!(
                        height = response.height,
                        batch_size = calls.len(),
                        attempts = attempt + 1,
                        "Batch executed"
                    );
                    return BatchOutcome {
                        height: Some(response.height),
                        attempts: attempt + 1,
                        results: batch
                            .calls()
                            .iter()
                            .zip(response.outcomes)
                            .map(|(call, outcome)| (call.key(), decode_outcome(call, outcome)))
                            .collect(),
                    };
                }
                Err(error) => {
                    if attempt + 1 < max_attempts {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            %error,
                            attempt = attempt + 1,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Batch failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(%error, attempts = max_attempts, "Batch failed, attempts exhausted");
                    }
                    last_error = Some(error);
                }
            }
        }

        let failure = CallError::Transport {
            attempts: max_attempts,
            details: last_error.map(|e| e.to_string()).unwrap_or_default(),
        };
        BatchOutcome {
            height: None,
            attempts: max_attempts,
            results: batch
                .calls()
                .iter()
                .map(|call| (call.key(), Err(failure.clone())))
                .collect(),
        }
    }

    async fn attempt(&self, calls: &[AggregateCall]) -> Result<AggregateResponse, RpcError> {
        let response = tokio::time::timeout(self.timeout, self.transport.aggregate(calls))
            .await
            .map_err(|_| RpcError::Timeout {
                timeout: self.timeout,
            })??;

        if response.outcomes.len() != calls.len() {
            return Err(RpcError::OutcomeCountMismatch {
                expected: calls.len(),
                actual: response.outcomes.len(),
            });
        }
        Ok(response)
    }
}

fn decode_outcome(call: &ResolvedCall, outcome: RawOutcome) -> CallResult {
    if !outcome.success {
        return Err(CallError::execution(
            call.method().signature(),
            outcome.return_data,
        ));
    }
    call.decode(&outcome.return_data)
}
