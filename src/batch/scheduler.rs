// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batch accumulation.
//!
//! [`BatchScheduler`] is a handle on an actor task. Scheduling never blocks:
//! calls go through an unbounded queue and the actor groups them into
//! [`PendingBatch`]es, closing a batch when it is full or when `max_wait` has
//! passed since its first call. A closed batch is handed to the dispatch
//! function and a new one opens immediately.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::call::spec::{CallKey, ResolvedCall};
use crate::errors::EngineError;
use crate::transport::AggregateCall;

/// An ordered set of calls executed by one aggregated request.
///
/// Duplicate keys are skipped so each key appears at most once.
#[derive(Debug, Clone, Default)]
pub struct PendingBatch {
    calls: Vec<ResolvedCall>,
    keys: HashSet<CallKey>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call. Returns `false` if its key is already in the batch.
    pub fn push(&mut self, call: ResolvedCall) -> bool {
        if !self.keys.insert(call.key()) {
            return false;
        }
        self.calls.push(call);
        true
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn contains(&self, key: &CallKey) -> bool {
        self.keys.contains(key)
    }

    pub fn calls(&self) -> &[ResolvedCall] {
        &self.calls
    }

    /// The batch as ordered `(target, calldata)` pairs.
    pub fn aggregate_calls(&self) -> Vec<AggregateCall> {
        self.calls
            .iter()
            .map(|call| AggregateCall {
                target: call.target(),
                call_data: call.call_data().clone(),
            })
            .collect()
    }
}

impl FromIterator<ResolvedCall> for PendingBatch {
    fn from_iter<I: IntoIterator<Item = ResolvedCall>>(iter: I) -> Self {
        let mut batch = Self::new();
        for call in iter {
            batch.push(call);
        }
        batch
    }
}

/// Handle for feeding calls to the batching actor.
///
/// Clones share one queue. The actor stops after every handle is dropped and
/// the last open batch has been dispatched.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    sender: mpsc::UnboundedSender<ResolvedCall>,
}

/// Non-owning scheduler handle passed to the dispatch function, so dispatched
/// work can reschedule calls without keeping the actor alive.
#[derive(Debug, Clone)]
pub struct WeakBatchScheduler {
    sender: mpsc::WeakUnboundedSender<ResolvedCall>,
}

impl WeakBatchScheduler {
    pub fn upgrade(&self) -> Option<BatchScheduler> {
        self.sender.upgrade().map(|sender| BatchScheduler { sender })
    }
}

impl BatchScheduler {
    /// Spawn the batching actor.
    ///
    /// `dispatch` runs on the actor task for every closed batch and must not
    /// block; it typically spawns the batch's execution.
    pub fn spawn<F>(max_batch_size: usize, max_wait: Duration, dispatch: F) -> (Self, JoinHandle<()>)
    where
        F: FnMut(PendingBatch, &WeakBatchScheduler) + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let weak = WeakBatchScheduler {
            sender: sender.downgrade(),
        };
        let handle = tokio::spawn(run(receiver, weak, max_batch_size.max(1), max_wait, dispatch));
        (Self { sender }, handle)
    }

    /// Queue a call for the next batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shutdown`] if the actor has stopped.
    pub fn schedule(&self, call: ResolvedCall) -> Result<(), EngineError> {
        trace!(key = %call.key(), "Scheduling call");
        self.sender.send(call).map_err(|_| EngineError::Shutdown)
    }

    pub fn downgrade(&self) -> WeakBatchScheduler {
        WeakBatchScheduler {
            sender: self.sender.downgrade(),
        }
    }
}

async fn run<F>(
    mut receiver: mpsc::UnboundedReceiver<ResolvedCall>,
    weak: WeakBatchScheduler,
    max_batch_size: usize,
    max_wait: Duration,
    mut dispatch: F,
) where
    F: FnMut(PendingBatch, &WeakBatchScheduler),
{
    while let Some(first) = receiver.recv().await {
        let deadline = Instant::now() + max_wait;
        let mut batch = PendingBatch::new();
        batch.push(first);

        while batch.len() < max_batch_size {
            match timeout_at(deadline, receiver.recv()).await {
                Ok(Some(call)) => {
                    if !batch.push(call) {
                        trace!("Skipping duplicate key in open batch");
                    }
                }
                // Queue closed or window elapsed: dispatch what we have.
                Ok(None) | Err(_) => break,
            }
        }

        debug!(batch_size = batch.len(), "Dispatching batch");
        dispatch(batch, &weak);
    }
    debug!("Batch scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::abi::ContractAbi;
    use crate::call::spec::CallSpec;
    use alloy_primitives::Address;

    fn balance_of(owner: u8) -> ResolvedCall {
        let spec = CallSpec::new(Address::ZERO, "balanceOf").arg(Address::with_last_byte(owner));
        ResolvedCall::resolve(&spec, &ContractAbi::erc20()).unwrap()
    }

    fn collecting(
        max_batch_size: usize,
        max_wait: Duration,
    ) -> (BatchScheduler, mpsc::UnboundedReceiver<PendingBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (scheduler, _handle) = BatchScheduler::spawn(max_batch_size, max_wait, move |batch, _| {
            let _ = tx.send(batch);
        });
        (scheduler, rx)
    }

    #[test]
    fn test_pending_batch_skips_duplicates() {
        let batch: PendingBatch = [balance_of(1), balance_of(2), balance_of(1)]
            .into_iter()
            .collect();
        assert_eq!(batch.len(), 2);
        assert!(batch.contains(&balance_of(2).key()));
        assert_eq!(batch.aggregate_calls()[0].call_data, *balance_of(1).call_data());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_closes_when_full() {
        let (scheduler, mut batches) = collecting(2, Duration::from_secs(60));
        for owner in 0..5 {
            scheduler.schedule(balance_of(owner)).unwrap();
        }

        assert_eq!(batches.recv().await.unwrap().len(), 2);
        assert_eq!(batches.recv().await.unwrap().len(), 2);
        // last one waits for the window
        assert_eq!(batches.recv().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_closes_after_max_wait() {
        let (scheduler, mut batches) = collecting(50, Duration::from_millis(10));
        let start = Instant::now();
        scheduler.schedule(balance_of(1)).unwrap();
        scheduler.schedule(balance_of(2)).unwrap();

        let batch = batches.recv().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_flushes_and_stops_when_handles_dropped() {
        let (scheduler, mut batches) = collecting(50, Duration::from_secs(60));
        scheduler.schedule(balance_of(1)).unwrap();
        drop(scheduler);

        assert_eq!(batches.recv().await.unwrap().len(), 1);
        assert!(batches.recv().await.is_none());
    }
}
