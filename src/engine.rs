// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The read engine facade.
//!
//! [`ReadEngine`] ties together call resolution, deduplication, batching,
//! execution and caching:
//!
//! ```text
//! request_value ─► resolve ─► ResultCache::claim ─┬─ Cached/Joined ─► Subscription
//!                                                 └─ Schedule ─► BatchScheduler
//!                                                                  │
//!                       ResultCache::put ◄─ MulticallExecutor ◄────┘
//!                              │
//!                              └─► subscribers
//! ```
//!
//! A background task follows the [`HeightWatch`] and invalidates the cache on
//! every new height, rescheduling stale keys that still have subscribers.
//!
//! # Example
//!
//! ```rust,ignore
//! use farmscan::{CallSpec, ContractAbi, EngineConfig, HeightWatch, ReadEngine};
//!
//! let (publisher, heights) = HeightWatch::new(0);
//! let engine = ReadEngine::new(transport, heights, EngineConfig::default());
//! engine.register_contract(token, ContractAbi::erc20());
//!
//! let observation = engine.fetch(&CallSpec::new(token, "totalSupply")).await?;
//! println!("total supply at {}: {:?}", observation.height, observation.result);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use alloy_primitives::Address;
use tokio::task::JoinHandle;
use tracing::{debug, error, Instrument};

use crate::batch::{BatchOutcome, BatchScheduler, MulticallExecutor, WeakBatchScheduler};
use crate::cache::{CacheStats, Claim, Observation, ResultCache, WriteOutcome};
use crate::call::abi::ContractAbi;
use crate::call::spec::{CallKey, CallSpec, ResolvedCall};
use crate::config::EngineConfig;
use crate::errors::{CallError, ConfigurationError, EngineError};
use crate::height::HeightWatch;
use crate::spans;
use crate::subscription::Subscription;
use crate::transport::AggregateTransport;

type SharedCache = Arc<Mutex<ResultCache>>;

/// Deduplicating, batching, height-aware reader of contract state.
///
/// Cloning is cheap; clones share one cache and one scheduler. Background
/// tasks stop when the last clone is dropped.
#[derive(Clone)]
pub struct ReadEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    contracts: RwLock<HashMap<Address, ContractAbi>>,
    cache: SharedCache,
    scheduler: BatchScheduler,
    height: HeightWatch,
    config: EngineConfig,
    invalidation: JoinHandle<()>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.invalidation.abort();
    }
}

impl std::fmt::Debug for ReadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadEngine")
            .field("height", &self.inner.height.current())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReadEngine {
    /// Start an engine over `transport`, following `height`.
    ///
    /// Must be called from within a Tokio runtime: the batching actor and the
    /// invalidation task are spawned here.
    pub fn new<T>(transport: T, height: HeightWatch, config: EngineConfig) -> Self
    where
        T: AggregateTransport + 'static,
    {
        let cache: SharedCache = Arc::new(Mutex::new(ResultCache::with_height(height.current())));
        let executor = Arc::new(MulticallExecutor::from_config(transport, &config));

        let dispatch_cache = cache.clone();
        let (scheduler, _actor) = BatchScheduler::spawn(
            config.effective_batch_size(),
            config.max_wait,
            move |batch, weak: &WeakBatchScheduler| {
                let executor = executor.clone();
                let cache = dispatch_cache.clone();
                let weak = weak.clone();
                let span = spans::execute_batch(batch.len());
                tokio::spawn(
                    async move {
                        let dispatched_at = lock(&cache).height();
                        let outcome = executor.execute(&batch).await;
                        let refresh = apply_outcome(&cache, outcome, dispatched_at);
                        if let Some(scheduler) = weak.upgrade() {
                            reschedule(&scheduler, refresh);
                        }
                    }
                    .instrument(span),
                );
            },
        );

        let invalidation = tokio::spawn(follow_height(height.clone(), cache.clone(), scheduler.clone()));

        Self {
            inner: Arc::new(EngineInner {
                contracts: RwLock::new(HashMap::new()),
                cache,
                scheduler,
                height,
                config,
                invalidation,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Register the ABI of the contract at `address`, replacing any previous one.
    pub fn register_contract(&self, address: Address, abi: ContractAbi) {
        self.inner
            .contracts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, abi);
    }

    pub fn contract(&self, address: &Address) -> Option<ContractAbi> {
        self.inner
            .contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    /// Resolve `spec` against the ABI registered for its target.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::UnknownContract`] when no ABI is registered for
    /// the target, otherwise any error from [`ResolvedCall::resolve`].
    pub fn resolve(&self, spec: &CallSpec) -> Result<ResolvedCall, ConfigurationError> {
        let contracts = self
            .inner
            .contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let abi = contracts
            .get(&spec.target)
            .ok_or(ConfigurationError::UnknownContract {
                target: spec.target,
            })?;
        ResolvedCall::resolve(spec, abi)
    }

    /// Ensure `spec` is cached or on its way, without subscribing.
    ///
    /// Identical specs registered while the first is in flight create no new
    /// work.
    pub fn register(&self, spec: &CallSpec) -> Result<CallKey, EngineError> {
        let call = self.resolve(spec)?;
        let claim = self.cache().claim(&call);
        self.submit(claim)?;
        Ok(call.key())
    }

    /// Subscribe to the value of `spec`.
    ///
    /// The subscription carries the cached value, if any, and receives every
    /// later update for the key. A remote read is scheduled only when the key
    /// is neither fresh in the cache nor already in flight.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if the call does not resolve against the
    /// registered ABIs; [`EngineError::Shutdown`] if the batching actor is gone.
    pub fn request_value(&self, spec: &CallSpec) -> Result<Subscription, EngineError> {
        let call = self.resolve(spec)?;
        let key = call.key();

        let (claim, receiver) = {
            let mut cache = self.cache();
            let claim = cache.claim(&call);
            (claim, cache.subscribe(&key))
        };
        self.submit(claim)?;

        let receiver = receiver.ok_or(EngineError::Shutdown)?;
        Ok(Subscription::new(key, receiver))
    }

    /// Read the value of `spec`, waiting for a remote read if needed.
    ///
    /// Returns the cached observation when it is usable; otherwise waits for
    /// the next result for the key, which may be a per-call error.
    pub async fn fetch(&self, spec: &CallSpec) -> Result<Observation, EngineError> {
        let mut subscription = self.request_value(spec)?;
        match subscription.current() {
            Some(observation) if !is_transport_failure(&observation) => Ok(observation),
            _ => subscription.changed().await,
        }
    }

    /// The cached observation for `spec`, without scheduling anything.
    pub fn cached(&self, spec: &CallSpec) -> Result<Option<Observation>, ConfigurationError> {
        let key = self.resolve(spec)?.key();
        Ok(self
            .cache()
            .get(&key)
            .and_then(|entry| entry.observation().cloned()))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    pub fn current_height(&self) -> u64 {
        self.inner.height.current()
    }

    fn submit(&self, claim: Claim) -> Result<(), EngineError> {
        match claim {
            Claim::Schedule(call) => self.inner.scheduler.schedule(call),
            Claim::Cached | Claim::Joined => Ok(()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, ResultCache> {
        lock(&self.inner.cache)
    }
}

fn lock(cache: &Mutex<ResultCache>) -> MutexGuard<'_, ResultCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_transport_failure(observation: &Observation) -> bool {
    observation.error().is_some_and(CallError::is_transport)
}

/// Write a batch outcome into the cache, returning calls that need another read.
///
/// A key written below the cache height is refreshed only if the cache height
/// moved while its batch was in flight, since the invalidation skipped it. A
/// node that is merely behind gets no retry until the next height.
fn apply_outcome(
    cache: &Mutex<ResultCache>,
    outcome: BatchOutcome,
    dispatched_at: u64,
) -> Vec<ResolvedCall> {
    let mut cache = lock(cache);
    let advanced = cache.height() > dispatched_at;
    let mut refresh = Vec::new();

    for (key, result) in outcome.results {
        let written = match (outcome.height, result) {
            (Some(height), result) => cache.put(&key, height, result),
            (None, Err(error)) => cache.put_failure(&key, error),
            (None, Ok(value)) => {
                let height = cache.height();
                cache.put(&key, height, Ok(value))
            }
        };
        if advanced && written == WriteOutcome::Outdated {
            refresh.extend(cache.refresh(&key));
        }
    }
    refresh
}

fn reschedule(scheduler: &BatchScheduler, calls: Vec<ResolvedCall>) {
    for call in calls {
        if let Err(error) = scheduler.schedule(call) {
            error!(%error, "Failed to reschedule stale call");
            return;
        }
    }
}

async fn follow_height(mut height: HeightWatch, cache: SharedCache, scheduler: BatchScheduler) {
    while let Some(new_height) = height.changed().await {
        let span = spans::invalidate(new_height);
        let refresh = {
            let _guard = span.enter();
            let refresh = lock(&cache).invalidate(new_height);
            span.record("refreshed", refresh.len());
            debug!("Cache invalidated");
            refresh
        };
        reschedule(&scheduler, refresh);
    }
    debug!("Height feed closed, invalidation stopped");
}
