// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Height-keyed store of call results.

use std::collections::HashMap;

use tokio::sync::watch;
use tracing::{debug, trace};

use super::{CacheStats, CallResult, Observation};
use crate::call::spec::{CallKey, ResolvedCall};
use crate::errors::CallError;

/// Cached state of one [`CallKey`].
///
/// The entry owns the notification channel its subscribers listen on, so a
/// key's subscribers outlive any single batch that computes it.
#[derive(Debug)]
pub struct CacheEntry {
    call: ResolvedCall,
    observation: Option<Observation>,
    /// Last observation that was not a transport failure.
    resolved: Option<Observation>,
    stale: bool,
    in_flight: bool,
    notifier: watch::Sender<Option<Observation>>,
}

impl CacheEntry {
    fn new(call: ResolvedCall) -> Self {
        let (notifier, _) = watch::channel(None);
        Self {
            call,
            observation: None,
            resolved: None,
            stale: false,
            in_flight: false,
            notifier,
        }
    }

    pub fn key(&self) -> CallKey {
        self.call.key()
    }

    pub fn call(&self) -> &ResolvedCall {
        &self.call
    }

    /// Height of the stored result, if any.
    pub fn height(&self) -> Option<u64> {
        self.observation.as_ref().map(|o| o.height)
    }

    pub fn value(&self) -> Option<&CallResult> {
        self.observation.as_ref().map(|o| &o.result)
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    /// `true` once a newer height has been observed than the stored result's.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifier.receiver_count()
    }

    /// A result that can be served without a remote call.
    ///
    /// Transport failures are never fresh: the next request retries them.
    pub fn is_fresh(&self) -> bool {
        !self.stale
            && self
                .value()
                .is_some_and(|result| !result.as_ref().is_err_and(CallError::is_transport))
    }

    fn holds_transport_failure(&self) -> bool {
        self.value()
            .is_some_and(|result| result.as_ref().is_err_and(CallError::is_transport))
    }

    /// Store and broadcast `observation`; returns whether it is behind `cache_height`.
    fn publish(&mut self, observation: Observation, cache_height: u64) -> bool {
        let outdated = observation.height < cache_height;
        self.stale = outdated;
        if !observation
            .result
            .as_ref()
            .is_err_and(CallError::is_transport)
        {
            self.resolved = Some(observation.clone());
        }
        self.observation = Some(observation.clone());
        self.notifier.send_replace(Some(observation));
        outdated
    }
}

/// What [`ResultCache::claim`] decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A fresh result is cached; no work needed.
    Cached,
    /// The key is already in flight; the caller waits for that result.
    Joined,
    /// The caller must hand this call to the scheduler.
    Schedule(ResolvedCall),
}

/// Outcome of [`ResultCache::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored and published.
    Stored,
    /// Stored and published, but a newer height had already been observed.
    /// The entry is marked stale.
    Outdated,
    /// Dropped: the entry already holds a result from a later height.
    Discarded,
}

/// The cache: one [`CacheEntry`] per [`CallKey`] plus the latest height seen.
///
/// Entries are never removed. A height transition marks older entries stale;
/// they keep serving their last value until a newer write replaces it.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<CallKey, CacheEntry>,
    height: u64,
    stats: CacheStats,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a known height.
    pub fn with_height(height: u64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    /// Latest height passed to [`invalidate`](Self::invalidate).
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn get(&self, key: &CallKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Decide whether `call` needs remote work, marking it in flight if so.
    ///
    /// Concurrent claims for the same key produce at most one
    /// [`Claim::Schedule`] until the key is written.
    pub fn claim(&mut self, call: &ResolvedCall) -> Claim {
        let entry = self
            .entries
            .entry(call.key())
            .or_insert_with(|| CacheEntry::new(call.clone()));

        if entry.in_flight {
            self.stats.joins += 1;
            return Claim::Joined;
        }
        if entry.is_fresh() {
            self.stats.hits += 1;
            return Claim::Cached;
        }

        self.stats.misses += 1;
        entry.in_flight = true;
        Claim::Schedule(entry.call.clone())
    }

    /// Open a notification channel on a key's entry.
    ///
    /// The receiver treats the current value as already seen.
    pub fn subscribe(&self, key: &CallKey) -> Option<watch::Receiver<Option<Observation>>> {
        self.entries.get(key).map(|entry| entry.notifier.subscribe())
    }

    /// Write the result of `key` computed at `height`.
    ///
    /// Writes older than the entry's stored height are discarded so a key's
    /// observed height never decreases. Any write clears the in-flight flag.
    /// A discarded write over a transport failure republishes the key's last
    /// resolved observation, so waiting readers are not left on the failure.
    pub fn put(&mut self, key: &CallKey, height: u64, result: CallResult) -> WriteOutcome {
        let Some(entry) = self.entries.get_mut(key) else {
            trace!(%key, "Dropping write for unknown key");
            return WriteOutcome::Discarded;
        };
        entry.in_flight = false;

        if entry.height().is_some_and(|current| height < current) {
            self.stats.stale_writes += 1;
            debug!(%key, height, current = entry.height(), "Discarding out-of-order write");
            if entry.holds_transport_failure() {
                if let Some(resolved) = entry.resolved.clone() {
                    entry.publish(resolved, self.height);
                }
            }
            return WriteOutcome::Discarded;
        }

        if entry.publish(Observation { height, result }, self.height) {
            WriteOutcome::Outdated
        } else {
            WriteOutcome::Stored
        }
    }

    /// Record a batch-wide transport failure for `key`.
    ///
    /// The failure carries no height of its own: it is published at the
    /// key's last resolved height, or 0 for a key that never resolved, so any
    /// later read the node answers is accepted.
    pub fn put_failure(&mut self, key: &CallKey, error: CallError) -> WriteOutcome {
        let height = self
            .entries
            .get(key)
            .and_then(|entry| entry.resolved.as_ref())
            .map_or(0, |resolved| resolved.height);
        self.put(key, height, Err(error))
    }

    /// Re-claim a stale key that still has subscribers.
    ///
    /// Returns the call to reschedule, or `None` when no refresh is needed.
    pub fn refresh(&mut self, key: &CallKey) -> Option<ResolvedCall> {
        let entry = self.entries.get_mut(key)?;
        if entry.in_flight || !entry.stale || entry.subscriber_count() == 0 {
            return None;
        }
        entry.in_flight = true;
        self.stats.refreshes += 1;
        Some(entry.call.clone())
    }

    /// Advance to `height`, marking every older entry stale.
    ///
    /// Returns the calls of stale entries that have live subscribers and are
    /// not already in flight; they are marked in flight and must be scheduled.
    /// Heights at or below the current one are ignored.
    pub fn invalidate(&mut self, height: u64) -> Vec<ResolvedCall> {
        if height <= self.height {
            return Vec::new();
        }
        self.height = height;
        self.stats.invalidations += 1;

        let mut refresh = Vec::new();
        for entry in self.entries.values_mut() {
            if !entry.height().is_some_and(|h| h < height) {
                continue;
            }
            entry.stale = true;
            if !entry.in_flight && entry.subscriber_count() > 0 {
                entry.in_flight = true;
                refresh.push(entry.call.clone());
            }
        }
        self.stats.refreshes += refresh.len() as u64;
        refresh
    }
}
