//! Subscription handles delivering cached results and live updates.
//!
//! A [`Subscription`] is a receiver on a cache entry's watch channel. Each key
//! publishes in non-decreasing height order, so a subscriber never observes a
//! lower height than one it has already seen. Dropping the handle
//! unsubscribes; it never cancels the batch computing the key.

use futures::Stream;
use tokio::sync::watch;

use crate::cache::Observation;
use crate::call::spec::CallKey;
use crate::errors::EngineError;

/// Live view of one call key.
///
/// # Example
///
/// ```rust,ignore
/// let mut subscription = engine.request_value(spec)?;
/// if let Some(observation) = subscription.current() {
///     println!("cached at {}: {:?}", observation.height, observation.result);
/// }
/// while let Some(update) = subscription.next().await {
///     println!("updated at {}", update.height);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Subscription {
    key: CallKey,
    receiver: watch::Receiver<Option<Observation>>,
}

impl Subscription {
    pub(crate) fn new(key: CallKey, receiver: watch::Receiver<Option<Observation>>) -> Self {
        Self { key, receiver }
    }

    pub fn key(&self) -> CallKey {
        self.key
    }

    /// The latest published observation, if the key has resolved yet.
    pub fn current(&self) -> Option<Observation> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next observation published after the last one seen.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shutdown`] once the engine owning the key has
    /// been dropped.
    pub async fn changed(&mut self) -> Result<Observation, EngineError> {
        loop {
            self.receiver
                .changed()
                .await
                .map_err(|_| EngineError::Shutdown)?;
            let latest = self.receiver.borrow_and_update().clone();
            if let Some(observation) = latest {
                return Ok(observation);
            }
        }
    }

    /// Like [`changed`](Self::changed), yielding `None` after shutdown.
    pub async fn next(&mut self) -> Option<Observation> {
        self.changed().await.ok()
    }

    /// Adapt into a stream of updates after the current value.
    pub fn into_stream(self) -> impl Stream<Item = Observation> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|observation| (observation, subscription))
        })
    }

    /// Stop receiving updates.
    pub fn unsubscribe(self) {}
}
