// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The chain height signal.
//!
//! The height is written by exactly one [`HeightPublisher`] and read through any
//! number of [`HeightWatch`] handles. Published heights only ever increase.
//!
//! Two feeds are provided: [`spawn_block_poller`] polls `eth_blockNumber`, and
//! [`follow_heights`] forwards any stream of heights (for example a websocket
//! block subscription).

use std::time::Duration;

use alloy_network::Network;
use alloy_provider::Provider;
use futures::{Stream, StreamExt};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, warn};

use crate::errors::RpcError;

/// Sole writer of the height signal.
#[derive(Debug)]
pub struct HeightPublisher {
    sender: watch::Sender<u64>,
}

impl HeightPublisher {
    /// Publish `height` if it is above the current one.
    ///
    /// Returns `true` when watchers were notified.
    pub fn publish(&self, height: u64) -> bool {
        self.sender.send_if_modified(|current| {
            if height > *current {
                *current = height;
                true
            } else {
                false
            }
        })
    }

    pub fn current(&self) -> u64 {
        *self.sender.borrow()
    }

    /// Open another read handle.
    pub fn watch(&self) -> HeightWatch {
        HeightWatch {
            receiver: self.sender.subscribe(),
        }
    }

    /// `true` once every [`HeightWatch`] has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Read-only handle on the height signal.
#[derive(Debug, Clone)]
pub struct HeightWatch {
    receiver: watch::Receiver<u64>,
}

impl HeightWatch {
    /// Create the signal, returning its writer and a first reader.
    ///
    /// ```rust
    /// use farmscan::HeightWatch;
    ///
    /// let (publisher, watch) = HeightWatch::new(100);
    /// assert!(publisher.publish(101));
    /// assert!(!publisher.publish(99));
    /// assert_eq!(watch.current(), 101);
    /// ```
    pub fn new(initial: u64) -> (HeightPublisher, HeightWatch) {
        let (sender, receiver) = watch::channel(initial);
        (HeightPublisher { sender }, HeightWatch { receiver })
    }

    pub fn current(&self) -> u64 {
        *self.receiver.borrow()
    }

    /// Wait for a height newer than the last one this handle saw.
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }
}

/// Poll `eth_blockNumber` every `interval` and publish new heights.
///
/// Polling errors are logged and skipped. The task ends once every watcher of
/// `publisher` has been dropped.
pub fn spawn_block_poller<P, N>(
    provider: P,
    publisher: HeightPublisher,
    interval: Duration,
) -> JoinHandle<()>
where
    P: Provider<N> + 'static,
    N: Network,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !publisher.is_closed() {
            ticker.tick().await;
            match provider
                .get_block_number()
                .await
                .map_err(RpcError::get_block_number_failed)
            {
                Ok(height) => {
                    if publisher.publish(height) {
                        debug!(height, "New block height");
                    }
                }
                Err(error) => warn!(%error, "Block height poll failed"),
            }
        }
        debug!("Height poller stopped, no watchers left");
    })
}

/// Publish every height from `heights` until the stream ends or no watcher is
/// left.
pub async fn follow_heights<S>(heights: S, publisher: &HeightPublisher)
where
    S: Stream<Item = u64>,
{
    let mut heights = std::pin::pin!(heights);
    while let Some(height) = heights.next().await {
        if publisher.is_closed() {
            break;
        }
        publisher.publish(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_is_monotonic() {
        let (publisher, watch) = HeightWatch::new(10);
        assert!(!publisher.publish(10));
        assert!(!publisher.publish(9));
        assert!(publisher.publish(12));
        assert_eq!(watch.current(), 12);
        assert_eq!(publisher.current(), 12);
    }

    #[tokio::test]
    async fn test_changed_sees_latest() {
        let (publisher, mut watch) = HeightWatch::new(0);
        publisher.publish(1);
        publisher.publish(2);
        assert_eq!(watch.changed().await, Some(2));

        drop(publisher);
        assert_eq!(watch.changed().await, None);
    }

    #[tokio::test]
    async fn test_follow_heights_ignores_regressions() {
        let (publisher, mut watch) = HeightWatch::new(0);
        follow_heights(futures::stream::iter([5, 3, 7, 7]), &publisher).await;

        assert_eq!(watch.current(), 7);
        assert_eq!(watch.changed().await, Some(7));
    }

    #[test]
    fn test_publisher_closed_without_watchers() {
        let (publisher, watch) = HeightWatch::new(0);
        let second = publisher.watch();
        drop(watch);
        assert!(!publisher.is_closed());
        drop(second);
        assert!(publisher.is_closed());
    }
}
