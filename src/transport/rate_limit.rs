// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based rate limiting for the RPC client underneath the multicall
//! transport.
//!
//! A single aggregated batch is one JSON-RPC request, so limits here count
//! batches, not individual reads.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tokio::{sync::Mutex, time::Instant};
use tower::Layer;
use tracing::trace;

/// A Tower layer applying a token-bucket limit to requests.
///
/// The bucket starts full. Each request takes one token and tokens refill
/// continuously at `requests / period`. A request arriving at an empty bucket
/// sleeps until the next token is due.
///
/// # Example
///
/// ```rust,ignore
/// use farmscan::transport::RateLimitLayer;
/// use alloy_rpc_client::ClientBuilder;
///
/// let client = ClientBuilder::default()
///     .layer(RateLimitLayer::per_second(10))
///     .http(rpc_url);
/// ```
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimitLayer {
    /// Allow `requests` requests per `period`.
    ///
    /// ```rust
    /// use farmscan::transport::RateLimitLayer;
    /// use std::time::Duration;
    ///
    /// let layer = RateLimitLayer::new(100, Duration::from_secs(60));
    /// ```
    pub fn new(requests: u32, period: Duration) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(requests, period))),
        }
    }

    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// Enforce a fixed gap between consecutive requests, with no bursts.
    pub fn with_min_delay(delay: Duration) -> Self {
        Self::new(1, delay)
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            service,
            bucket: self.bucket.clone(),
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    /// Tokens per nanosecond.
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(requests: u32, period: Duration) -> Self {
        let capacity = f64::from(requests.max(1));
        let period_nanos = period.as_nanos().max(1) as f64;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / period_nanos,
            last_refill: Instant::now(),
        }
    }

    /// Take a token, or return how long until one is available.
    fn take(&mut self) -> Option<Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_nanos() as f64;
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return None;
        }

        let missing = 1.0 - self.tokens;
        Some(Duration::from_nanos((missing / self.refill_rate).ceil() as u64))
    }
}

/// A Tower service that waits for a token before forwarding each request.
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    service: S,
    bucket: Arc<Mutex<TokenBucket>>,
}

impl<S, Request> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let bucket = self.bucket.clone();
        let mut service = self.service.clone();

        Box::pin(async move {
            loop {
                let wait = bucket.lock().await.take();
                match wait {
                    None => break,
                    Some(delay) => {
                        trace!(delay_ms = delay.as_millis() as u64, "Rate limited, waiting");
                        tokio::time::sleep(delay).await;
                    }
                }
            }

            service.call(request).await
        })
    }
}
