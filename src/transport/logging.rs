// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging for the RPC client underneath the multicall transport.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use alloy_json_rpc::{RequestPacket, ResponsePacket};
use alloy_transport::TransportError;
use tower::Layer;
use tracing::{debug, warn, Instrument};

/// Default duration above which a request is logged as slow.
const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(5);

/// A Tower layer that records every JSON-RPC request in a tracing span.
///
/// Requests finishing within the slow threshold are logged at `DEBUG`; slower
/// ones and failures at `WARN`.
///
/// # Example
///
/// ```rust,ignore
/// use farmscan::transport::LoggingLayer;
/// use alloy_rpc_client::ClientBuilder;
/// use std::time::Duration;
///
/// let client = ClientBuilder::default()
///     .layer(LoggingLayer::new().with_slow_threshold(Duration::from_secs(2)))
///     .http(rpc_url);
/// ```
#[derive(Clone, Debug)]
pub struct LoggingLayer {
    slow_threshold: Duration,
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self {
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }
}

impl LoggingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            slow_threshold: self.slow_threshold,
        }
    }
}

/// A Tower service that logs RPC requests and their latency.
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    slow_threshold: Duration,
}

impl<S> tower::Service<RequestPacket> for LoggingService<S>
where
    S: tower::Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let slow_threshold = self.slow_threshold;
        let mut service = self.service.clone();
        let method = describe(&request);
        let span = tracing::debug_span!("rpc_request", method = %method);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = service.call(request).await;
                let elapsed = start.elapsed();
                let duration_ms = elapsed.as_millis() as u64;

                match &result {
                    Err(error) => warn!(%error, duration_ms, "RPC request failed"),
                    Ok(_) if elapsed > slow_threshold => {
                        warn!(duration_ms, "Slow RPC request")
                    }
                    Ok(_) => debug!(duration_ms, "RPC request completed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

fn describe(request: &RequestPacket) -> String {
    match request {
        RequestPacket::Single(req) => req.method().to_string(),
        RequestPacket::Batch(reqs) => match reqs.as_slice() {
            [] => "batch(empty)".to_string(),
            [only] => only.method().to_string(),
            many => format!("batch({} requests)", many.len()),
        },
    }
}
