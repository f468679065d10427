//! Shared RPC error types for the remote aggregation path.
//!
//! These errors describe failures of the *transport*: the aggregated call could
//! not be delivered, its envelope could not be parsed, or it did not come back
//! in time. They are scoped to a whole batch. Per-call failures are modelled
//! separately by [`CallError`](super::CallError).

use std::time::Duration;

/// Errors that can occur while talking to the remote data source.
///
/// # Examples
///
/// ```rust
/// use farmscan::RpcError;
/// use std::time::Duration;
///
/// let error = RpcError::Timeout {
///     timeout: Duration::from_secs(30),
/// };
/// assert_eq!(error.to_string(), "Aggregated call timed out after 30s");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The aggregated call could not be delivered or the node rejected it.
    #[error("Aggregated call with {call_count} calls failed")]
    AggregateCallFailed {
        /// Number of calls carried by the failed request
        call_count: usize,
        /// The underlying provider error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The aggregated response envelope could not be decoded.
    #[error("Failed to decode aggregated response: {details}")]
    EnvelopeDecodeFailed {
        /// Details about why the decode failed
        details: String,
    },

    /// The node returned a different number of outcomes than calls sent.
    #[error("Aggregated response carried {actual} outcomes for {expected} calls")]
    OutcomeCountMismatch {
        /// Number of calls in the request
        expected: usize,
        /// Number of outcomes in the response
        actual: usize,
    },

    /// The aggregated call did not complete within the configured timeout.
    #[error("Aggregated call timed out after {}s", timeout.as_secs())]
    Timeout {
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// Failed to fetch the current block number.
    #[error("Failed to get current block number")]
    GetBlockNumberFailed {
        /// The underlying provider error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provider URL could not be parsed.
    #[error("Invalid provider URL: {0}")]
    ProviderUrlInvalid(String),

    /// The provider connection could not be established.
    #[error("Provider connection failed: {0}")]
    ProviderConnectionFailed(String),
}

impl RpcError {
    /// Helper to create an `AggregateCallFailed` error from any error type.
    pub fn aggregate_call_failed(
        call_count: usize,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::AggregateCallFailed {
            call_count,
            source: Box::new(source),
        }
    }

    /// Helper to create an `EnvelopeDecodeFailed` error with details.
    pub fn envelope_decode_failed(details: impl std::fmt::Display) -> Self {
        RpcError::EnvelopeDecodeFailed {
            details: details.to_string(),
        }
    }

    /// Helper to create a `GetBlockNumberFailed` error from any error type.
    pub fn get_block_number_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RpcError::GetBlockNumberFailed {
            source: Box::new(source),
        }
    }
}
