//! Per-call error kinds stored in the result cache.
//!
//! A [`CallError`] is a *value*: it is cached against the call's key and
//! delivered to subscribers exactly like a decoded result. It never fails a
//! sibling call in the same batch.

use alloy_primitives::Bytes;

/// Outcome error for a single call inside an aggregated batch.
///
/// # Examples
///
/// ```rust
/// use farmscan::CallError;
///
/// let error = CallError::Transport {
///     attempts: 3,
///     details: "connection reset".to_string(),
/// };
/// assert!(error.is_transport());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The call executed but its return data does not match the declared ABI.
    #[error("Failed to decode result of {method}: {details}")]
    Decode {
        /// Signature of the method whose output failed to decode
        method: String,
        /// Decoder error message
        details: String,
    },

    /// The target contract reverted or otherwise failed.
    #[error("Call to {method} reverted")]
    Execution {
        /// Signature of the method that reverted
        method: String,
        /// Raw revert data, if the node returned any
        return_data: Bytes,
    },

    /// The aggregated request carrying this call failed after all retries.
    ///
    /// Keys resolved with this error are refetched on the next request.
    #[error("Aggregated call failed after {attempts} attempts: {details}")]
    Transport {
        /// Number of attempts made for the batch
        attempts: u32,
        /// Message of the last transport error
        details: String,
    },
}

impl CallError {
    /// Create a `Decode` error with details.
    pub fn decode(method: impl Into<String>, details: impl std::fmt::Display) -> Self {
        CallError::Decode {
            method: method.into(),
            details: details.to_string(),
        }
    }

    /// Create an `Execution` error carrying the revert data.
    pub fn execution(method: impl Into<String>, return_data: Bytes) -> Self {
        CallError::Execution {
            method: method.into(),
            return_data,
        }
    }

    /// Returns `true` for batch-wide transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, CallError::Transport { .. })
    }
}
