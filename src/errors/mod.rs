//! Error types for the farmscan library.
//!
//! This module follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`ConfigurationError`],
//!   [`RpcError`], [`EngineError`])
//! - **Per-call error values** ([`CallError`]) that are cached and delivered to
//!   subscribers instead of being thrown
//! - **Unified error type** ([`FarmscanError`]) for convenience when you don't
//!   need to distinguish between error sources
//!
//! # Error scopes
//!
//! | Error | Scope | Retried |
//! |-------|-------|---------|
//! | [`CallError::Decode`] | one call key | no |
//! | [`CallError::Execution`] | one call key | no |
//! | [`RpcError`] / [`CallError::Transport`] | whole batch | with backoff |
//! | [`ConfigurationError`] | registration | no, surfaced immediately |
//!
//! # Examples
//!
//! ```rust,ignore
//! use farmscan::{CallSpec, EngineError, ReadEngine};
//!
//! async fn example(engine: &ReadEngine, spec: CallSpec) -> Result<(), EngineError> {
//!     match engine.fetch(&spec).await {
//!         Ok(observation) => match observation.result {
//!             Ok(value) => println!("value at {}: {:?}", observation.height, value),
//!             Err(call_error) => eprintln!("call failed: {call_error}"),
//!         },
//!         Err(EngineError::Configuration(e)) => eprintln!("bad call spec: {e}"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

mod call;
mod configuration;
mod rpc;

pub use call::CallError;
pub use configuration::ConfigurationError;
pub use rpc::RpcError;

/// Errors returned by the [`ReadEngine`](crate::ReadEngine) facade.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The call could not be resolved against a registered ABI.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The engine's background tasks have stopped.
    #[error("Read engine has shut down")]
    Shutdown,
}

/// Unified error type for all farmscan operations.
///
/// All module-specific error types convert into `FarmscanError` via `From`,
/// so `?` propagates them naturally.
#[derive(Debug, thiserror::Error)]
pub enum FarmscanError {
    /// Error from call registration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Error from the remote transport.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Error from the read engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A single call failed.
    #[error("Call error: {0}")]
    Call(#[from] CallError),
}
