//! Error types for call registration.
//!
//! Configuration errors mean a [`CallSpec`](crate::CallSpec) cannot be
//! resolved against any registered ABI. They are surfaced synchronously to the
//! registering caller and are never retried.

use alloy_primitives::Address;

/// Errors raised while resolving a call against its ABI description.
///
/// # Examples
///
/// ```rust
/// use farmscan::{CallSpec, ConfigurationError, ContractAbi, ResolvedCall};
/// use alloy_primitives::Address;
///
/// let spec = CallSpec::new(Address::ZERO, "mint");
/// let err = ResolvedCall::resolve(&spec, &ContractAbi::erc20()).unwrap_err();
/// assert!(matches!(err, ConfigurationError::UnknownMethod { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// No ABI has been registered for the target address.
    #[error("No ABI registered for contract {target}")]
    UnknownContract {
        /// The unregistered target
        target: Address,
    },

    /// The contract ABI has no method with the requested name.
    #[error("Contract {contract} has no method named {method}")]
    UnknownMethod {
        /// Name of the contract ABI that was searched
        contract: String,
        /// The requested method name
        method: String,
    },

    /// Wrong number of arguments for the method.
    #[error("Method {method} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Method signature
        method: String,
        /// Declared argument count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// An argument value does not match its declared Solidity type.
    #[error("Argument {index} of {method} does not match type {expected}")]
    ArgumentType {
        /// Method signature
        method: String,
        /// Zero-based argument position
        index: usize,
        /// Declared Solidity type
        expected: String,
    },

    /// A method description names a type that is not valid Solidity.
    #[error("Invalid Solidity type `{ty}` in method {method}: {details}")]
    InvalidType {
        /// Method name
        method: String,
        /// The offending type string
        ty: String,
        /// Parser error message
        details: String,
    },
}
