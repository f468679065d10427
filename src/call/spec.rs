// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Call identity: the request a consumer issues and the key it is cached under.

use std::fmt;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use super::abi::{ContractAbi, MethodAbi};
use crate::errors::{CallError, ConfigurationError};

/// A read request: target contract, method name and ordered arguments.
///
/// # Example
///
/// ```rust
/// use farmscan::CallSpec;
/// use alloy_primitives::address;
///
/// let lp = address!("0eD7e52944161450477ee417DE9Cd3a859b14fD0");
/// let chef = address!("73feaa1eE314F8c655E354234017bE2193C9E24E");
///
/// let spec = CallSpec::new(lp, "balanceOf").arg(chef);
/// assert_eq!(spec.args.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    pub target: Address,
    pub method: String,
    pub args: Vec<DynSolValue>,
}

impl CallSpec {
    pub fn new(target: Address, method: impl Into<String>) -> Self {
        Self {
            target,
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, value: impl Into<DynSolValue>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Canonical identity of a read request.
///
/// The key is the keccak-256 digest of `target ‖ selector ‖ encoded args`, so
/// two specs naming the same method with the same arguments on the same
/// contract always share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallKey(B256);

impl CallKey {
    /// Compute the key for already-encoded calldata.
    pub fn compute(target: Address, call_data: &[u8]) -> Self {
        let mut preimage = Vec::with_capacity(Address::len_bytes() + call_data.len());
        preimage.extend_from_slice(target.as_slice());
        preimage.extend_from_slice(call_data);
        Self(keccak256(preimage))
    }

    pub const fn as_b256(&self) -> B256 {
        self.0
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A [`CallSpec`] validated against its ABI and encoded for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCall {
    key: CallKey,
    target: Address,
    method: MethodAbi,
    call_data: Bytes,
}

impl ResolvedCall {
    /// Resolve a spec against the ABI of its target contract.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the method does not exist or the
    /// arguments don't match its declaration.
    pub fn resolve(spec: &CallSpec, abi: &ContractAbi) -> Result<Self, ConfigurationError> {
        let method = abi.require_method(&spec.method)?.clone();
        let call_data = method.encode_call(&spec.args)?;
        Ok(Self {
            key: CallKey::compute(spec.target, &call_data),
            target: spec.target,
            method,
            call_data,
        })
    }

    pub fn key(&self) -> CallKey {
        self.key
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn method(&self) -> &MethodAbi {
        &self.method
    }

    pub fn call_data(&self) -> &Bytes {
        &self.call_data
    }

    /// Decode this call's raw return data into its declared shape.
    pub fn decode(&self, data: &[u8]) -> Result<DynSolValue, CallError> {
        self.method
            .decode_output(data)
            .map_err(|e| CallError::decode(self.method.signature(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};

    const LP: Address = address!("0ed7e52944161450477ee417de9cd3a859b14fd0");
    const CHEF: Address = address!("73feaa1ee314f8c655e354234017be2193c9e24e");

    #[test]
    fn test_identical_specs_share_a_key() {
        let erc20 = ContractAbi::erc20();
        let a = ResolvedCall::resolve(&CallSpec::new(LP, "balanceOf").arg(CHEF), &erc20).unwrap();
        let b = ResolvedCall::resolve(&CallSpec::new(LP, "balanceOf").arg(CHEF), &erc20).unwrap();
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_key_depends_on_target_method_and_args() {
        let erc20 = ContractAbi::erc20();
        let base = ResolvedCall::resolve(&CallSpec::new(LP, "balanceOf").arg(CHEF), &erc20).unwrap();
        let other_target =
            ResolvedCall::resolve(&CallSpec::new(CHEF, "balanceOf").arg(CHEF), &erc20).unwrap();
        let other_arg = ResolvedCall::resolve(&CallSpec::new(LP, "balanceOf").arg(LP), &erc20).unwrap();
        let other_method = ResolvedCall::resolve(&CallSpec::new(LP, "totalSupply"), &erc20).unwrap();

        assert_ne!(base.key(), other_target.key());
        assert_ne!(base.key(), other_arg.key());
        assert_ne!(base.key(), other_method.key());
    }

    #[test]
    fn test_resolve_unknown_method() {
        let err = ResolvedCall::resolve(&CallSpec::new(LP, "mint"), &ContractAbi::erc20()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownMethod {
                contract: "ERC20".to_string(),
                method: "mint".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_maps_errors_to_call_error() {
        let call = ResolvedCall::resolve(&CallSpec::new(LP, "totalSupply"), &ContractAbi::erc20()).unwrap();
        let err = call.decode(&[0xde, 0xad]).unwrap_err();
        assert!(matches!(err, CallError::Decode { ref method, .. } if method == "totalSupply()"));

        let ok = call.decode(&U256::from(7u64).to_be_bytes::<32>()).unwrap();
        assert_eq!(ok.as_uint(), Some((U256::from(7u64), 256)));
    }
}
