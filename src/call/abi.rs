// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! ABI descriptions for the contract methods the engine is allowed to read.
//!
//! A [`MethodAbi`] pairs a method name with its argument and return types and
//! derives the 4-byte selector from the canonical signature. A
//! [`ContractAbi`] is a named set of methods registered against one or more
//! target addresses.
//!
//! # Example
//!
//! ```rust
//! use farmscan::{ContractAbi, MethodAbi};
//!
//! let get_reserves = MethodAbi::parse("getReserves", &[], &["uint112", "uint112", "uint32"])?;
//! let pair = ContractAbi::new("UniswapV2Pair").with_method(get_reserves);
//!
//! assert_eq!(pair.method("getReserves").unwrap().signature(), "getReserves()");
//! # Ok::<(), farmscan::ConfigurationError>(())
//! ```

use std::collections::HashMap;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, Bytes, Selector};

use crate::errors::ConfigurationError;

/// Description of a single read-only contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodAbi {
    name: String,
    inputs: Vec<DynSolType>,
    outputs: Vec<DynSolType>,
    selector: Selector,
}

impl MethodAbi {
    /// Build a method description from already-parsed types.
    pub fn new(name: impl Into<String>, inputs: Vec<DynSolType>, outputs: Vec<DynSolType>) -> Self {
        let name = name.into();
        let selector = selector_for(&name, &inputs);
        Self {
            name,
            inputs,
            outputs,
            selector,
        }
    }

    /// Build a method description from Solidity type strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidType`] if any type string is not a
    /// valid Solidity type.
    pub fn parse(
        name: impl Into<String>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let inputs = parse_types(&name, inputs)?;
        let outputs = parse_types(&name, outputs)?;
        Ok(Self::new(name, inputs, outputs))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn inputs(&self) -> &[DynSolType] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[DynSolType] {
        &self.outputs
    }

    /// Canonical signature used for the selector, e.g. `balanceOf(address)`.
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }

    /// ABI-encode a call to this method: selector followed by the encoded arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the argument count or any argument
    /// type does not match the declaration.
    pub fn encode_call(&self, args: &[DynSolValue]) -> Result<Bytes, ConfigurationError> {
        if args.len() != self.inputs.len() {
            return Err(ConfigurationError::ArgumentCount {
                method: self.signature(),
                expected: self.inputs.len(),
                actual: args.len(),
            });
        }

        if let Some((index, ty)) = self
            .inputs
            .iter()
            .zip(args)
            .enumerate()
            .find_map(|(index, (ty, arg))| (!ty.matches(arg)).then_some((index, ty)))
        {
            return Err(ConfigurationError::ArgumentType {
                method: self.signature(),
                index,
                expected: ty.sol_type_name().into_owned(),
            });
        }

        let mut data = self.selector.to_vec();
        data.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
        Ok(Bytes::from(data))
    }

    /// Decode raw return data according to the declared outputs.
    ///
    /// Methods with a single output yield that value directly; methods with
    /// several outputs yield a [`DynSolValue::Tuple`].
    pub fn decode_output(&self, data: &[u8]) -> Result<DynSolValue, alloy_dyn_abi::Error> {
        let decoded = DynSolType::Tuple(self.outputs.clone()).abi_decode_params(data)?;
        match decoded {
            DynSolValue::Tuple(mut values) if values.len() == 1 => Ok(values.remove(0)),
            other => Ok(other),
        }
    }
}

/// A named set of [`MethodAbi`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAbi {
    name: String,
    methods: HashMap<String, MethodAbi>,
}

impl ContractAbi {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Add a method, replacing any method with the same name.
    pub fn with_method(mut self, method: MethodAbi) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<&MethodAbi> {
        self.methods.get(name)
    }

    /// Look up a method, failing with [`ConfigurationError::UnknownMethod`].
    pub fn require_method(&self, name: &str) -> Result<&MethodAbi, ConfigurationError> {
        self.method(name)
            .ok_or_else(|| ConfigurationError::UnknownMethod {
                contract: self.name.clone(),
                method: name.to_string(),
            })
    }

    /// Read-only subset of the ERC-20 interface.
    pub fn erc20() -> Self {
        Self::new("ERC20")
            .with_method(MethodAbi::new(
                "balanceOf",
                vec![DynSolType::Address],
                vec![DynSolType::Uint(256)],
            ))
            .with_method(MethodAbi::new(
                "totalSupply",
                vec![],
                vec![DynSolType::Uint(256)],
            ))
            .with_method(MethodAbi::new("decimals", vec![], vec![DynSolType::Uint(8)]))
    }

    /// Read-only subset of a MasterChef-style emission scheduler.
    ///
    /// `poolInfo(pid)` returns
    /// `(lpToken, allocPoint, lastRewardBlock, accRewardPerShare, depositFeeBP, harvestInterval)`.
    pub fn master_chef(methods: &SchedulerMethods) -> Self {
        Self::new("MasterChef")
            .with_method(MethodAbi::new(
                methods.pool_info.clone(),
                vec![DynSolType::Uint(256)],
                vec![
                    DynSolType::Address,
                    DynSolType::Uint(256),
                    DynSolType::Uint(256),
                    DynSolType::Uint(256),
                    DynSolType::Uint(16),
                    DynSolType::Uint(256),
                ],
            ))
            .with_method(MethodAbi::new(
                methods.total_alloc_point.clone(),
                vec![],
                vec![DynSolType::Uint(256)],
            ))
            .with_method(MethodAbi::new(
                methods.reward_per_block.clone(),
                vec![],
                vec![DynSolType::Uint(256)],
            ))
            .with_method(MethodAbi::new(
                methods.bonus_multiplier.clone(),
                vec![],
                vec![DynSolType::Uint(256)],
            ))
    }
}

/// Method names of a MasterChef-style scheduler.
///
/// Forks rename the emission getter (`cakePerBlock`, `eggPerBlock`, ...), so
/// every name is configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerMethods {
    pub pool_info: String,
    pub total_alloc_point: String,
    pub reward_per_block: String,
    pub bonus_multiplier: String,
}

impl Default for SchedulerMethods {
    fn default() -> Self {
        Self {
            pool_info: "poolInfo".to_string(),
            total_alloc_point: "totalAllocPoint".to_string(),
            reward_per_block: "rewardPerBlock".to_string(),
            bonus_multiplier: "BONUS_MULTIPLIER".to_string(),
        }
    }
}

fn parse_types(method: &str, types: &[&str]) -> Result<Vec<DynSolType>, ConfigurationError> {
    types
        .iter()
        .map(|ty| {
            DynSolType::parse(ty).map_err(|e| ConfigurationError::InvalidType {
                method: method.to_string(),
                ty: ty.to_string(),
                details: e.to_string(),
            })
        })
        .collect()
}

fn canonical_signature(name: &str, inputs: &[DynSolType]) -> String {
    let types = inputs
        .iter()
        .map(|ty| ty.sol_type_name())
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}({types})")
}

fn selector_for(name: &str, inputs: &[DynSolType]) -> Selector {
    let hash = keccak256(canonical_signature(name, inputs).as_bytes());
    Selector::from_slice(&hash[..4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex, U256};

    #[test]
    fn test_erc20_selectors() {
        let erc20 = ContractAbi::erc20();
        assert_eq!(
            erc20.method("balanceOf").unwrap().selector(),
            Selector::from(hex!("70a08231"))
        );
        assert_eq!(
            erc20.method("totalSupply").unwrap().selector(),
            Selector::from(hex!("18160ddd"))
        );
        assert_eq!(
            erc20.method("decimals").unwrap().selector(),
            Selector::from(hex!("313ce567"))
        );
    }

    #[test]
    fn test_parse_rejects_invalid_type() {
        let err = MethodAbi::parse("broken", &["uint257"], &[]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidType { .. }));
    }

    #[test]
    fn test_encode_call_layout() {
        let holder = address!("00000000000000000000000000000000000000aa");
        let method = ContractAbi::erc20().method("balanceOf").unwrap().clone();
        let data = method.encode_call(&[holder.into()]).unwrap();

        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], hex!("70a08231").as_slice());
        assert_eq!(&data[16..], holder.as_slice());
    }

    #[test]
    fn test_encode_call_rejects_wrong_arity() {
        let method = ContractAbi::erc20().method("balanceOf").unwrap().clone();
        let err = method.encode_call(&[]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ArgumentCount {
                method: "balanceOf(address)".to_string(),
                expected: 1,
                actual: 0,
            }
        );
    }

    #[test]
    fn test_encode_call_rejects_wrong_type() {
        let method = ContractAbi::erc20().method("balanceOf").unwrap().clone();
        let err = method.encode_call(&[DynSolValue::Bool(true)]).unwrap_err();
        assert!(matches!(err, ConfigurationError::ArgumentType { index: 0, .. }));
    }

    #[test]
    fn test_decode_single_output_unwraps_tuple() {
        let method = ContractAbi::erc20().method("totalSupply").unwrap().clone();
        let encoded = DynSolValue::Uint(U256::from(123_456u64), 256).abi_encode();
        let value = method.decode_output(&encoded).unwrap();
        assert_eq!(value.as_uint(), Some((U256::from(123_456u64), 256)));
    }

    #[test]
    fn test_decode_multiple_outputs_yields_tuple() {
        let method = MethodAbi::parse("getReserves", &[], &["uint112", "uint112", "uint32"]).unwrap();
        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(10u64), 112),
            DynSolValue::Uint(U256::from(20u64), 112),
            DynSolValue::Uint(U256::from(30u64), 32),
        ])
        .abi_encode_params();

        let value = method.decode_output(&encoded).unwrap();
        let fields = value.as_tuple().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1].as_uint(), Some((U256::from(20u64), 112)));
    }

    #[test]
    fn test_decode_short_data_fails() {
        let method = ContractAbi::erc20().method("totalSupply").unwrap().clone();
        assert!(method.decode_output(&[0u8; 3]).is_err());
    }

    #[test]
    fn test_master_chef_custom_names() {
        let methods = SchedulerMethods {
            reward_per_block: "cakePerBlock".to_string(),
            ..Default::default()
        };
        let chef = ContractAbi::master_chef(&methods);
        assert!(chef.method("cakePerBlock").is_some());
        assert!(chef.method("rewardPerBlock").is_none());
        assert_eq!(
            chef.method("poolInfo").unwrap().signature(),
            "poolInfo(uint256)"
        );
    }
}
