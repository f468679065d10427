// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Raw token amount type

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::decimals::TokenDecimals;

/// Raw token amount in the token's smallest unit.
///
/// To convert to a human-readable amount, use [`normalize`](Self::normalize)
/// with the token's [`TokenDecimals`]. Normalization is exact.
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use bigdecimal::BigDecimal;
/// use farmscan::{TokenAmount, TokenDecimals};
/// use std::str::FromStr;
///
/// let raw = TokenAmount::new(U256::from(123_456u64));
/// let normalized = raw.normalize(TokenDecimals::new(6));
/// assert_eq!(normalized, BigDecimal::from_str("0.123456").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn new(amount: U256) -> Self {
        Self(amount)
    }

    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Extract an amount from a decoded unsigned integer.
    pub fn from_value(value: &DynSolValue) -> Option<Self> {
        value.as_uint().map(|(amount, _)| Self(amount))
    }

    /// The amount as an integer [`BigDecimal`].
    pub fn to_big_decimal(&self) -> BigDecimal {
        BigDecimal::from(self.to_big_int())
    }

    /// Normalize by token decimals: amount / 10^decimals, exactly.
    pub fn normalize(&self, decimals: TokenDecimals) -> BigDecimal {
        BigDecimal::new(self.to_big_int(), decimals.scale())
    }

    fn to_big_int(&self) -> BigInt {
        BigInt::from_bytes_be(Sign::Plus, &self.0.to_be_bytes::<32>())
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
