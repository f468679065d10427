// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for on-chain quantities.
//!
//! - Token amounts and decimals, normalized exactly with `bigdecimal`

pub mod tokens;

// Note: Public types are re-exported from lib.rs, not here
