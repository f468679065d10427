//! Well-known addresses and constants
//!
//! This module centralizes magic constants and well-known contract addresses
//! used throughout the farmscan crate.

use alloy_primitives::{address, Address};

/// Canonical Multicall3 deployment, identical on every major EVM chain.
///
/// Contract: 0xcA11bde05977b3631167028862bE2a173976CA11
pub const MULTICALL3_ADDRESS: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

/// Default fixed-point scale of a scheduler's raw bonus multiplier (10^18).
pub const BONUS_MULTIPLIER_SCALE: u128 = 1_000_000_000_000_000_000;

/// Basis points in one whole (100%).
pub const BASIS_POINTS: u32 = 10_000;

/// Factor turning a pool weight into its multiplier label (0.1 becomes "10X").
pub const MULTIPLIER_LABEL_SCALE: u32 = 100;

/// Decimals assumed for a scheduler's reward token when none is configured.
pub const DEFAULT_REWARD_DECIMALS: u8 = 18;

/// Decimals of UniswapV2-style LP tokens.
pub const LP_TOKEN_DECIMALS: u8 = 18;

/// Batching and retry defaults.
pub mod engine {
    use std::time::Duration;

    /// Calls carried by one aggregated request.
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

    /// Time a batch stays open after its first call.
    pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(10);

    /// Per-attempt deadline for an aggregated request.
    pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

    /// Interval of the `eth_blockNumber` height poller.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
}
