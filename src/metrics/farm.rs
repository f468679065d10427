// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Yield farm metrics.

use std::time::Duration;

use alloy_primitives::U256;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use super::Metric;
use crate::config::constants::{BASIS_POINTS, LP_TOKEN_DECIMALS, MULTIPLIER_LABEL_SCALE};
use crate::config::MetricsConfig;
use crate::types::tokens::{TokenAmount, TokenDecimals};

/// What a farm's metrics are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FarmRef {
    /// A pool staked in the emission scheduler under this pool id.
    Staked(u64),
    /// A pair read only for pricing; it has no scheduler slot.
    PriceHelper,
}

impl FarmRef {
    pub fn pid(&self) -> Option<u64> {
        match self {
            FarmRef::Staked(pid) => Some(*pid),
            FarmRef::PriceHelper => None,
        }
    }
}

/// Raw on-chain inputs of one farm. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFarmValues {
    /// Balance of the token held by the LP pair.
    pub token_balance_lp: Option<U256>,
    /// Balance of the quote token held by the LP pair.
    pub quote_balance_lp: Option<U256>,
    /// LP tokens staked in the scheduler.
    pub lp_balance_scheduler: Option<U256>,
    pub lp_total_supply: Option<U256>,
    pub token_decimals: Option<u8>,
    pub quote_decimals: Option<u8>,
    /// Decimals of the LP token, 18 when absent.
    pub lp_decimals: Option<u8>,
    pub alloc_point: Option<U256>,
    pub total_alloc_point: Option<U256>,
    /// Seconds between allowed harvests.
    pub harvest_interval: Option<U256>,
    pub deposit_fee_bp: Option<U256>,
    /// Base reward emitted per block, in the reward token's smallest unit.
    pub reward_per_block: Option<U256>,
    /// Raw bonus multiplier as stored by the scheduler.
    pub bonus_multiplier: Option<U256>,
}

/// Scheduler-slot metrics, only present for [`FarmRef::Staked`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    pub pid: u64,
    /// Share of total allocation points.
    pub pool_weight: Metric<BigDecimal>,
    /// Pool weight × 100, truncated, followed by `X`.
    pub multiplier_label: Metric<String>,
    pub harvest_interval: Metric<Duration>,
    /// Deposit fee as a fraction (400 bp is 0.04).
    pub deposit_fee: Metric<BigDecimal>,
    /// Reward tokens emitted per block, including the bonus multiplier.
    pub emission_rate: Metric<BigDecimal>,
}

/// Derived metrics of one farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFarmMetrics {
    /// Tokens in the LP pair, staked or not.
    pub token_amount_total: Metric<BigDecimal>,
    /// Quote tokens in the LP pair, staked or not.
    pub quote_amount_total: Metric<BigDecimal>,
    pub lp_total_supply: Metric<BigDecimal>,
    /// Share of LP supply staked in the scheduler.
    pub staked_fraction: Metric<BigDecimal>,
    /// Value of the staked LP in quote tokens, assuming a symmetric pool.
    pub lp_total_in_quote_token: Metric<BigDecimal>,
    /// Price of one token in quote tokens.
    pub price_vs_quote: Metric<BigDecimal>,
    /// `None` for [`FarmRef::PriceHelper`].
    pub scheduler: Option<SchedulerMetrics>,
}

/// Derive farm metrics from raw values.
///
/// # Example
///
/// ```rust
/// use alloy_primitives::U256;
/// use farmscan::{compute_farm_metrics, FarmRef, Metric, MetricsConfig, RawFarmValues};
///
/// let raw = RawFarmValues {
///     alloc_point: Some(U256::from(100u64)),
///     total_alloc_point: Some(U256::from(1000u64)),
///     ..Default::default()
/// };
/// let metrics = compute_farm_metrics(&raw, FarmRef::Staked(1), &MetricsConfig::default());
/// let scheduler = metrics.scheduler.unwrap();
/// assert_eq!(scheduler.multiplier_label, Metric::Known("10X".to_string()));
/// ```
pub fn compute_farm_metrics(
    raw: &RawFarmValues,
    farm: FarmRef,
    config: &MetricsConfig,
) -> DerivedFarmMetrics {
    let token_amount_total = normalized(raw.token_balance_lp, raw.token_decimals);
    let quote_amount_total = normalized(raw.quote_balance_lp, raw.quote_decimals);
    let lp_total_supply = normalized(
        raw.lp_total_supply,
        Some(raw.lp_decimals.unwrap_or(LP_TOKEN_DECIMALS)),
    );
    let staked_fraction = ratio(raw.lp_balance_scheduler, raw.lp_total_supply);

    let lp_total_in_quote_token = quote_amount_total
        .clone()
        .zip(staked_fraction.clone())
        .map(|(quote, fraction)| quote * BigDecimal::from(2) * fraction);

    let price_vs_quote = quote_amount_total
        .clone()
        .zip(token_amount_total.clone())
        .and_then(|(quote, token)| divide(&quote, &token));

    let scheduler = farm
        .pid()
        .map(|pid| scheduler_metrics(pid, raw, config));

    DerivedFarmMetrics {
        token_amount_total,
        quote_amount_total,
        lp_total_supply,
        staked_fraction,
        lp_total_in_quote_token,
        price_vs_quote,
        scheduler,
    }
}

fn scheduler_metrics(pid: u64, raw: &RawFarmValues, config: &MetricsConfig) -> SchedulerMetrics {
    let pool_weight = ratio(raw.alloc_point, raw.total_alloc_point);
    let multiplier_label = pool_weight.clone().map(|weight| multiplier_label(&weight));

    let harvest_interval = Metric::from(raw.harvest_interval)
        .map(|seconds| Duration::from_secs(seconds.saturating_to::<u64>()));

    let deposit_fee = Metric::from(raw.deposit_fee_bp).and_then(|bp| {
        divide(
            &TokenAmount::new(bp).to_big_decimal(),
            &BigDecimal::from(BASIS_POINTS),
        )
    });

    let base_rate = normalized(raw.reward_per_block, Some(config.reward_decimals));
    let multiplier = Metric::from(raw.bonus_multiplier)
        .and_then(|raw_multiplier| descale_multiplier(raw_multiplier, config.multiplier_scale));
    let emission_rate = base_rate
        .zip(multiplier)
        .map(|(rate, multiplier)| rate * multiplier);

    SchedulerMetrics {
        pid,
        pool_weight,
        multiplier_label,
        harvest_interval,
        deposit_fee,
        emission_rate,
    }
}

/// Render a pool weight as its multiplier label (0.1 becomes "10X").
pub(crate) fn multiplier_label(weight: &BigDecimal) -> String {
    let scaled = weight.clone() * BigDecimal::from(MULTIPLIER_LABEL_SCALE);
    let (whole, _) = scaled.with_scale(0).into_bigint_and_exponent();
    format!("{whole}X")
}

/// A raw multiplier at or above `scale` is fixed-point and divided by it;
/// below `scale` it is a plain integer. A zero scale disables descaling.
fn descale_multiplier(raw: U256, scale: U256) -> Metric<BigDecimal> {
    let value = TokenAmount::new(raw).to_big_decimal();
    if scale.is_zero() || raw < scale {
        return Metric::Known(value);
    }
    divide(&value, &TokenAmount::new(scale).to_big_decimal())
}

fn normalized(amount: Option<U256>, decimals: Option<u8>) -> Metric<BigDecimal> {
    match (amount, decimals) {
        (Some(amount), Some(decimals)) => {
            Metric::Known(TokenAmount::new(amount).normalize(TokenDecimals::new(decimals)))
        }
        _ => Metric::Unknown,
    }
}

/// `numerator / denominator` on raw integers, unknown on a zero denominator.
fn ratio(numerator: Option<U256>, denominator: Option<U256>) -> Metric<BigDecimal> {
    match (numerator, denominator) {
        (Some(n), Some(d)) => divide(
            &TokenAmount::new(n).to_big_decimal(),
            &TokenAmount::new(d).to_big_decimal(),
        ),
        _ => Metric::Unknown,
    }
}

fn divide(numerator: &BigDecimal, denominator: &BigDecimal) -> Metric<BigDecimal> {
    if denominator.is_zero() {
        Metric::Unknown
    } else {
        Metric::Known((numerator / denominator).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn u(v: u64) -> Option<U256> {
        Some(U256::from(v))
    }

    fn pool() -> RawFarmValues {
        RawFarmValues {
            token_balance_lp: Some(U256::from(2_000_000_000_000_000_000u128)),
            quote_balance_lp: u(10_000_000),
            lp_balance_scheduler: u(250),
            lp_total_supply: u(1000),
            token_decimals: Some(18),
            quote_decimals: Some(6),
            lp_decimals: Some(18),
            alloc_point: u(300),
            total_alloc_point: u(1000),
            harvest_interval: u(3600),
            deposit_fee_bp: u(400),
            reward_per_block: Some(U256::from(40_000_000_000_000_000_000u128)),
            bonus_multiplier: u(1),
        }
    }

    #[test]
    fn test_amounts_and_prices() {
        let metrics = compute_farm_metrics(&pool(), FarmRef::Staked(2), &MetricsConfig::default());

        assert_eq!(metrics.token_amount_total, Metric::Known(dec("2")));
        assert_eq!(metrics.quote_amount_total, Metric::Known(dec("10")));
        assert_eq!(metrics.staked_fraction, Metric::Known(dec("0.25")));
        assert_eq!(metrics.lp_total_in_quote_token, Metric::Known(dec("5")));
        assert_eq!(metrics.price_vs_quote, Metric::Known(dec("5")));
    }

    #[test]
    fn test_scheduler_fields() {
        let metrics = compute_farm_metrics(&pool(), FarmRef::Staked(2), &MetricsConfig::default());
        let scheduler = metrics.scheduler.unwrap();

        assert_eq!(scheduler.pid, 2);
        assert_eq!(scheduler.pool_weight, Metric::Known(dec("0.3")));
        assert_eq!(scheduler.multiplier_label, Metric::Known("30X".to_string()));
        assert_eq!(scheduler.harvest_interval, Metric::Known(Duration::from_secs(3600)));
        assert_eq!(scheduler.deposit_fee, Metric::Known(dec("0.04")));
        assert_eq!(scheduler.emission_rate, Metric::Known(dec("40")));
    }

    #[test]
    fn test_zero_supply_is_unknown() {
        let raw = RawFarmValues {
            lp_total_supply: u(0),
            ..pool()
        };
        let metrics = compute_farm_metrics(&raw, FarmRef::Staked(0), &MetricsConfig::default());
        assert_eq!(metrics.staked_fraction, Metric::Unknown);
        assert_eq!(metrics.lp_total_in_quote_token, Metric::Unknown);
        assert_eq!(metrics.lp_total_supply, Metric::Known(dec("0")));
    }

    #[test]
    fn test_zero_token_amount_price_unknown() {
        let raw = RawFarmValues {
            token_balance_lp: u(0),
            ..pool()
        };
        let metrics = compute_farm_metrics(&raw, FarmRef::PriceHelper, &MetricsConfig::default());
        assert_eq!(metrics.price_vs_quote, Metric::Unknown);
    }

    #[test]
    fn test_zero_total_alloc_point_unknown_weight() {
        let raw = RawFarmValues {
            total_alloc_point: u(0),
            ..pool()
        };
        let scheduler = compute_farm_metrics(&raw, FarmRef::Staked(1), &MetricsConfig::default())
            .scheduler
            .unwrap();
        assert_eq!(scheduler.pool_weight, Metric::Unknown);
        assert_eq!(scheduler.multiplier_label, Metric::Unknown);
    }

    #[test]
    fn test_missing_inputs_propagate_unknown() {
        let metrics = compute_farm_metrics(
            &RawFarmValues::default(),
            FarmRef::Staked(1),
            &MetricsConfig::default(),
        );
        assert_eq!(metrics.token_amount_total, Metric::Unknown);
        assert_eq!(metrics.price_vs_quote, Metric::Unknown);
        let scheduler = metrics.scheduler.unwrap();
        assert_eq!(scheduler.emission_rate, Metric::Unknown);
        assert_eq!(scheduler.harvest_interval, Metric::Unknown);
    }

    #[test]
    fn test_bonus_multiplier_descaled_above_scale() {
        let raw = RawFarmValues {
            bonus_multiplier: Some(U256::from(2_500_000_000_000_000_000u128)),
            ..pool()
        };
        let scheduler = compute_farm_metrics(&raw, FarmRef::Staked(1), &MetricsConfig::default())
            .scheduler
            .unwrap();
        // 40 per block × 2.5
        assert_eq!(scheduler.emission_rate, Metric::Known(dec("100")));
    }

    #[test]
    fn test_bonus_multiplier_plain_below_scale() {
        let raw = RawFarmValues {
            bonus_multiplier: u(3),
            ..pool()
        };
        let scheduler = compute_farm_metrics(&raw, FarmRef::Staked(1), &MetricsConfig::default())
            .scheduler
            .unwrap();
        assert_eq!(scheduler.emission_rate, Metric::Known(dec("120")));
    }

    #[test]
    fn test_custom_multiplier_scale() {
        let config = MetricsConfig::default().with_multiplier_scale(U256::from(100u64));
        let raw = RawFarmValues {
            bonus_multiplier: u(150),
            ..pool()
        };
        let scheduler = compute_farm_metrics(&raw, FarmRef::Staked(1), &config)
            .scheduler
            .unwrap();
        assert_eq!(scheduler.emission_rate, Metric::Known(dec("60")));

        let no_descale = MetricsConfig::default().with_multiplier_scale(U256::ZERO);
        let scheduler = compute_farm_metrics(&raw, FarmRef::Staked(1), &no_descale)
            .scheduler
            .unwrap();
        assert_eq!(scheduler.emission_rate, Metric::Known(dec("6000")));
    }

    #[test]
    fn test_reward_decimals_come_from_config() {
        let config = MetricsConfig::default().with_reward_decimals(9);
        let scheduler = compute_farm_metrics(&pool(), FarmRef::Staked(1), &config)
            .scheduler
            .unwrap();
        assert_eq!(scheduler.emission_rate, Metric::Known(dec("40000000000")));
    }

    #[test]
    fn test_multiplier_label_truncates() {
        assert_eq!(multiplier_label(&dec("0.1")), "10X");
        assert_eq!(multiplier_label(&dec("0.3333333")), "33X");
        assert_eq!(multiplier_label(&dec("0.999")), "99X");
        assert_eq!(multiplier_label(&dec("1")), "100X");
        assert_eq!(multiplier_label(&dec("0")), "0X");
    }
}
