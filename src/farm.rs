// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Reading yield farms through the engine.
//!
//! A [`FarmReader`] issues every read a farm needs (LP reserves, LP supply and
//! stake, token decimals and, for staked farms, the scheduler's pool slot)
//! through one [`ReadEngine`] at once, so they land in the same batch window.
//! Per-call failures become absent inputs and surface as
//! [`Metric::Unknown`](crate::Metric::Unknown) in the derived metrics.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};

use crate::call::abi::{ContractAbi, SchedulerMethods};
use crate::call::spec::CallSpec;
use crate::config::MetricsConfig;
use crate::engine::ReadEngine;
use crate::errors::EngineError;
use crate::metrics::{compute_farm_metrics, DerivedFarmMetrics, FarmRef, RawFarmValues};
use crate::spans;

// Field positions in the scheduler's `poolInfo` tuple.
const POOL_INFO_ALLOC_POINT: usize = 1;
const POOL_INFO_DEPOSIT_FEE_BP: usize = 4;
const POOL_INFO_HARVEST_INTERVAL: usize = 5;

/// Addresses and scheduler slot of one farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmConfig {
    /// The LP pair.
    pub lp: Address,
    pub token: Address,
    pub quote_token: Address,
    /// The emission scheduler (MasterChef-style) the LP is staked in.
    ///
    /// Without one, neither the staked LP balance nor any scheduler field is
    /// read.
    pub scheduler: Option<Address>,
    pub farm_ref: FarmRef,
}

impl FarmConfig {
    pub fn staked(pid: u64, lp: Address, token: Address, quote_token: Address, scheduler: Address) -> Self {
        Self {
            lp,
            token,
            quote_token,
            scheduler: Some(scheduler),
            farm_ref: FarmRef::Staked(pid),
        }
    }

    /// A pair read only to price `token` in `quote_token`.
    pub fn price_helper(lp: Address, token: Address, quote_token: Address) -> Self {
        Self {
            lp,
            token,
            quote_token,
            scheduler: None,
            farm_ref: FarmRef::PriceHelper,
        }
    }

    /// Also read the share of LP held by `scheduler`.
    pub fn with_scheduler(mut self, scheduler: Address) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

/// Reads farms through a shared [`ReadEngine`].
#[derive(Debug, Clone)]
pub struct FarmReader {
    engine: ReadEngine,
    methods: SchedulerMethods,
    metrics: MetricsConfig,
}

impl FarmReader {
    pub fn new(engine: ReadEngine) -> Self {
        Self {
            engine,
            methods: SchedulerMethods::default(),
            metrics: MetricsConfig::default(),
        }
    }

    /// Use fork-specific scheduler method names.
    pub fn with_methods(mut self, methods: SchedulerMethods) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_metrics_config(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn engine(&self) -> &ReadEngine {
        &self.engine
    }

    /// Register the ABIs the farm's reads resolve against.
    pub fn register(&self, farm: &FarmConfig) {
        for token in [farm.lp, farm.token, farm.quote_token] {
            self.engine.register_contract(token, ContractAbi::erc20());
        }
        if let Some(scheduler) = farm.scheduler {
            self.engine
                .register_contract(scheduler, ContractAbi::master_chef(&self.methods));
        }
    }

    /// Read and derive the metrics of `farm`.
    ///
    /// # Errors
    ///
    /// Only engine-level failures: an unresolvable read or a stopped engine.
    /// Reverts, decode failures and exhausted transport retries of individual
    /// reads yield unknown metrics instead.
    pub async fn fetch(&self, farm: &FarmConfig) -> Result<DerivedFarmMetrics, EngineError> {
        let raw = self.read_raw(farm).await?;
        Ok(compute_farm_metrics(&raw, farm.farm_ref, &self.metrics))
    }

    /// Read the raw inputs of `farm` without deriving anything.
    pub async fn read_raw(&self, farm: &FarmConfig) -> Result<RawFarmValues, EngineError> {
        let span = spans::fetch_farm(farm.lp, farm.farm_ref.pid());
        async {
            self.register(farm);
            let specs = self.call_specs(farm);
            let values = try_join_all(specs.iter().map(|spec| self.read(spec))).await?;
            let mut values = values.into_iter();
            let mut next = move || values.next().flatten();

            let mut raw = RawFarmValues {
                token_balance_lp: next().as_ref().and_then(as_u256),
                quote_balance_lp: next().as_ref().and_then(as_u256),
                lp_total_supply: next().as_ref().and_then(as_u256),
                token_decimals: next().as_ref().and_then(as_u8),
                quote_decimals: next().as_ref().and_then(as_u8),
                lp_decimals: next().as_ref().and_then(as_u8),
                ..Default::default()
            };

            if farm.scheduler.is_some() {
                raw.lp_balance_scheduler = next().as_ref().and_then(as_u256);
            }
            if farm.farm_ref.pid().is_some() && farm.scheduler.is_some() {
                if let Some(pool_info) = next() {
                    let field = |index| pool_info_field(&pool_info, index);
                    raw.alloc_point = field(POOL_INFO_ALLOC_POINT);
                    raw.deposit_fee_bp = field(POOL_INFO_DEPOSIT_FEE_BP);
                    raw.harvest_interval = field(POOL_INFO_HARVEST_INTERVAL);
                }
                raw.total_alloc_point = next().as_ref().and_then(as_u256);
                raw.reward_per_block = next().as_ref().and_then(as_u256);
                raw.bonus_multiplier = next().as_ref().and_then(as_u256);
            }

            debug!(reads = specs.len(), "Farm inputs read");
            Ok(raw)
        }
        .instrument(span)
        .await
    }

    /// Reads in the order [`read_raw`](Self::read_raw) consumes them.
    fn call_specs(&self, farm: &FarmConfig) -> Vec<CallSpec> {
        let mut specs = vec![
            CallSpec::new(farm.token, "balanceOf").arg(farm.lp),
            CallSpec::new(farm.quote_token, "balanceOf").arg(farm.lp),
            CallSpec::new(farm.lp, "totalSupply"),
            CallSpec::new(farm.token, "decimals"),
            CallSpec::new(farm.quote_token, "decimals"),
            CallSpec::new(farm.lp, "decimals"),
        ];
        let Some(scheduler) = farm.scheduler else {
            return specs;
        };
        specs.push(CallSpec::new(farm.lp, "balanceOf").arg(scheduler));
        if let Some(pid) = farm.farm_ref.pid() {
            specs.extend([
                CallSpec::new(scheduler, self.methods.pool_info.as_str()).arg(U256::from(pid)),
                CallSpec::new(scheduler, self.methods.total_alloc_point.as_str()),
                CallSpec::new(scheduler, self.methods.reward_per_block.as_str()),
                CallSpec::new(scheduler, self.methods.bonus_multiplier.as_str()),
            ]);
        }
        specs
    }

    async fn read(&self, spec: &CallSpec) -> Result<Option<DynSolValue>, EngineError> {
        let observation = self.engine.fetch(spec).await?;
        match observation.result {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                debug!(
                    contract = %spec.target,
                    method = %spec.method,
                    %error,
                    "Farm read failed, treating input as unknown"
                );
                Ok(None)
            }
        }
    }
}

fn as_u256(value: &DynSolValue) -> Option<U256> {
    value.as_uint().map(|(value, _)| value)
}

fn as_u8(value: &DynSolValue) -> Option<u8> {
    as_u256(value).and_then(|value| u8::try_from(value).ok())
}

fn pool_info_field(pool_info: &DynSolValue, index: usize) -> Option<U256> {
    pool_info.as_tuple()?.get(index).and_then(as_u256)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_info_fields() {
        let pool_info = DynSolValue::Tuple(vec![
            DynSolValue::Address(Address::with_last_byte(1)),
            DynSolValue::Uint(U256::from(300u64), 256),
            DynSolValue::Uint(U256::from(0u64), 256),
            DynSolValue::Uint(U256::from(0u64), 256),
            DynSolValue::Uint(U256::from(400u64), 16),
            DynSolValue::Uint(U256::from(3600u64), 256),
        ]);
        assert_eq!(pool_info_field(&pool_info, POOL_INFO_ALLOC_POINT), Some(U256::from(300u64)));
        assert_eq!(pool_info_field(&pool_info, POOL_INFO_DEPOSIT_FEE_BP), Some(U256::from(400u64)));
        assert_eq!(
            pool_info_field(&pool_info, POOL_INFO_HARVEST_INTERVAL),
            Some(U256::from(3600u64))
        );
        assert_eq!(pool_info_field(&pool_info, 9), None);
        assert_eq!(pool_info_field(&DynSolValue::Bool(true), 1), None);
    }

    #[test]
    fn test_decimals_out_of_range() {
        assert_eq!(as_u8(&DynSolValue::Uint(U256::from(6u64), 8)), Some(6));
        assert_eq!(as_u8(&DynSolValue::Uint(U256::from(300u64), 256)), None);
    }
}
