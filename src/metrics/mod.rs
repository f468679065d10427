// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed-precision metric derivations.
//!
//! Everything here is pure and synchronous. Arithmetic uses [`BigDecimal`]
//! throughout; binary floating point never touches a financial ratio. Missing
//! or degenerate inputs (absent values, zero denominators) produce
//! [`Metric::Unknown`] instead of errors.
//!
//! [`BigDecimal`]: bigdecimal::BigDecimal

mod farm;

use serde::{Deserialize, Serialize};

pub use farm::{compute_farm_metrics, DerivedFarmMetrics, FarmRef, RawFarmValues, SchedulerMetrics};

/// A derived value, or the sentinel for "cannot be computed from the inputs".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric<T> {
    Known(T),
    Unknown,
}

impl<T> Metric<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Metric::Known(_))
    }

    pub fn as_ref(&self) -> Metric<&T> {
        match self {
            Metric::Known(value) => Metric::Known(value),
            Metric::Unknown => Metric::Unknown,
        }
    }

    pub fn known(self) -> Option<T> {
        match self {
            Metric::Known(value) => Some(value),
            Metric::Unknown => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Known(value) => Metric::Known(f(value)),
            Metric::Unknown => Metric::Unknown,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Metric<U>) -> Metric<U> {
        match self {
            Metric::Known(value) => f(value),
            Metric::Unknown => Metric::Unknown,
        }
    }

    /// Combine two metrics, unknown if either is.
    pub fn zip<U>(self, other: Metric<U>) -> Metric<(T, U)> {
        match (self, other) {
            (Metric::Known(a), Metric::Known(b)) => Metric::Known((a, b)),
            _ => Metric::Unknown,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.known().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Metric::Known(value),
            None => Metric::Unknown,
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Metric<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Known(value) => value.fmt(f),
            Metric::Unknown => f.write_str("unknown"),
        }
    }
}
