//! Indicator precomputation.
//!
//! Every indicator a selector needs is computed once per ticker, before any
//! evaluation, into an immutable [`IndicatorSeries`] aligned index-for-index
//! with the bars it was derived from.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::kdj::{kdj_from_rsv, KDJ_PERIOD};
use crate::indicators::rolling::{
    first_difference, rolling_max, rolling_min, rolling_percentile_rank,
};
use crate::indicators::{Bbi, Dif, Rsv};

/// What to compute: the KDJ window, the rolling window shared by the
/// aggregates and ranks, and any extra RSV windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub kdj_period: usize,
    pub window: usize,
    pub rsv_periods: BTreeSet<usize>,
}

impl Default for IndicatorRequest {
    fn default() -> Self {
        Self {
            kdj_period: KDJ_PERIOD,
            window: 90,
            rsv_periods: BTreeSet::new(),
        }
    }
}

impl IndicatorRequest {
    pub fn with_window(window: usize) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn with_rsv_period(mut self, period: usize) -> Self {
        self.rsv_periods.insert(period);
        self
    }
}

/// Named line of an [`IndicatorSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Rsv,
    K,
    D,
    J,
    Bbi,
    BbiDiff,
    Dif,
    MinClose,
    MaxClose,
    MaxHigh,
    MinLow,
    JRank,
    BbiDiffRank,
}

/// Derived sequences for one ticker. NaN marks "undefined"; read through
/// [`IndicatorSeries::get`], which maps NaN to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    request: IndicatorRequest,
    rsv: Vec<f64>,
    k: Vec<f64>,
    d: Vec<f64>,
    j: Vec<f64>,
    bbi: Vec<f64>,
    bbi_diff: Vec<f64>,
    dif: Vec<f64>,
    min_close: Vec<f64>,
    max_close: Vec<f64>,
    max_high: Vec<f64>,
    min_low: Vec<f64>,
    j_rank: Vec<f64>,
    bbi_diff_rank: Vec<f64>,
    extra_rsv: BTreeMap<usize, Vec<f64>>,
}

impl IndicatorSeries {
    pub fn request(&self) -> &IndicatorRequest {
        &self.request
    }

    pub fn len(&self) -> usize {
        self.rsv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsv.is_empty()
    }

    /// Full sequence for a line, undefined entries included.
    pub fn line(&self, line: Line) -> &[f64] {
        match line {
            Line::Rsv => &self.rsv,
            Line::K => &self.k,
            Line::D => &self.d,
            Line::J => &self.j,
            Line::Bbi => &self.bbi,
            Line::BbiDiff => &self.bbi_diff,
            Line::Dif => &self.dif,
            Line::MinClose => &self.min_close,
            Line::MaxClose => &self.max_close,
            Line::MaxHigh => &self.max_high,
            Line::MinLow => &self.min_low,
            Line::JRank => &self.j_rank,
            Line::BbiDiffRank => &self.bbi_diff_rank,
        }
    }

    /// Value of `line` at `index`; `None` when out of range or undefined.
    pub fn get(&self, line: Line, index: usize) -> Option<f64> {
        defined(self.line(line).get(index).copied())
    }

    /// RSV sequence for `period`, if it was requested (the KDJ window always is).
    pub fn rsv_series(&self, period: usize) -> Option<&[f64]> {
        if period == self.request.kdj_period {
            return Some(&self.rsv);
        }
        self.extra_rsv.get(&period).map(|v| v.as_slice())
    }

    pub fn rsv_at(&self, period: usize, index: usize) -> Option<f64> {
        defined(self.rsv_series(period)?.get(index).copied())
    }
}

fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Computes [`IndicatorSeries`] for a fixed [`IndicatorRequest`].
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    request: IndicatorRequest,
}

impl IndicatorEngine {
    pub fn new(request: IndicatorRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &IndicatorRequest {
        &self.request
    }

    /// Compute every line over `bars`. Pure: identical input gives
    /// bit-identical output.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let window = self.request.window.max(1);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

        let rsv = compute_checked(&Rsv::new(self.request.kdj_period), bars);
        let kdj = kdj_from_rsv(&rsv);
        let bbi = compute_checked(&Bbi, bars);
        let bbi_diff = first_difference(&bbi);
        let dif = compute_checked(&Dif::default(), bars);

        let extra_rsv = self
            .request
            .rsv_periods
            .iter()
            .filter(|&&p| p != self.request.kdj_period)
            .map(|&p| (p, compute_checked(&Rsv::new(p), bars)))
            .collect();

        IndicatorSeries {
            request: self.request.clone(),
            j_rank: rolling_percentile_rank(&kdj.j, window),
            bbi_diff_rank: rolling_percentile_rank(&bbi_diff, window),
            rsv,
            k: kdj.k,
            d: kdj.d,
            j: kdj.j,
            bbi,
            bbi_diff,
            dif,
            min_close: rolling_min(&closes, window),
            max_close: rolling_max(&closes, window),
            max_high: rolling_max(&highs, window),
            min_low: rolling_min(&lows, window),
            extra_rsv,
        }
    }
}

/// Run one indicator over the bars, checking its output shape in debug builds.
fn compute_checked(indicator: &dyn Indicator, bars: &[Bar]) -> Vec<f64> {
    let series = indicator.compute(bars);
    debug_assert_eq!(
        series.len(),
        bars.len(),
        "indicator '{}' produced {} values for {} bars",
        indicator.name(),
        series.len(),
        bars.len()
    );
    debug_assert!(
        series.iter().take(indicator.lookback()).all(|v| v.is_nan()),
        "indicator '{}' defined a value inside its {}-bar warmup",
        indicator.name(),
        indicator.lookback()
    );
    series
}
