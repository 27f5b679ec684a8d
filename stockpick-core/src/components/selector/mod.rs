//! Selector evaluation: decides whether one ticker matches a strategy on one date.
//!
//! Selectors are pure: they receive bar history and precomputed indicators and
//! return an [`Evaluation`]. They never see other tickers and never mutate
//! anything, so the runner can evaluate tickers in any order on any thread.

pub mod bbi_kdj;
pub mod bbi_short_long;
pub mod breakout_volume;
pub mod peak_kdj;

pub use bbi_kdj::BbiKdjSelector;
pub use bbi_short_long::BbiShortLongSelector;
pub use breakout_volume::BreakoutVolumeKdjSelector;
pub use peak_kdj::PeakKdjSelector;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::engine::{IndicatorRequest, IndicatorSeries, Line};
use crate::indicators::rolling::quantile;

/// A single rule a selector checks. Reported as the reason for a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    JThreshold,
    JQuantile,
    BbiUptrend,
    PriceRange,
    PositiveDif,
    PitMouth,
    PitFluctuation,
    RsvPattern,
    VolumeBreakout,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JThreshold => "j_threshold",
            Self::JQuantile => "j_quantile",
            Self::BbiUptrend => "bbi_uptrend",
            Self::PriceRange => "price_range",
            Self::PositiveDif => "positive_dif",
            Self::PitMouth => "pit_mouth",
            Self::PitFluctuation => "pit_fluctuation",
            Self::RsvPattern => "rsv_pattern",
            Self::VolumeBreakout => "volume_breakout",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a selector at one bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Matched,
    Rejected(Condition),
    InsufficientHistory { required: usize, available: usize },
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched)
    }
}

/// Verdict plus the named numbers that explain it (J, J rank, price range, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub state: BTreeMap<String, f64>,
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        self.verdict.is_match()
    }
}

/// Trait for selectors.
///
/// # Architecture invariant
/// `evaluate` may only read `bars[0..=index]` and indicator values at or
/// before `index`. Too little history is an `InsufficientHistory` verdict,
/// never a panic.
pub trait Selector: Send + Sync {
    /// Variant identifier (e.g., "BBIKDJSelector").
    fn name(&self) -> &str;

    /// Bars needed up to and including the target before a match is possible.
    fn required_bars(&self) -> usize;

    /// Indicators this selector reads.
    fn indicator_request(&self) -> IndicatorRequest;

    /// Evaluate the selector at `index`.
    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorSeries) -> Evaluation;
}

/// Per-evaluation scratch space: reads indicator values, records them into
/// the explanation state, and turns failed checks into verdicts.
pub(crate) struct EvalContext<'a> {
    pub indicators: &'a IndicatorSeries,
    pub index: usize,
    required: usize,
    available: usize,
    state: BTreeMap<String, f64>,
}

impl<'a> EvalContext<'a> {
    /// Returns `Err` with an insufficient-history verdict when `index` does
    /// not leave `required` bars of history.
    pub fn open(
        bars: &[Bar],
        index: usize,
        indicators: &'a IndicatorSeries,
        required: usize,
    ) -> Result<Self, Evaluation> {
        let in_range = index < bars.len() && index < indicators.len();
        let available = if in_range {
            index + 1
        } else {
            bars.len().min(indicators.len())
        };
        if !in_range || available < required {
            return Err(Evaluation {
                verdict: Verdict::InsufficientHistory {
                    required,
                    available,
                },
                state: BTreeMap::new(),
            });
        }
        Ok(Self {
            indicators,
            index,
            required,
            available,
            state: BTreeMap::new(),
        })
    }

    pub fn insufficient(&self) -> Verdict {
        Verdict::InsufficientHistory {
            required: self.required,
            available: self.available,
        }
    }

    pub fn record(&mut self, key: &str, value: f64) {
        self.state.insert(key.to_string(), value);
    }

    /// Read `line` at the target, recording it under `key`.
    pub fn value(&mut self, key: &str, line: Line) -> Result<f64, Verdict> {
        let value = self
            .indicators
            .get(line, self.index)
            .ok_or_else(|| self.insufficient())?;
        self.record(key, value);
        Ok(value)
    }

    pub fn require(&self, holds: bool, condition: Condition) -> Result<(), Verdict> {
        if holds {
            Ok(())
        } else {
            Err(Verdict::Rejected(condition))
        }
    }

    pub fn finish(self, outcome: Result<(), Verdict>) -> Evaluation {
        Evaluation {
            verdict: outcome.err().unwrap_or(Verdict::Matched),
            state: self.state,
        }
    }
}

/// `J[t] < threshold` and the percentile rank of `J[t]` over the trailing
/// window is at most `quantile`.
pub(crate) fn check_j_gate(
    ctx: &mut EvalContext<'_>,
    threshold: f64,
    rank_quantile: f64,
) -> Result<(), Verdict> {
    let j = ctx.value("j", Line::J)?;
    let rank = ctx.value("j_rank", Line::JRank)?;
    ctx.require(j < threshold, Condition::JThreshold)?;
    ctx.require(rank <= rank_quantile, Condition::JQuantile)
}

/// Trailing close range `max / min - 1` at most `limit`.
pub(crate) fn check_price_range(ctx: &mut EvalContext<'_>, limit: f64) -> Result<(), Verdict> {
    let high = ctx.value("window_max_close", Line::MaxClose)?;
    let low = ctx.value("window_min_close", Line::MinClose)?;
    let range = high / low - 1.0;
    ctx.record("price_range", range);
    ctx.require(range <= limit, Condition::PriceRange)
}

/// `DIF[t] > 0` when the gate is enabled.
pub(crate) fn check_positive_dif(ctx: &mut EvalContext<'_>, enabled: bool) -> Result<(), Verdict> {
    if !enabled {
        return Ok(());
    }
    let dif = ctx.value("dif", Line::Dif)?;
    ctx.require(dif > 0.0, Condition::PositiveDif)
}

/// BBI uptrend with noise tolerance.
pub(crate) fn check_bbi_uptrend(
    ctx: &mut EvalContext<'_>,
    min_window: usize,
    max_window: usize,
    q: f64,
) -> Result<(), Verdict> {
    let indicators = ctx.indicators;
    let bbi = &indicators.line(Line::Bbi)[..=ctx.index];
    let holds = bbi_uptrend(bbi, min_window, max_window, q).ok_or_else(|| ctx.insufficient())?;
    ctx.record("bbi_uptrend", if holds { 1.0 } else { 0.0 });
    ctx.require(holds, Condition::BbiUptrend)
}

/// True when, for some window length `w` from `min(count, max_window)` down
/// to `min_window`, the `q`-quantile of the first differences of the last `w`
/// defined BBI values (normalised by the first of them) is non-negative.
///
/// `None` when fewer than `min_window` values are defined.
pub fn bbi_uptrend(bbi: &[f64], min_window: usize, max_window: usize, q: f64) -> Option<bool> {
    let defined: Vec<f64> = bbi.iter().copied().filter(|v| v.is_finite()).collect();
    let min_window = min_window.max(2);
    if defined.len() < min_window {
        return None;
    }

    let longest = defined.len().min(max_window);
    for w in (min_window..=longest).rev() {
        let segment = &defined[defined.len() - w..];
        let base = segment[0];
        if base <= 0.0 {
            continue;
        }
        let diffs: Vec<f64> = segment
            .windows(2)
            .map(|pair| pair[1] / base - pair[0] / base)
            .collect();
        if quantile(&diffs, q).is_some_and(|v| v >= 0.0) {
            return Some(true);
        }
    }
    Some(false)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_bbi_is_uptrend() {
        let bbi: Vec<f64> = (0..40).map(|i| 10.0 + i as f64 * 0.1).collect();
        assert_eq!(bbi_uptrend(&bbi, 20, 40, 0.05), Some(true));
    }

    #[test]
    fn falling_bbi_is_not_uptrend() {
        let bbi: Vec<f64> = (0..40).map(|i| 20.0 - i as f64 * 0.1).collect();
        assert_eq!(bbi_uptrend(&bbi, 20, 40, 0.05), Some(false));
    }

    #[test]
    fn isolated_dips_are_tolerated() {
        // 2 of 29 steps decline
        let mut bbi: Vec<f64> = (0..30).map(|i| 10.0 + i as f64 * 0.1).collect();
        bbi[10] = bbi[9] - 0.05;
        bbi[20] = bbi[19] - 0.05;
        assert_eq!(bbi_uptrend(&bbi, 30, 30, 0.02), Some(false));
        assert_eq!(bbi_uptrend(&bbi, 30, 30, 0.2), Some(true));
    }

    #[test]
    fn shorter_window_can_rescue_trend() {
        // early decline, recent rise
        let mut bbi: Vec<f64> = (0..20).map(|i| 15.0 - i as f64 * 0.1).collect();
        bbi.extend((0..20).map(|i| 13.0 + i as f64 * 0.1));
        assert_eq!(bbi_uptrend(&bbi, 40, 40, 0.05), Some(false));
        assert_eq!(bbi_uptrend(&bbi, 15, 40, 0.05), Some(true));
    }

    #[test]
    fn undefined_prefix_is_skipped() {
        let mut bbi = vec![f64::NAN; 23];
        bbi.extend((0..10).map(|i| 10.0 + i as f64));
        assert_eq!(bbi_uptrend(&bbi, 10, 90, 0.05), Some(true));
        assert_eq!(bbi_uptrend(&bbi, 11, 90, 0.05), None);
    }

    #[test]
    fn condition_labels_match_serde() {
        let json = serde_json::to_string(&Condition::BbiUptrend).unwrap();
        assert_eq!(json, format!("\"{}\"", Condition::BbiUptrend));
    }

    #[test]
    fn verdict_is_match() {
        assert!(Verdict::Matched.is_match());
        assert!(!Verdict::Rejected(Condition::PriceRange).is_match());
        assert!(!Verdict::InsufficientHistory {
            required: 2,
            available: 1
        }
        .is_match());
    }
}
