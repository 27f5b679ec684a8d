//! BBIShortLong selector — "re-entry".
//!
//! Over the last `m` days the long-window RSV stays high while the
//! short-window RSV dips below `rsv_low` and recovers: a brief shakeout
//! inside an intact trend, confirmed by a rising BBI.

use crate::domain::Bar;
use crate::engine::{IndicatorRequest, IndicatorSeries};
use crate::indicators::BBI_LOOKBACK;

use super::{
    check_bbi_uptrend, check_positive_dif, Condition, EvalContext, Evaluation, Selector, Verdict,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BbiShortLongSelector {
    pub n_short: usize,
    pub n_long: usize,
    pub m: usize,
    pub bbi_min_window: usize,
    pub max_window: usize,
    pub bbi_q_threshold: f64,
    pub rsv_low: f64,
    pub rsv_high: f64,
    pub require_positive_dif: bool,
}

impl BbiShortLongSelector {
    pub const NAME: &'static str = "BBIShortLongSelector";

    pub fn default_params() -> Self {
        Self {
            n_short: 3,
            n_long: 21,
            m: 3,
            bbi_min_window: 90,
            max_window: 150,
            bbi_q_threshold: 0.05,
            rsv_low: 20.0,
            rsv_high: 80.0,
            require_positive_dif: false,
        }
    }

    fn decide(&self, ctx: &mut EvalContext<'_>) -> Result<(), Verdict> {
        check_bbi_uptrend(
            ctx,
            self.bbi_min_window,
            self.max_window,
            self.bbi_q_threshold,
        )?;
        self.check_rsv_pattern(ctx)?;
        check_positive_dif(ctx, self.require_positive_dif)
    }

    fn check_rsv_pattern(&self, ctx: &mut EvalContext<'_>) -> Result<(), Verdict> {
        let m = self.m.max(1);
        let first = (ctx.index + 1).saturating_sub(m);

        let mut short = Vec::with_capacity(m);
        let mut long = Vec::with_capacity(m);
        for i in first..=ctx.index {
            let s = ctx.indicators.rsv_at(self.n_short, i);
            let l = ctx.indicators.rsv_at(self.n_long, i);
            match (s, l) {
                (Some(s), Some(l)) => {
                    short.push(s);
                    long.push(l);
                }
                _ => return Err(ctx.insufficient()),
            }
        }

        let long_min = long.iter().copied().fold(f64::INFINITY, f64::min);
        let short_min = short.iter().copied().fold(f64::INFINITY, f64::min);
        let short_first = short[0];
        let short_last = short[short.len() - 1];
        ctx.record("long_rsv_min", long_min);
        ctx.record("short_rsv_min", short_min);
        ctx.record("short_rsv_first", short_first);
        ctx.record("short_rsv_last", short_last);

        let holds = long_min >= self.rsv_high
            && short_min < self.rsv_low
            && short_first >= self.rsv_high
            && short_last >= self.rsv_high;
        ctx.require(holds, Condition::RsvPattern)
    }
}

impl Selector for BbiShortLongSelector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_bars(&self) -> usize {
        let rsv_span = self
            .n_long
            .max(self.n_short)
            .saturating_add(self.m.saturating_sub(1));
        rsv_span.max(BBI_LOOKBACK.saturating_add(self.bbi_min_window))
    }

    fn indicator_request(&self) -> IndicatorRequest {
        IndicatorRequest::with_window(self.max_window)
            .with_rsv_period(self.n_short)
            .with_rsv_period(self.n_long)
    }

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorSeries) -> Evaluation {
        let mut ctx = match EvalContext::open(bars, index, indicators, self.required_bars()) {
            Ok(ctx) => ctx,
            Err(early) => return early,
        };
        let outcome = self.decide(&mut ctx);
        ctx.finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::selector::fixtures::{bar, evaluate_last};

    /// Closes rise 0.10 a day (high = close, low = close - 0.2); the day before
    /// the target dips 0.30 under the prior close and the target recovers above it.
    fn reentry_bars(dip: bool) -> Vec<Bar> {
        let n = 60;
        let close = |i: usize| 10.0 + i as f64 * 0.1;
        let mut bars: Vec<Bar> = (0..n - 2)
            .map(|i| bar(i, close(i), close(i), close(i) - 0.2, 1_000))
            .collect();
        let anchor = close(n - 3);
        if dip {
            bars.push(bar(n - 2, anchor - 0.3, anchor - 0.2, anchor - 0.3, 1_000));
            bars.push(bar(n - 1, anchor + 0.2, anchor + 0.2, anchor, 1_000));
        } else {
            for i in n - 2..n {
                bars.push(bar(i, close(i), close(i), close(i) - 0.2, 1_000));
            }
        }
        bars
    }

    fn scenario_selector() -> BbiShortLongSelector {
        BbiShortLongSelector {
            bbi_min_window: 20,
            max_window: 60,
            ..BbiShortLongSelector::default_params()
        }
    }

    #[test]
    fn dip_and_recovery_matches() {
        let eval = evaluate_last(&scenario_selector(), &reentry_bars(true));
        assert_eq!(eval.verdict, Verdict::Matched, "state: {:?}", eval.state);
        assert!(eval.state["short_rsv_min"] < 20.0);
        assert!(eval.state["long_rsv_min"] >= 80.0);
    }

    #[test]
    fn no_dip_rejects() {
        let eval = evaluate_last(&scenario_selector(), &reentry_bars(false));
        assert_eq!(eval.verdict, Verdict::Rejected(Condition::RsvPattern));
    }

    #[test]
    fn stricter_long_floor_rejects() {
        let selector = BbiShortLongSelector {
            rsv_high: 90.0,
            ..scenario_selector()
        };
        let eval = evaluate_last(&selector, &reentry_bars(true));
        assert_eq!(eval.verdict, Verdict::Rejected(Condition::RsvPattern));
    }

    #[test]
    fn requests_both_rsv_windows() {
        let request = scenario_selector().indicator_request();
        assert!(request.rsv_periods.contains(&3));
        assert!(request.rsv_periods.contains(&21));
    }

    #[test]
    fn required_bars_covers_bbi_and_rsv() {
        assert_eq!(scenario_selector().required_bars(), 43);
        assert_eq!(BbiShortLongSelector::default_params().required_bars(), 113);
    }

    #[test]
    fn short_history_is_insufficient() {
        let bars = reentry_bars(true);
        let eval = evaluate_last(&scenario_selector(), &bars[..40]);
        assert!(matches!(eval.verdict, Verdict::InsufficientHistory { .. }));
        assert!(!eval.is_match());
    }

    #[test]
    fn required_bars_saturates() {
        let selector = BbiShortLongSelector {
            n_long: usize::MAX,
            ..scenario_selector()
        };
        assert_eq!(selector.required_bars(), usize::MAX);
        let selector = BbiShortLongSelector {
            bbi_min_window: usize::MAX,
            ..scenario_selector()
        };
        assert_eq!(selector.required_bars(), usize::MAX);
    }
}
