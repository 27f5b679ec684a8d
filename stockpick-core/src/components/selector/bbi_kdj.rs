//! BBIKDJ selector — "soft rebound".
//!
//! Matches a ticker whose BBI trend is intact while J has just dropped to an
//! extreme low, inside a bounded trailing price range:
//! - J[t] < j_threshold and J rank over the trailing window <= j_q_threshold
//! - BBI uptrend over at least `bbi_min_window` days (noise tolerance `bbi_q_threshold`)
//! - trailing `max_window` close range `max/min - 1` <= `price_range_pct`
//! - optionally DIF[t] > 0

use crate::domain::Bar;
use crate::engine::{IndicatorRequest, IndicatorSeries};
use crate::indicators::{BBI_LOOKBACK, KDJ_PERIOD};

use super::{
    check_bbi_uptrend, check_j_gate, check_positive_dif, check_price_range, EvalContext,
    Evaluation, Selector, Verdict,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BbiKdjSelector {
    pub j_threshold: f64,
    pub j_q_threshold: f64,
    pub bbi_min_window: usize,
    pub max_window: usize,
    pub price_range_pct: f64,
    pub bbi_q_threshold: f64,
    pub require_positive_dif: bool,
}

impl BbiKdjSelector {
    pub const NAME: &'static str = "BBIKDJSelector";

    pub fn default_params() -> Self {
        Self {
            j_threshold: -5.0,
            j_q_threshold: 0.10,
            bbi_min_window: 90,
            max_window: 90,
            price_range_pct: 100.0,
            bbi_q_threshold: 0.05,
            require_positive_dif: false,
        }
    }

    fn decide(&self, ctx: &mut EvalContext<'_>) -> Result<(), Verdict> {
        check_price_range(ctx, self.price_range_pct)?;
        check_bbi_uptrend(
            ctx,
            self.bbi_min_window,
            self.max_window,
            self.bbi_q_threshold,
        )?;
        check_j_gate(ctx, self.j_threshold, self.j_q_threshold)?;
        check_positive_dif(ctx, self.require_positive_dif)
    }
}

impl Selector for BbiKdjSelector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_bars(&self) -> usize {
        self.max_window
            .max(BBI_LOOKBACK.saturating_add(self.bbi_min_window))
            .max(KDJ_PERIOD)
    }

    fn indicator_request(&self) -> IndicatorRequest {
        IndicatorRequest::with_window(self.max_window)
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
    use crate::components::selector::fixtures::{evaluate_last, narrow_bars, soft_rebound_bars};
    use crate::components::selector::Condition;

    fn scenario_selector() -> BbiKdjSelector {
        BbiKdjSelector {
            j_threshold: 1.0,
            j_q_threshold: 0.10,
            bbi_min_window: 20,
            max_window: 60,
            price_range_pct: 0.5,
            bbi_q_threshold: 0.1,
            require_positive_dif: false,
        }
    }

    #[test]
    fn soft_rebound_matches() {
        let eval = evaluate_last(&scenario_selector(), &soft_rebound_bars());
        assert_eq!(eval.verdict, Verdict::Matched, "state: {:?}", eval.state);
        assert!(eval.state["j"] < 1.0);
        assert!((eval.state["price_range"] - 0.3).abs() < 1e-9);
        assert!(eval.state["j_rank"] <= 0.10);
    }

    #[test]
    fn tight_price_range_rejects() {
        let selector = BbiKdjSelector {
            price_range_pct: 0.2,
            ..scenario_selector()
        };
        let eval = evaluate_last(&selector, &soft_rebound_bars());
        assert_eq!(eval.verdict, Verdict::Rejected(Condition::PriceRange));
    }

    #[test]
    fn j_above_threshold_rejects() {
        let selector = BbiKdjSelector {
            j_threshold: -50.0,
            ..scenario_selector()
        };
        let eval = evaluate_last(&selector, &soft_rebound_bars());
        assert_eq!(eval.verdict, Verdict::Rejected(Condition::JThreshold));
    }

    #[test]
    fn falling_bbi_rejects() {
        let closes: Vec<f64> = (0..60).map(|i| 13.0 - i as f64 * 3.0 / 59.0).collect();
        let eval = evaluate_last(&scenario_selector(), &narrow_bars(&closes));
        assert_eq!(eval.verdict, Verdict::Rejected(Condition::BbiUptrend));
    }

    #[test]
    fn dif_gate_passes_in_uptrend() {
        let selector = BbiKdjSelector {
            require_positive_dif: true,
            ..scenario_selector()
        };
        let eval = evaluate_last(&selector, &soft_rebound_bars());
        assert!(eval.is_match());
        assert!(eval.state["dif"] > 0.0);
    }

    #[test]
    fn short_history_is_insufficient() {
        let bars = soft_rebound_bars();
        let eval = evaluate_last(&scenario_selector(), &bars[..59]);
        assert_eq!(
            eval.verdict,
            Verdict::InsufficientHistory {
                required: 60,
                available: 59
            }
        );
    }

    #[test]
    fn default_params_need_113_bars() {
        assert_eq!(BbiKdjSelector::default_params().required_bars(), 113);
    }

    #[test]
    fn required_bars_saturates() {
        let selector = BbiKdjSelector {
            bbi_min_window: usize::MAX,
            ..BbiKdjSelector::default_params()
        };
        assert_eq!(selector.required_bars(), usize::MAX);
        let eval = evaluate_last(&selector, &soft_rebound_bars());
        assert_eq!(
            eval.verdict,
            Verdict::InsufficientHistory {
                required: usize::MAX,
                available: 60
            }
        );
    }
}
