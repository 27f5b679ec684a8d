//! BreakoutVolumeKDJ selector — "breakout + volume".
//!
//! Within the `offset` days before the target, some day T must have risen at
//! least `up_threshold` percent on a volume that dominates every other day of
//! the trailing window: `volume[T] * (1 - volume_threshold) >= volume[x]`.
//! Combined with the J gate and a bounded price range.

use crate::domain::Bar;
use crate::engine::{IndicatorRequest, IndicatorSeries};
use crate::indicators::KDJ_PERIOD;

use super::{
    check_j_gate, check_positive_dif, check_price_range, Condition, EvalContext, Evaluation,
    Selector, Verdict,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutVolumeKdjSelector {
    pub j_threshold: f64,
    pub j_q_threshold: f64,
    pub up_threshold: f64,
    pub volume_threshold: f64,
    pub offset: usize,
    pub max_window: usize,
    pub price_range_pct: f64,
    pub require_positive_dif: bool,
}

/// The breakout day found inside the look-back span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakout {
    pub index: usize,
    pub return_pct: f64,
    pub volume_ratio: f64,
}

impl BreakoutVolumeKdjSelector {
    pub const NAME: &'static str = "BreakoutVolumeKDJSelector";

    pub fn default_params() -> Self {
        Self {
            j_threshold: 0.0,
            j_q_threshold: 0.10,
            up_threshold: 3.0,
            volume_threshold: 2.0 / 3.0,
            offset: 15,
            max_window: 120,
            price_range_pct: 10.0,
            require_positive_dif: false,
        }
    }

    /// Most recent qualifying breakout day in `[index - offset, index - 1]`,
    /// restricted to the trailing `max_window` bars.
    pub fn find_breakout(&self, bars: &[Bar], index: usize) -> Option<Breakout> {
        if index == 0 || index >= bars.len() {
            return None;
        }
        let window_start = (index + 1).saturating_sub(self.max_window);
        let first = index.saturating_sub(self.offset).max(window_start).max(1);
        let keep = 1.0 - self.volume_threshold;

        (first..index).rev().find_map(|t| {
            let return_pct = (bars[t].close / bars[t - 1].close - 1.0) * 100.0;
            if return_pct < self.up_threshold || bars[t].volume == 0 {
                return None;
            }
            let volume = bars[t].volume as f64;
            let others_max = (window_start..=index)
                .filter(|&x| x != t)
                .map(|x| bars[x].volume as f64)
                .fold(0.0, f64::max);
            (volume * keep >= others_max).then(|| Breakout {
                index: t,
                return_pct,
                volume_ratio: if others_max > 0.0 {
                    volume / others_max
                } else {
                    f64::INFINITY
                },
            })
        })
    }

    fn decide(&self, bars: &[Bar], ctx: &mut EvalContext<'_>) -> Result<(), Verdict> {
        check_price_range(ctx, self.price_range_pct)?;
        check_j_gate(ctx, self.j_threshold, self.j_q_threshold)?;

        let breakout = self.find_breakout(bars, ctx.index);
        let breakout = match breakout {
            Some(b) => b,
            None => return ctx.require(false, Condition::VolumeBreakout),
        };
        ctx.record("breakout_offset", (ctx.index - breakout.index) as f64);
        ctx.record("breakout_return_pct", breakout.return_pct);
        if breakout.volume_ratio.is_finite() {
            ctx.record("breakout_volume_ratio", breakout.volume_ratio);
        }

        check_positive_dif(ctx, self.require_positive_dif)
    }
}

impl Selector for BreakoutVolumeKdjSelector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_bars(&self) -> usize {
        self.max_window.max(KDJ_PERIOD).max(self.offset.saturating_add(1))
    }

    fn indicator_request(&self) -> IndicatorRequest {
        IndicatorRequest::with_window(self.max_window)
    }

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorSeries) -> Evaluation {
        let mut ctx = match EvalContext::open(bars, index, indicators, self.required_bars()) {
            Ok(ctx) => ctx,
            Err(early) => return early,
        };
        let outcome = self.decide(bars, &mut ctx);
        ctx.finish(outcome)
    }
}
