//! PeakKDJ selector — "fill the pit".
//!
//! Looks back over the trailing `max_window` bars for a pit: a local closing
//! high (the mouth) followed by a trough (the floor) at least `gap_threshold`
//! below it. Matches when J is at an extreme low and today's close sits within
//! `fluc_threshold` of the floor.

use crate::domain::Bar;
use crate::engine::{IndicatorRequest, IndicatorSeries};
use crate::indicators::KDJ_PERIOD;

use super::{check_j_gate, Condition, EvalContext, Evaluation, Selector, Verdict};

#[derive(Debug, Clone, PartialEq)]
pub struct PeakKdjSelector {
    pub j_threshold: f64,
    pub j_q_threshold: f64,
    pub max_window: usize,
    pub fluc_threshold: f64,
    pub gap_threshold: f64,
    pub peak_distance: usize,
}

/// A qualifying mouth and the lowest close between it and the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pit {
    pub mouth_index: usize,
    pub mouth_close: f64,
    pub floor_index: usize,
    pub floor_close: f64,
}

impl PeakKdjSelector {
    pub const NAME: &'static str = "PeakKDJSelector";

    pub fn default_params() -> Self {
        Self {
            j_threshold: -5.0,
            j_q_threshold: 0.10,
            max_window: 90,
            fluc_threshold: 0.03,
            gap_threshold: 0.2,
            peak_distance: 6,
        }
    }

    /// Most recent qualifying pit whose mouth lies in the trailing window
    /// before `index`, with at least one bar between mouth and target.
    pub fn find_pit(&self, bars: &[Bar], index: usize) -> Option<Pit> {
        if index < 2 || index >= bars.len() {
            return None;
        }
        let start = (index + 1).saturating_sub(self.max_window);

        (start + 1..=index - 2)
            .rev()
            .filter(|&p| self.is_mouth(bars, p, start, index))
            .find_map(|p| {
                let (floor_index, floor_close) = bars[p + 1..index]
                    .iter()
                    .enumerate()
                    .map(|(offset, b)| (p + 1 + offset, b.close))
                    .fold((p + 1, f64::INFINITY), |best, cur| {
                        if cur.1 < best.1 {
                            cur
                        } else {
                            best
                        }
                    });
                let mouth_close = bars[p].close;
                (mouth_close >= floor_close * (1.0 + self.gap_threshold)).then_some(Pit {
                    mouth_index: p,
                    mouth_close,
                    floor_index,
                    floor_close,
                })
            })
    }

    /// Strictly above the closes up to `peak_distance` bars to the left (within
    /// the window) and at least as high as those up to `peak_distance` bars to
    /// the right (before the target).
    fn is_mouth(&self, bars: &[Bar], p: usize, start: usize, index: usize) -> bool {
        let close = bars[p].close;
        let left = p.saturating_sub(self.peak_distance).max(start);
        let right = p.saturating_add(self.peak_distance).min(index - 1);
        bars[left..p].iter().all(|b| close > b.close)
            && bars[p + 1..=right].iter().all(|b| close >= b.close)
    }

    fn decide(&self, bars: &[Bar], ctx: &mut EvalContext<'_>) -> Result<(), Verdict> {
        check_j_gate(ctx, self.j_threshold, self.j_q_threshold)?;

        let pit = self.find_pit(bars, ctx.index);
        let pit = match pit {
            Some(pit) => pit,
            None => return ctx.require(false, Condition::PitMouth),
        };
        ctx.record("mouth_close", pit.mouth_close);
        ctx.record("mouth_offset", (ctx.index - pit.mouth_index) as f64);
        ctx.record("floor_close", pit.floor_close);
        ctx.record("gap", pit.mouth_close / pit.floor_close - 1.0);

        let close = bars[ctx.index].close;
        let fluctuation = (close - pit.floor_close).abs() / pit.floor_close;
        ctx.record("fluctuation", fluctuation);
        ctx.require(fluctuation <= self.fluc_threshold, Condition::PitFluctuation)
    }
}

impl Selector for PeakKdjSelector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_bars(&self) -> usize {
        self.max_window.max(KDJ_PERIOD).max(3)
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
