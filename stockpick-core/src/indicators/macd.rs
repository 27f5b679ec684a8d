//! MACD DIF line: EMA(close, fast) - EMA(close, slow).
//!
//! Both EMAs are seeded at the first close, so DIF starts at 0 and is defined
//! everywhere.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::ema::ema_of_series;

pub const DIF_FAST_SPAN: usize = 12;
pub const DIF_SLOW_SPAN: usize = 26;

#[derive(Debug, Clone)]
pub struct Dif {
    fast: usize,
    slow: usize,
    name: String,
}

impl Dif {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self {
            fast,
            slow,
            name: format!("dif_{fast}_{slow}"),
        }
    }
}

impl Default for Dif {
    fn default() -> Self {
        Self::new(DIF_FAST_SPAN, DIF_SLOW_SPAN)
    }
}

impl Indicator for Dif {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        dif_of_series(&closes, self.fast, self.slow)
    }
}

pub fn dif_of_series(values: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);
    fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn dif_starts_at_zero() {
        let result = Dif::default().compute(&make_bars(&[10.0, 11.0, 12.0]));
        assert_approx(result[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn dif_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 10.0 + i as f64 * 0.1).collect();
        let result = Dif::default().compute(&make_bars(&closes));
        assert!(result[1..].iter().all(|v| *v > 0.0));
    }

    #[test]
    fn dif_negative_in_downtrend() {
        let closes: Vec<f64> = (0..60).map(|i| 20.0 - i as f64 * 0.1).collect();
        let result = Dif::default().compute(&make_bars(&closes));
        assert!(result[59] < 0.0);
    }
}
