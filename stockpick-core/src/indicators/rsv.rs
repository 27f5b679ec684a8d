//! Raw Stochastic Value (RSV).
//!
//! RSV[i] = (close[i] - lowest_low(n)) / (highest_high(n) - lowest_low(n)) * 100,
//! over the trailing `n` bars including bar i. A zero-width band yields the
//! neutral value 50. Lookback: n - 1.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::rolling::{rolling_max, rolling_min};

/// RSV reported when the high/low band has zero width.
pub const NEUTRAL_RSV: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Rsv {
    period: usize,
    name: String,
}

impl Rsv {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            name: format!("rsv_{period}"),
        }
    }
}

impl Indicator for Rsv {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rsv_of_bars(bars, self.period)
    }
}

pub fn rsv_of_bars(bars: &[Bar], period: usize) -> Vec<f64> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highest = rolling_max(&highs, period);
    let lowest = rolling_min(&lows, period);

    bars.iter()
        .zip(highest.iter().zip(&lowest))
        .map(|(bar, (&hi, &lo))| {
            if hi.is_nan() || lo.is_nan() {
                return f64::NAN;
            }
            let width = hi - lo;
            if width <= 0.0 {
                NEUTRAL_RSV
            } else {
                (bar.close - lo) / width * 100.0
            }
        })
        .collect()
}
