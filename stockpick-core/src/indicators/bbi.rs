//! Bull and Bear Index (BBI).
//!
//! BBI[i] = (SMA3 + SMA6 + SMA12 + SMA24) / 4 of close.
//! Lookback: 23 (the longest average needs 24 bars).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::sma::sma_of_series;

/// Moving-average periods averaged into BBI.
pub const BBI_PERIODS: [usize; 4] = [3, 6, 12, 24];

/// First index at which BBI is defined.
pub const BBI_LOOKBACK: usize = 23;

#[derive(Debug, Clone, Default)]
pub struct Bbi;

impl Indicator for Bbi {
    fn name(&self) -> &str {
        "bbi"
    }

    fn lookback(&self) -> usize {
        BBI_LOOKBACK
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        bbi_of_series(&closes)
    }
}

pub fn bbi_of_series(closes: &[f64]) -> Vec<f64> {
    let averages: Vec<Vec<f64>> = BBI_PERIODS
        .iter()
        .map(|&p| sma_of_series(closes, p))
        .collect();
    (0..closes.len())
        .map(|i| averages.iter().map(|a| a[i]).sum::<f64>() / BBI_PERIODS.len() as f64)
        .collect()
}
