//! Bar: one trading day of OHLCV data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV record for a single ticker.
///
/// Prices are positive; volume is a non-negative share count. The ticker lives
/// on the owning [`BarSeries`](super::BarSeries), not on each bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// True when every price is finite and strictly positive and the high/low
    /// band is not inverted.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0) && self.high >= self.low
    }
}

/// Reasons a bar sequence cannot become a [`BarSeries`](super::BarSeries).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BarError {
    #[error("bar {index} ({date}) is not after the previous bar ({previous})")]
    NotAscending {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },
    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),
    #[error("bar {date} has non-positive, non-finite or inverted prices")]
    InvalidPrice { date: NaiveDate },
}
