//! BarSeries: the validated, read-only daily history of one ticker.

use chrono::NaiveDate;

use super::bar::{Bar, BarError};

/// Ascending, duplicate-free sequence of bars for one ticker.
///
/// Only constructible through [`BarSeries::new`], so every instance satisfies
/// the ordering and price invariants. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate `bars` and wrap them. An empty sequence is allowed.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarError::InvalidPrice { date: bar.date });
            }
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date == previous {
                    return Err(BarError::DuplicateDate(bar.date));
                }
                if bar.date < previous {
                    return Err(BarError::NotAscending {
                        index,
                        previous,
                        date: bar.date,
                    });
                }
            }
        }
        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Index of the bar dated exactly `date`.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Bars dated on or before `date`.
    pub fn up_to(&self, date: NaiveDate) -> &[Bar] {
        let end = self.bars.partition_point(|b| b.date <= date);
        &self.bars[..end]
    }
}
