//! Selection results: one per (selector, date) run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockpick_core::domain::Ticker;
use stockpick_core::fingerprint::ConfigHash;
use stockpick_core::Condition;

/// Why a ticker produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Not found, no bar on the target date, or history ends before it.
    MissingData { detail: String },
    /// Unparseable or invalid series.
    MalformedData { detail: String },
    InsufficientHistory { required: usize, available: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingData { detail } => write!(f, "missing data: {detail}"),
            Self::MalformedData { detail } => write!(f, "malformed data: {detail}"),
            Self::InsufficientHistory {
                required,
                available,
            } => write!(
                f,
                "insufficient history: {available} of {required} bars"
            ),
        }
    }
}

/// Per-ticker outcome of one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    Matched,
    Rejected(Condition),
    Skipped(SkipReason),
}

/// Matches and diagnostics of one selector on one date. Built once by the
/// runner; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    date: NaiveDate,
    strategy: String,
    selector: String,
    config_hash: ConfigHash,
    evaluated: usize,
    matches: BTreeSet<Ticker>,
    rejected: BTreeMap<Ticker, Condition>,
    skipped: BTreeMap<Ticker, SkipReason>,
}

impl SelectionResult {
    /// Fold per-ticker outcomes. Ordered maps keep the result independent
    /// of the order outcomes arrive in.
    pub fn from_outcomes<I>(
        date: NaiveDate,
        strategy: impl Into<String>,
        selector: impl Into<String>,
        config_hash: ConfigHash,
        outcomes: I,
    ) -> Self
    where
        I: IntoIterator<Item = (Ticker, TickerOutcome)>,
    {
        let mut result = Self {
            date,
            strategy: strategy.into(),
            selector: selector.into(),
            config_hash,
            evaluated: 0,
            matches: BTreeSet::new(),
            rejected: BTreeMap::new(),
            skipped: BTreeMap::new(),
        };
        for (ticker, outcome) in outcomes {
            match outcome {
                TickerOutcome::Matched => {
                    result.evaluated += 1;
                    result.matches.insert(ticker);
                }
                TickerOutcome::Rejected(condition) => {
                    result.evaluated += 1;
                    result.rejected.insert(ticker, condition);
                }
                TickerOutcome::Skipped(reason) => {
                    if matches!(reason, SkipReason::InsufficientHistory { .. }) {
                        result.evaluated += 1;
                    }
                    result.skipped.insert(ticker, reason);
                }
            }
        }
        result
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Display name: the configured alias, or the selector variant.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Selector variant identifier.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn config_hash(&self) -> &ConfigHash {
        &self.config_hash
    }

    /// Tickers whose selector ran (matched, rejected or short of history).
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Matching tickers, ascending.
    pub fn matches(&self) -> &BTreeSet<Ticker> {
        &self.matches
    }

    pub fn is_match(&self, ticker: &str) -> bool {
        self.matches.contains(ticker)
    }

    /// First unmet condition per rejected ticker.
    pub fn rejected(&self) -> &BTreeMap<Ticker, Condition> {
        &self.rejected
    }

    pub fn skipped(&self) -> &BTreeMap<Ticker, SkipReason> {
        &self.skipped
    }

    pub fn skip_reason(&self, ticker: &str) -> Option<&SkipReason> {
        self.skipped.get(ticker)
    }
}
