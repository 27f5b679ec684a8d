//! Selection runner — wires together loader, indicator engine and selectors.
//!
//! Two entry points:
//! - `run()`: one configuration on one date.
//! - `run_all()`: every configuration of a selector file; each ticker is
//!   loaded once and its indicators are shared between selectors asking
//!   for the same request.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use stockpick_core::components::{create_selector, ConfigError, Selector, Verdict};
use stockpick_core::domain::{BarSeries, Ticker};
use stockpick_core::engine::{IndicatorEngine, IndicatorRequest, IndicatorSeries};
use stockpick_core::fingerprint::StrategyConfig;

use crate::loader::{BarLoader, LoadError};
use crate::result::{SelectionResult, SkipReason, TickerOutcome};

/// Errors from the runner. Data problems are per-ticker skips, never errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("no target date: none of the {0} tickers has loadable data")]
    NoTargetDate(usize),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Runs selectors over a ticker universe.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRunner {
    workers: usize,
}

impl Default for SelectionRunner {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// A configured selector ready to run.
struct Prepared<'c> {
    config: &'c StrategyConfig,
    selector: Box<dyn Selector>,
    request: IndicatorRequest,
}

impl SelectionRunner {
    /// `workers <= 1` runs sequentially.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one configuration on `date`.
    pub fn run(
        &self,
        universe: &[Ticker],
        loader: &dyn BarLoader,
        config: &StrategyConfig,
        date: NaiveDate,
    ) -> Result<SelectionResult, RunError> {
        let mut results = self.run_all(universe, loader, std::slice::from_ref(config), Some(date))?;
        // run_all returns exactly one result per configuration
        results.pop().ok_or(RunError::NoTargetDate(universe.len()))
    }

    /// Run every configuration in order. Without `date`, the latest date
    /// of any loadable series in the universe is the target.
    ///
    /// Every configuration is validated before the first ticker is loaded.
    pub fn run_all(
        &self,
        universe: &[Ticker],
        loader: &dyn BarLoader,
        configs: &[StrategyConfig],
        date: Option<NaiveDate>,
    ) -> Result<Vec<SelectionResult>, RunError> {
        let prepared = configs
            .iter()
            .map(|config| {
                let selector = create_selector(config)?;
                let request = selector.indicator_request();
                Ok(Prepared {
                    config,
                    selector,
                    request,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let pool = self.pool()?;

        let tickers: Vec<Ticker> = universe
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let loaded = par_map(pool.as_ref(), &tickers, |ticker| {
            (ticker.clone(), loader.load(ticker))
        });

        let date = match date {
            Some(date) => date,
            None => latest_date(&loaded).ok_or(RunError::NoTargetDate(tickers.len()))?,
        };

        let per_ticker = par_map(pool.as_ref(), &loaded, |(ticker, series)| {
            evaluate_ticker(&prepared, ticker, series, date)
        });

        let results: Vec<SelectionResult> = prepared
            .iter()
            .enumerate()
            .map(|(slot, p)| {
                let outcomes = tickers
                    .iter()
                    .zip(&per_ticker)
                    .map(|(ticker, outcomes)| (ticker.clone(), outcomes[slot].clone()));
                SelectionResult::from_outcomes(
                    date,
                    p.config.display_name(),
                    p.selector.name(),
                    p.config.full_hash(),
                    outcomes,
                )
            })
            .collect();

        for result in &results {
            info!(
                strategy = result.strategy(),
                %date,
                evaluated = result.evaluated(),
                matched = result.matches().len(),
                skipped = result.skipped().len(),
                "selection complete"
            );
        }
        Ok(results)
    }

    /// Worker pool shared by every parallel stage of one run; `None` when
    /// running sequentially.
    fn pool(&self) -> Result<Option<rayon::ThreadPool>, RunError> {
        if self.workers <= 1 {
            return Ok(None);
        }
        let tp = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        Ok(Some(tp))
    }
}

/// Map on `pool` when there is one. Output order follows input order either way.
fn par_map<I, T, F>(pool: Option<&rayon::ThreadPool>, items: &[I], f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Send + Sync,
{
    match pool {
        Some(tp) => tp.install(|| items.par_iter().map(&f).collect()),
        None => items.iter().map(&f).collect(),
    }
}

/// Latest last-bar date among the series that loaded.
pub fn latest_date(loaded: &[(Ticker, Result<BarSeries, LoadError>)]) -> Option<NaiveDate> {
    loaded
        .iter()
        .filter_map(|(_, series)| series.as_ref().ok()?.last_date())
        .max()
}

/// Outcome of every prepared selector for one ticker, in selector order.
fn evaluate_ticker(
    prepared: &[Prepared<'_>],
    ticker: &str,
    series: &Result<BarSeries, LoadError>,
    date: NaiveDate,
) -> Vec<TickerOutcome> {
    let skip_all = |reason: SkipReason| {
        debug!(ticker, %reason, "skipping ticker");
        vec![TickerOutcome::Skipped(reason); prepared.len()]
    };

    let series = match series {
        Ok(series) => series,
        Err(LoadError::NotFound { .. }) => {
            return skip_all(SkipReason::MissingData {
                detail: "no bar data".into(),
            })
        }
        Err(LoadError::Malformed { reason, .. }) => {
            return skip_all(SkipReason::MalformedData {
                detail: reason.clone(),
            })
        }
        Err(e @ LoadError::Io { .. }) => {
            return skip_all(SkipReason::MissingData {
                detail: e.to_string(),
            })
        }
    };

    let Some(last) = series.last_date() else {
        return skip_all(SkipReason::MissingData {
            detail: "empty series".into(),
        });
    };
    if last < date {
        return skip_all(SkipReason::MissingData {
            detail: format!("history ends {last}, before {date}"),
        });
    }
    if series.index_of(date).is_none() {
        return skip_all(SkipReason::MissingData {
            detail: format!("no bar on {date}"),
        });
    }

    let bars = series.up_to(date);
    let index = bars.len() - 1;
    let mut cache: Vec<(IndicatorRequest, IndicatorSeries)> = Vec::new();

    prepared
        .iter()
        .map(|p| {
            let slot = match cache.iter().position(|(req, _)| *req == p.request) {
                Some(slot) => slot,
                None => {
                    let indicators = IndicatorEngine::new(p.request.clone()).compute(bars);
                    cache.push((p.request.clone(), indicators));
                    cache.len() - 1
                }
            };
            let evaluation = p.selector.evaluate(bars, index, &cache[slot].1);
            match evaluation.verdict {
                Verdict::Matched => TickerOutcome::Matched,
                Verdict::Rejected(condition) => TickerOutcome::Rejected(condition),
                Verdict::InsufficientHistory {
                    required,
                    available,
                } => {
                    debug!(ticker, required, available, "insufficient history");
                    TickerOutcome::Skipped(SkipReason::InsufficientHistory {
                        required,
                        available,
                    })
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use stockpick_core::domain::Bar;

    fn series(ticker: &str, days: usize) -> BarSeries {
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let bars = (0..days)
            .map(|i| {
                let close = 10.0 + (i as f64 * 0.3).sin();
                Bar {
                    date: base + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 0.2,
                    low: close - 0.2,
                    close,
                    volume: 1_000,
                }
            })
            .collect();
        BarSeries::new(ticker, bars).unwrap()
    }

    #[test]
    fn workers_are_at_least_one() {
        assert_eq!(SelectionRunner::new(0).workers(), 1);
        assert_eq!(SelectionRunner::default().workers(), 1);
    }

    #[test]
    fn pool_is_sized_to_workers() {
        assert!(SelectionRunner::new(1).pool().unwrap().is_none());
        let pool = SelectionRunner::new(3).pool().unwrap().unwrap();
        assert_eq!(pool.current_num_threads(), 3);
    }

    #[test]
    fn one_pool_serves_every_stage() {
        let pool = SelectionRunner::new(2).pool().unwrap();
        let items: Vec<usize> = (0..50).collect();
        let doubled = par_map(pool.as_ref(), &items, |i| i * 2);
        let summed = par_map(pool.as_ref(), &doubled, |i| i + 1);
        let expected: Vec<usize> = (0..50).map(|i| i * 2 + 1).collect();
        assert_eq!(summed, expected);
        assert_eq!(par_map(None, &items, |i| i * 2), doubled);
    }

    #[test]
    fn latest_date_ignores_failed_loads() {
        let loaded = vec![
            ("A".to_string(), Ok(series("A", 10))),
            ("B".to_string(), Ok(series("B", 30))),
            (
                "C".to_string(),
                Err(LoadError::NotFound {
                    ticker: "C".to_string(),
                }),
            ),
        ];
        assert_eq!(
            latest_date(&loaded),
            NaiveDate::from_ymd_opt(2025, 1, 30)
        );
        assert_eq!(latest_date(&[]), None);
    }

    #[test]
    fn stale_series_is_missing_data() {
        let loader = MemoryLoader::new().with(series("A", 10));
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let result = SelectionRunner::new(1)
            .run(
                &["A".to_string()],
                &loader,
                &StrategyConfig::new("bbi_kdj"),
                date,
            )
            .unwrap();
        assert!(matches!(
            result.skip_reason("A"),
            Some(SkipReason::MissingData { .. })
        ));
        assert_eq!(result.evaluated(), 0);
    }

    #[test]
    fn short_series_is_insufficient_history() {
        let loader = MemoryLoader::new().with(series("A", 30));
        let date = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let result = SelectionRunner::new(1)
            .run(
                &["A".to_string()],
                &loader,
                &StrategyConfig::new("bbi_kdj"),
                date,
            )
            .unwrap();
        assert_eq!(
            result.skip_reason("A"),
            Some(&SkipReason::InsufficientHistory {
                required: 113,
                available: 30
            })
        );
        assert_eq!(result.evaluated(), 1);
    }
}
