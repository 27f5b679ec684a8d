//! stockpick core — bar series, indicator engine, selectors.
//!
//! This crate contains the evaluation engine of the screener:
//! - Domain types (bars, validated bar series)
//! - Indicators (RSV/KDJ, BBI, EMA/DIF, rolling min/max/rank/quantile)
//! - Indicator precomputation into a typed `IndicatorSeries`
//! - The four selector variants behind one `Selector` trait
//! - Factory turning a `StrategyConfig` into a selector

pub mod components;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;

pub use components::{create_selector, ConfigError, Condition, Evaluation, Selector, Verdict};
pub use domain::{Bar, BarError, BarSeries};
pub use engine::{IndicatorEngine, IndicatorRequest, IndicatorSeries, Line};
pub use fingerprint::{ConfigHash, StrategyConfig};
