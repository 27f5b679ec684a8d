//! Indicator engine: turns a bar history into the derived sequences selectors read.

pub mod precompute;

pub use precompute::{IndicatorEngine, IndicatorRequest, IndicatorSeries, Line};
