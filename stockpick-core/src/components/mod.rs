//! Component traits and their construction.
//!
//! - Indicator: pure bar history -> numeric series
//! - Selector: pure (bars, indicators, target) -> verdict with explanation
//! - Factory: configuration -> boxed selector

pub mod factory;
pub mod indicator;
pub mod selector;

pub use factory::{canonical_name, create_selector, ConfigError, MAX_WINDOW, SELECTOR_VARIANTS};
pub use indicator::Indicator;
pub use selector::{Condition, Evaluation, Selector, Verdict};
