//! Domain types for stockpick

pub mod bar;
pub mod series;

pub use bar::{Bar, BarError};
pub use series::BarSeries;

/// Ticker identifier alias
pub type Ticker = String;
