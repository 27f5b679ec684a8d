//! stockpick runner — selection orchestration over a ticker universe.
//!
//! This crate builds on `stockpick-core` to provide:
//! - Bar loading behind the `BarLoader` trait (CSV directory, in-memory)
//! - Selector configuration files (JSON and TOML)
//! - The parallel `SelectionRunner`
//! - `SelectionResult` with matches and per-ticker diagnostics

pub mod config;
pub mod loader;
pub mod result;
pub mod runner;

pub use config::{ConfigFileError, SelectorFile};
pub use loader::{parse_date, BarLoader, CsvDirLoader, LoadError, MemoryLoader};
pub use result::{SelectionResult, SkipReason, TickerOutcome};
pub use runner::{latest_date, RunError, SelectionRunner};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn loaders_are_send_sync() {
        assert_send::<CsvDirLoader>();
        assert_sync::<CsvDirLoader>();
        assert_send::<MemoryLoader>();
        assert_sync::<MemoryLoader>();
        assert_send::<Box<dyn BarLoader>>();
        assert_sync::<Box<dyn BarLoader>>();
    }

    #[test]
    fn results_are_send_sync() {
        assert_send::<SelectionResult>();
        assert_sync::<SelectionResult>();
        assert_send::<SkipReason>();
        assert_sync::<SkipReason>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }

    #[test]
    fn runner_is_send_sync() {
        assert_send::<SelectionRunner>();
        assert_sync::<SelectionRunner>();
        assert_send::<SelectorFile>();
        assert_sync::<SelectorFile>();
    }
}
