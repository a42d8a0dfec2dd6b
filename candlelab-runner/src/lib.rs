//! CandleLab Runner — batch orchestration, statistics, configuration, export.
//!
//! This crate builds on `candlelab-core` to provide:
//! - Quote loading from CSV
//! - TOML run configuration with a deterministic run id
//! - Parallel batch evaluation of a strategy line-up
//! - Per-strategy statistics (PnL, Sharpe, Sortino, drawdown, holding time)
//! - Results tables and CSV/JSON artifacts

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod results;
pub mod runner;

pub use batch::{evaluate_actions, evaluate_source, BatchOutcome, BatchRunner, StrategyError};
pub use config::{ConfigError, RandomStrategyConfig, RunConfig, RunId};
pub use data_loader::{load_quotes_csv, load_quotes_reader, LoadError, LoadedQuotes};
pub use export::{export_bars_csv, export_report_json, export_results_csv, save_artifacts};
pub use metrics::StatisticsRow;
pub use results::ResultsTable;
pub use runner::{run_from_csv, run_from_quotes, run_iterations, RunError, RunReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn statistics_row_is_send_sync() {
        assert_send::<StatisticsRow>();
        assert_sync::<StatisticsRow>();
    }

    #[test]
    fn results_table_is_send_sync() {
        assert_send::<ResultsTable>();
        assert_sync::<ResultsTable>();
    }

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchRunner>();
        assert_sync::<BatchRunner>();
        assert_send::<BatchOutcome>();
        assert_sync::<BatchOutcome>();
        assert_send::<StrategyError>();
        assert_sync::<StrategyError>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }
}
