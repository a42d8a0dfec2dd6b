//! Run orchestration — wires together loading, aggregation, and the batch runner.
//!
//! Two entry points:
//! - `run_from_csv()`: loads quotes from a CSV file, then runs. Used by the CLI.
//! - `run_from_quotes()`: takes quotes already in memory.
//!
//! Bars are built once and shared by every iteration; only the random
//! strategies' seeds change between iterations.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use candlelab_core::data::{aggregate_quotes_with, AggregateError, SkippedQuote};
use candlelab_core::domain::{Bar, RawQuote};

use crate::batch::{BatchOutcome, BatchRunner};
use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{load_quotes_csv, LoadError};

/// Errors that stop a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("aggregation error: {0}")]
    Aggregate(#[from] AggregateError),
}

/// Complete result of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub config: RunConfig,
    pub bars: Vec<Bar>,
    /// Quotes folded into bars.
    pub quote_count: usize,
    /// CSV rows that could not be parsed (file row index).
    pub unparsable_rows: Vec<SkippedQuote>,
    /// Parsed quotes rejected by aggregation (index into the loaded quotes).
    pub malformed_quotes: Vec<SkippedQuote>,
    /// One batch per iteration, in iteration order.
    pub iterations: Vec<BatchOutcome>,
}

impl RunReport {
    /// Outcome of the first iteration.
    pub fn first(&self) -> Option<&BatchOutcome> {
        self.iterations.first()
    }
}

/// Load quotes from `path` and run the configured batch over them.
pub fn run_from_csv(config: &RunConfig, path: &Path) -> Result<RunReport, RunError> {
    config.validate()?;
    let loaded = load_quotes_csv(path)?;
    let mut report = run_from_quotes(config, loaded.quotes)?;
    report.unparsable_rows = loaded.skipped;
    Ok(report)
}

/// Aggregate `quotes` into bars and run every iteration of the batch.
pub fn run_from_quotes(config: &RunConfig, quotes: Vec<RawQuote>) -> Result<RunReport, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let interval = config.interval()?;

    let aggregation = aggregate_quotes_with(quotes, interval, config.aggregation.on_malformed)?;
    if aggregation.bars.is_empty() {
        warn!("no valid quotes; every strategy runs over zero bars");
    }
    info!(
        run_id = %run_id,
        interval_ms = interval.as_millis(),
        quotes = aggregation.quote_count,
        skipped = aggregation.skipped.len(),
        bars = aggregation.bars.len(),
        "aggregated quotes into bars"
    );

    let iterations = run_iterations(config, &aggregation.bars);

    Ok(RunReport {
        run_id,
        config: config.clone(),
        bars: aggregation.bars,
        quote_count: aggregation.quote_count,
        unparsable_rows: Vec::new(),
        malformed_quotes: aggregation.skipped,
        iterations,
    })
}

/// Run the configured line-up once per iteration over prepared bars.
pub fn run_iterations(config: &RunConfig, bars: &[Bar]) -> Vec<BatchOutcome> {
    let runner = BatchRunner::new(config.simulation.price_mode);
    (0..u64::from(config.strategies.iterations))
        .map(|iteration| {
            let sources = config.build_sources(iteration);
            info!(iteration, strategies = sources.len(), "running batch");
            let outcome = runner.run(bars, &sources);
            info!(iteration, "results\n{}", outcome.results);
            outcome
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use candlelab_core::data::MalformedPolicy;

    fn quotes() -> Vec<RawQuote> {
        let ms = 1_000;
        [
            (0, 10.4),
            (400, 10.0),
            (1_200, 12.0),
            (2_100, 11.0),
            (3_300, 11.0),
            (4_050, 13.0),
        ]
        .iter()
        .map(|&(t, p)| RawQuote {
            local_timestamp: t * ms,
            bid_price: p,
            bid_amount: 1.0,
        })
        .collect()
    }

    fn config() -> RunConfig {
        let mut config = RunConfig::default();
        config.aggregation.interval_ms = 1_000;
        config.strategies.perfect_foresight_unit = 1.0;
        config
    }

    #[test]
    fn runs_default_lineup() {
        let report = run_from_quotes(&config(), quotes()).unwrap();
        assert_eq!(report.bars.len(), 5);
        assert_eq!(report.quote_count, 6);
        assert_eq!(report.iterations.len(), 1);

        let outcome = report.first().unwrap();
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.failures.is_empty());
        let perfect = outcome.results.get("Perfect Strategy").unwrap();
        assert_eq!(perfect.pnl, 4.0);
        assert_eq!(perfect.traded_volume, 33.0);
        assert_eq!(perfect.position_flips, 1);
        assert_eq!(perfect.average_holding_time, 1.5);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn results_table_logged_per_iteration() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        let mut config = config();
        config.strategies.iterations = 2;
        let report = tracing::subscriber::with_default(subscriber, || {
            run_from_quotes(&config, quotes()).unwrap()
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        let table = report.first().unwrap().results.to_string();
        assert!(output.contains(&table), "results table missing from log:\n{output}");
        assert_eq!(output.matches("PositionFlips").count(), 2);
    }

    #[test]
    fn invalid_config_fails_before_aggregation() {
        let mut config = config();
        config.aggregation.interval_ms = -5;
        assert!(matches!(
            run_from_quotes(&config, quotes()),
            Err(RunError::Config(ConfigError::InvalidInterval(-5)))
        ));
    }

    #[test]
    fn reject_policy_fails_on_malformed_quote() {
        let mut config = config();
        config.aggregation.on_malformed = MalformedPolicy::Reject;
        let mut quotes = quotes();
        quotes[2].bid_price = f64::NAN;
        assert!(matches!(
            run_from_quotes(&config, quotes),
            Err(RunError::Aggregate(AggregateError::MalformedQuote { index: 2, .. }))
        ));
    }

    #[test]
    fn skip_policy_records_malformed_quote() {
        let mut quotes = quotes();
        quotes[2].bid_amount = -1.0;
        let report = run_from_quotes(&config(), quotes).unwrap();
        assert_eq!(report.malformed_quotes.len(), 1);
        assert_eq!(report.malformed_quotes[0].index, 2);
        assert_eq!(report.quote_count, 5);
    }

    #[test]
    fn iterations_vary_random_rows_only() {
        let mut config = config();
        config.strategies.iterations = 3;
        let report = run_from_quotes(&config, quotes()).unwrap();
        assert_eq!(report.iterations.len(), 3);

        let perfect: Vec<_> = report
            .iterations
            .iter()
            .map(|o| *o.results.get("Perfect Strategy").unwrap())
            .collect();
        assert!(perfect.windows(2).all(|w| w[0].pnl == w[1].pnl));

        let random: Vec<_> = report
            .iterations
            .iter()
            .map(|o| o.results.get("Strategy 1").unwrap().traded_volume)
            .collect();
        assert!(random[0] != random[1] || random[1] != random[2]);
    }

    #[test]
    fn same_config_same_results() {
        let a = run_from_quotes(&config(), quotes()).unwrap();
        let b = run_from_quotes(&config(), quotes()).unwrap();
        assert_eq!(a.run_id, b.run_id);
        let ra = &a.first().unwrap().results;
        let rb = &b.first().unwrap().results;
        for name in ["Strategy 1", "Strategy 2"] {
            assert_eq!(ra.get(name).unwrap().pnl, rb.get(name).unwrap().pnl);
            assert_eq!(
                ra.get(name).unwrap().traded_volume,
                rb.get(name).unwrap().traded_volume
            );
        }
    }

    #[test]
    fn no_quotes_yields_flat_rows() {
        let report = run_from_quotes(&config(), Vec::new()).unwrap();
        assert!(report.bars.is_empty());
        let outcome = report.first().unwrap();
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results.iter().all(|(_, row)| row.pnl == 0.0));
    }
}
