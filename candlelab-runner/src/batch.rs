//! Batch runner — evaluate many strategies over one shared bar sequence.
//!
//! Strategies are independent of one another, so they fan out across the
//! rayon pool. Each worker borrows the bars and owns its own trace; results
//! land in a name-keyed map, so completion order never shows in the output.
//!
//! A strategy that fails (wrong-length actions, a panicking source, a reused
//! name) is recorded in [`BatchOutcome::failures`] and its siblings run on.

use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use candlelab_core::domain::{ActionSeries, Bar};
use candlelab_core::engine::{simulate, PriceMode, SimulationError};
use candlelab_core::strategy::{check_alignment, generate_checked, ActionSource, SourceError};

use crate::metrics::StatisticsRow;
use crate::results::ResultsTable;

/// Why one strategy has no row in the results table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("strategy name '{0}' appears more than once in the batch")]
    DuplicateName(String),

    #[error("strategy '{strategy}' panicked while generating actions: {message}")]
    Panicked { strategy: String, message: String },
}

/// Everything one batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: ResultsTable,
    /// Strategies that produced no row, sorted by name. A name may appear
    /// more than once when several sources share it.
    pub failures: Vec<(String, StrategyError)>,
}

impl BatchOutcome {
    /// Sources submitted to the batch, whether or not they produced a row.
    pub fn strategy_count(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// First failure recorded under `name`.
    pub fn failure(&self, name: &str) -> Option<&StrategyError> {
        self.failures
            .iter()
            .find(|(failed, _)| failed == name)
            .map(|(_, err)| err)
    }
}

/// Runs a strategy line-up against bars with a fixed price mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchRunner {
    price_mode: PriceMode,
}

impl BatchRunner {
    pub fn new(price_mode: PriceMode) -> Self {
        Self { price_mode }
    }

    pub fn price_mode(&self) -> PriceMode {
        self.price_mode
    }

    /// Generate actions for each source and evaluate them.
    ///
    /// The first source with a given name runs; later ones with the same
    /// name are not run and are reported as [`StrategyError::DuplicateName`].
    pub fn run(&self, bars: &[Bar], sources: &[Box<dyn ActionSource>]) -> BatchOutcome {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        let unique: Vec<&dyn ActionSource> = sources
            .iter()
            .filter_map(|source| {
                if seen.insert(source.name()) {
                    Some(source.as_ref())
                } else {
                    duplicates.push(source.name().to_string());
                    None
                }
            })
            .collect();

        let mode = self.price_mode;
        let mut outcomes: Vec<(String, Result<StatisticsRow, StrategyError>)> = unique
            .par_iter()
            .map(|source| (source.name().to_string(), evaluate_source(*source, bars, mode)))
            .collect();
        outcomes.extend(
            duplicates
                .into_iter()
                .map(|name| (name.clone(), Err(StrategyError::DuplicateName(name)))),
        );

        collect_outcomes(outcomes, bars.len())
    }

    /// Evaluate precomputed action series, keyed by strategy name.
    pub fn run_actions(
        &self,
        bars: &[Bar],
        actions: &BTreeMap<String, ActionSeries>,
    ) -> BatchOutcome {
        let mode = self.price_mode;
        let outcomes: Vec<(String, Result<StatisticsRow, StrategyError>)> = actions
            .par_iter()
            .map(|(name, series)| {
                let row = check_alignment(name, series, bars.len())
                    .map_err(StrategyError::from)
                    .and_then(|()| evaluate_actions(bars, series, mode));
                (name.clone(), row)
            })
            .collect();

        collect_outcomes(outcomes, bars.len())
    }
}

/// Generate, simulate, and score one source.
pub fn evaluate_source(
    source: &dyn ActionSource,
    bars: &[Bar],
    mode: PriceMode,
) -> Result<StatisticsRow, StrategyError> {
    let generated = panic::catch_unwind(AssertUnwindSafe(|| generate_checked(source, bars)))
        .map_err(|payload| StrategyError::Panicked {
            strategy: source.name().to_string(),
            message: panic_message(payload.as_ref()),
        })?;
    let actions = generated?;
    evaluate_actions(bars, &actions, mode)
}

/// Simulate and score one aligned action series.
pub fn evaluate_actions(
    bars: &[Bar],
    actions: &ActionSeries,
    mode: PriceMode,
) -> Result<StatisticsRow, StrategyError> {
    let trace = simulate(bars, actions, mode)?;
    Ok(StatisticsRow::compute(&trace))
}

fn collect_outcomes(
    outcomes: Vec<(String, Result<StatisticsRow, StrategyError>)>,
    bar_count: usize,
) -> BatchOutcome {
    let mut batch = BatchOutcome::default();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(row) => {
                debug!(
                    strategy = %name,
                    pnl = row.pnl,
                    flips = row.position_flips,
                    "strategy evaluated"
                );
                batch.results.insert(name, row);
            }
            Err(err) => {
                warn!(strategy = %name, error = %err, "strategy excluded from results");
                batch.failures.push((name, err));
            }
        }
    }
    batch.failures.sort_by(|a, b| a.0.cmp(&b.0));
    info!(
        bars = bar_count,
        strategies = batch.strategy_count(),
        failures = batch.failures.len(),
        "batch complete"
    );
    batch
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
