//! Reporting and export — CSV and JSON artifact generation.
//!
//! Provides export formats for a run:
//! - **Results CSV**: one row per strategy, NaN written as `NaN`
//! - **Results JSON**: the full run summary, NaN written as `null`
//! - **Bars CSV**: the OHLCV sequence for external charting tools

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use candlelab_core::domain::Bar;

use crate::batch::BatchOutcome;
use crate::results::{format_metric, ResultsTable, COLUMNS};
use crate::runner::RunReport;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Results export ─────────────────────────────────────────────────

/// Export a results table as CSV with the display column headers.
pub fn export_results_csv(table: &ResultsTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(COLUMNS)?;
    for (name, row) in table.iter() {
        wtr.write_record([
            name.to_string(),
            csv_number(row.pnl),
            csv_number(row.traded_volume),
            csv_number(row.sharpe_ratio),
            csv_number(row.sortino_ratio),
            csv_number(row.max_drawdown),
            csv_number(row.average_holding_time),
            row.position_flips.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Full precision for finite values; NaN and infinities as in the text table.
fn csv_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        format_metric(value)
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    schema_version: u32,
    run_id: &'a str,
    bar_count: usize,
    quote_count: usize,
    unparsable_rows: usize,
    malformed_quotes: usize,
    iterations: Vec<IterationSummary<'a>>,
}

#[derive(Serialize)]
struct IterationSummary<'a> {
    iteration: usize,
    results: &'a ResultsTable,
    failures: Vec<FailureSummary<'a>>,
}

#[derive(Serialize)]
struct FailureSummary<'a> {
    strategy: &'a str,
    error: String,
}

impl<'a> IterationSummary<'a> {
    fn new(iteration: usize, outcome: &'a BatchOutcome) -> Self {
        Self {
            iteration,
            results: &outcome.results,
            failures: outcome
                .failures
                .iter()
                .map(|(name, err)| FailureSummary {
                    strategy: name,
                    error: err.to_string(),
                })
                .collect(),
        }
    }
}

/// Serialize a run summary to pretty JSON.
pub fn export_report_json(report: &RunReport) -> Result<String> {
    let manifest = Manifest {
        schema_version: SCHEMA_VERSION,
        run_id: &report.run_id,
        bar_count: report.bars.len(),
        quote_count: report.quote_count,
        unparsable_rows: report.unparsable_rows.len(),
        malformed_quotes: report.malformed_quotes.len(),
        iterations: report
            .iterations
            .iter()
            .enumerate()
            .map(|(i, outcome)| IterationSummary::new(i, outcome))
            .collect(),
    };
    serde_json::to_string_pretty(&manifest).context("failed to serialize run report to JSON")
}

// ─── Bars export ────────────────────────────────────────────────────

/// Export bars as CSV: period_start (RFC 3339), open, high, low, close, volume.
pub fn export_bars_csv(bars: &[Bar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["period_start", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            bar.period_start.to_rfc3339(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates a directory named after the first 16 hex digits of the run id
/// under `output_dir` containing:
/// - `manifest.json` — the run summary
/// - `bars.csv` — the aggregated bars
/// - `results_{k}.csv` — one results table per iteration
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run_id.chars().take(16).collect();
    let run_dir = output_dir.join(format!("run_{short_id}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_report_json(report)?;
    write_file(&run_dir.join("manifest.json"), &json)?;

    let bars_csv = export_bars_csv(&report.bars)?;
    write_file(&run_dir.join("bars.csv"), &bars_csv)?;

    for (i, outcome) in report.iterations.iter().enumerate() {
        let csv = export_results_csv(&outcome.results)?;
        write_file(&run_dir.join(format!("results_{i}.csv")), &csv)?;
    }

    Ok(run_dir)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::StrategyError;
    use crate::metrics::StatisticsRow;
    use chrono::{DateTime, Utc};

    fn sample_table() -> ResultsTable {
        let mut table = ResultsTable::new();
        table.insert(
            "Perfect Strategy",
            StatisticsRow {
                pnl: 4.0,
                traded_volume: 33.0,
                sharpe_ratio: f64::NAN,
                sortino_ratio: f64::NAN,
                max_drawdown: 0.0,
                average_holding_time: 1.5,
                position_flips: 1,
            },
        );
        table
    }

    #[test]
    fn results_csv_header_and_nan() {
        let csv = export_results_csv(&sample_table()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Strategy,PnL,TradedVolume,SharpeRatio,SortinoRatio,MaxDrawdown,AverageHoldingTime,PositionFlips"
        );
        assert_eq!(lines[1], "Perfect Strategy,4,33,NaN,NaN,0,1.5,1");
    }

    #[test]
    fn iteration_summary_lists_each_failure() {
        let outcome = BatchOutcome {
            results: sample_table(),
            failures: vec![
                ("dup".to_string(), StrategyError::DuplicateName("dup".to_string())),
                ("dup".to_string(), StrategyError::DuplicateName("dup".to_string())),
            ],
        };
        let json = serde_json::to_value(IterationSummary::new(0, &outcome)).unwrap();
        let failures = json["failures"].as_array().unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1]["strategy"], "dup");
        assert_eq!(json["results"]["Perfect Strategy"]["pnl"], 4.0);
    }

    #[test]
    fn bars_csv_layout() {
        let bars = vec![Bar {
            period_start: DateTime::<Utc>::from_timestamp_micros(60_000_000).unwrap(),
            open: 1.0,
            high: 2.5,
            low: 0.5,
            close: 2.0,
            volume: 10.0,
        }];
        let csv = export_bars_csv(&bars).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "period_start,open,high,low,close,volume");
        assert_eq!(lines[1], "1970-01-01T00:01:00+00:00,1,2.5,0.5,2,10");
    }

    #[test]
    fn empty_bars_csv_is_header_only() {
        let csv = export_bars_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
