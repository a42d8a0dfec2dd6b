//! Integration tests for the runner: quotes CSV on disk through to artifacts.
//!
//! Writes a small quote file into a temp dir, runs the default line-up, and
//! checks the statistics and the exported files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use candlelab_runner::config::RunConfig;
use candlelab_runner::export::save_artifacts;
use candlelab_runner::runner::{run_from_csv, RunError};
use candlelab_runner::LoadError;

const QUOTES: &str = "\
exchange,symbol,local_timestamp,bid_price,bid_amount
binance,DOGEUSDT,1700000000000000,10.4,5
binance,DOGEUSDT,1700000000400000,10.0,5
binance,DOGEUSDT,1700000001200000,12.0,2
binance,DOGEUSDT,not-a-time,99.0,1
binance,DOGEUSDT,1700000002100000,11.0,3
binance,DOGEUSDT,1700000003300000,11.0,1
binance,DOGEUSDT,1700000004050000,13.0,4
";

fn write_quotes(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("quotes.csv");
    fs::write(&path, QUOTES).unwrap();
    path
}

fn one_second_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.aggregation.interval_ms = 1_000;
    config.strategies.perfect_foresight_unit = 1.0;
    config
}

#[test]
fn csv_to_statistics() {
    let dir = TempDir::new().unwrap();
    let path = write_quotes(dir.path());

    let report = run_from_csv(&one_second_config(), &path).unwrap();
    assert_eq!(report.unparsable_rows.len(), 1);
    assert_eq!(report.unparsable_rows[0].index, 3);
    assert_eq!(report.quote_count, 6);

    let closes: Vec<f64> = report.bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![10.0, 12.0, 11.0, 11.0, 13.0]);
    assert_eq!(report.bars[0].open, 10.4);
    assert_eq!(report.bars[0].volume, 10.0);

    let outcome = report.first().unwrap();
    let perfect = outcome.results.get("Perfect Strategy").unwrap();
    assert_eq!(perfect.pnl, 4.0);
    assert_eq!(perfect.traded_volume, 33.0);
    assert_eq!(perfect.position_flips, 1);
    assert_eq!(perfect.average_holding_time, 1.5);
    assert!(outcome.results.get("Strategy 1").is_some());
    assert!(outcome.results.get("Strategy 2").is_some());
}

#[test]
fn artifacts_written_to_output_dir() {
    let dir = TempDir::new().unwrap();
    let path = write_quotes(dir.path());
    let mut config = one_second_config();
    config.strategies.iterations = 2;

    let report = run_from_csv(&config, &path).unwrap();
    let out = dir.path().join("out");
    let run_dir = save_artifacts(&report, &out).unwrap();

    assert!(run_dir.starts_with(&out));
    for name in ["manifest.json", "bars.csv", "results_0.csv", "results_1.csv"] {
        assert!(run_dir.join(name).is_file(), "missing {name}");
    }

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["run_id"], report.run_id.as_str());
    assert_eq!(manifest["bar_count"], 5);
    assert_eq!(manifest["unparsable_rows"], 1);
    assert_eq!(manifest["iterations"].as_array().unwrap().len(), 2);
    assert_eq!(
        manifest["iterations"][0]["results"]["Perfect Strategy"]["pnl"],
        4.0
    );

    let bars_csv = fs::read_to_string(run_dir.join("bars.csv")).unwrap();
    assert_eq!(bars_csv.lines().count(), 6);
}

#[test]
fn missing_quotes_file_is_data_error() {
    let dir = TempDir::new().unwrap();
    let err = run_from_csv(&one_second_config(), &dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, RunError::Data(LoadError::Io { .. })));
}

#[test]
fn missing_column_is_data_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quotes.csv");
    fs::write(&path, "local_timestamp,ask_price,bid_amount\n1,1.0,1.0\n").unwrap();
    let err = run_from_csv(&one_second_config(), &path).unwrap_err();
    assert!(matches!(
        err,
        RunError::Data(LoadError::MissingColumn("bid_price"))
    ));
}

#[test]
fn config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("candlelab.toml");
    fs::write(
        &config_path,
        r#"
[aggregation]
interval_ms = 1000

[simulation]
price_mode = "average"

[strategies]
perfect_foresight_unit = 1.0
iterations = 1

[[strategies.random]]
name = "only"
low = -3
high = 3
"#,
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    let quotes = write_quotes(dir.path());
    let report = run_from_csv(&config, &quotes).unwrap();
    let names: Vec<&str> = report.first().unwrap().results.names().collect();
    assert_eq!(names, vec!["Perfect Strategy", "only"]);
}
