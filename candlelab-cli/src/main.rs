//! CandleLab CLI — aggregate quotes into bars and evaluate strategies.
//!
//! Commands:
//! - `run` — aggregate a quotes CSV and score the strategy line-up
//! - `bars` — aggregate a quotes CSV and write the bars as CSV

mod obs;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use candlelab_core::data::aggregate_quotes_with;
use candlelab_core::engine::PriceMode;
use candlelab_runner::export::{export_bars_csv, save_artifacts};
use candlelab_runner::{load_quotes_csv, run_from_csv, RunConfig, RunReport};

use obs::{init_tracing, LogFormat};

#[derive(Parser)]
#[command(
    name = "candlelab",
    about = "CandleLab CLI — quote-to-bar aggregation and strategy backtesting"
)]
struct Cli {
    /// Log level or filter directive (overridden by CANDLELAB_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate quotes into bars and evaluate every configured strategy.
    Run {
        /// Quotes CSV with local_timestamp, bid_price, bid_amount columns.
        #[arg(long)]
        quotes: PathBuf,

        /// Path to a TOML config file. Defaults to the built-in line-up.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar length in milliseconds (overrides config).
        #[arg(long)]
        interval_ms: Option<i64>,

        /// Trade price per bar (overrides config).
        #[arg(long, value_enum)]
        price_mode: Option<PriceModeArg>,

        /// Number of repeated batches with fresh random seeds (overrides config).
        #[arg(long)]
        iterations: Option<u32>,

        /// Master seed for the random strategies (overrides config).
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for manifest, bars, and results files.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Aggregate quotes into bars and write them as CSV.
    Bars {
        /// Quotes CSV with local_timestamp, bid_price, bid_amount columns.
        #[arg(long)]
        quotes: PathBuf,

        /// Bar length in milliseconds.
        #[arg(long)]
        interval_ms: i64,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriceModeArg {
    Close,
    Average,
}

impl From<PriceModeArg> for PriceMode {
    fn from(arg: PriceModeArg) -> Self {
        match arg {
            PriceModeArg::Close => PriceMode::Close,
            PriceModeArg::Average => PriceMode::Average,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Run {
            quotes,
            config,
            interval_ms,
            price_mode,
            iterations,
            seed,
            output_dir,
        } => run_cmd(
            quotes,
            config,
            RunOverrides {
                interval_ms,
                price_mode,
                iterations,
                seed,
            },
            output_dir,
        ),
        Commands::Bars {
            quotes,
            interval_ms,
            output,
        } => bars_cmd(quotes, interval_ms, output),
    }
}

/// Command-line values that take precedence over the config file.
struct RunOverrides {
    interval_ms: Option<i64>,
    price_mode: Option<PriceModeArg>,
    iterations: Option<u32>,
    seed: Option<u64>,
}

impl RunOverrides {
    fn apply(self, config: &mut RunConfig) {
        if let Some(ms) = self.interval_ms {
            config.aggregation.interval_ms = ms;
        }
        if let Some(mode) = self.price_mode {
            config.simulation.price_mode = mode.into();
        }
        if let Some(n) = self.iterations {
            config.strategies.iterations = n;
        }
        if let Some(seed) = self.seed {
            config.strategies.master_seed = seed;
        }
    }
}

fn run_cmd(
    quotes: PathBuf,
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => RunConfig::load(&path)?,
        None => RunConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;

    let report = run_from_csv(&config, &quotes)?;
    print_summary(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn bars_cmd(quotes: PathBuf, interval_ms: i64, output: Option<PathBuf>) -> Result<()> {
    let mut config = RunConfig::default();
    config.aggregation.interval_ms = interval_ms;
    let interval = config.interval()?;

    let loaded = load_quotes_csv(&quotes)?;
    let aggregation =
        aggregate_quotes_with(loaded.quotes, interval, config.aggregation.on_malformed)?;
    if aggregation.bars.is_empty() {
        bail!("no valid quotes in {}", quotes.display());
    }

    let csv = export_bars_csv(&aggregation.bars)?;
    match output {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(bars = aggregation.bars.len(), path = %path.display(), "wrote bars");
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("=== CandleLab Run ===");
    println!("Run id:         {}", report.run_id);
    println!(
        "Interval:       {} ms ({:?} prices)",
        report.config.aggregation.interval_ms, report.config.simulation.price_mode
    );
    println!("Quotes:         {}", report.quote_count);
    println!("Bars:           {}", report.bars.len());
    let skipped = report.unparsable_rows.len() + report.malformed_quotes.len();
    if skipped > 0 {
        println!("Skipped quotes: {skipped}");
    }

    for (i, outcome) in report.iterations.iter().enumerate() {
        println!();
        if report.iterations.len() > 1 {
            println!("--- Iteration {} ---", i + 1);
        }
        print!("{}", outcome.results);
        for (name, err) in &outcome.failures {
            println!("FAILED {name}: {err}");
        }
    }

    println!();
    println!(
        "NOTE: '{}' reads future closes; it is a lookahead benchmark, not a tradable strategy.",
        report.config.strategies.perfect_foresight_name
    );
    println!();
}
