//! Quote loading for the runner.
//!
//! Reads top-of-book quote records from CSV. The file must carry a header
//! row naming at least `local_timestamp`, `bid_price`, and `bid_amount`;
//! other columns are ignored and column order is free.
//!
//! A row that cannot be parsed is skipped with a warning and reported as
//! [`MalformedQuote::Unparsable`]. Only a missing file, an unreadable header,
//! or a missing required column fails the whole load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use candlelab_core::data::SkippedQuote;
use candlelab_core::domain::{MalformedQuote, RawQuote};

pub const TIMESTAMP_COLUMN: &str = "local_timestamp";
pub const PRICE_COLUMN: &str = "bid_price";
pub const AMOUNT_COLUMN: &str = "bid_amount";

/// Errors from the quote loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open quotes file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV header: {0}")]
    Header(#[from] csv::Error),

    #[error("quotes file has no '{0}' column")]
    MissingColumn(&'static str),
}

/// Result of loading quotes, including rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadedQuotes {
    /// Parsed records in file order.
    pub quotes: Vec<RawQuote>,
    /// Rows that failed to parse; `index` is the zero-based data row.
    pub skipped: Vec<SkippedQuote>,
}

impl LoadedQuotes {
    /// Total number of data rows seen.
    pub fn row_count(&self) -> usize {
        self.quotes.len() + self.skipped.len()
    }
}

/// Load quotes from a CSV file on disk.
pub fn load_quotes_csv(path: &Path) -> Result<LoadedQuotes, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let loaded = load_quotes_reader(file)?;
    info!(
        path = %path.display(),
        quotes = loaded.quotes.len(),
        skipped = loaded.skipped.len(),
        "loaded quotes"
    );
    Ok(loaded)
}

/// Load quotes from any CSV source.
pub fn load_quotes_reader<R: Read>(reader: R) -> Result<LoadedQuotes, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn(name))
    };
    let ts_col = column(TIMESTAMP_COLUMN)?;
    let price_col = column(PRICE_COLUMN)?;
    let amount_col = column(AMOUNT_COLUMN)?;

    let mut loaded = LoadedQuotes::default();
    for (index, record) in rdr.records().enumerate() {
        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|rec| parse_row(&rec, ts_col, price_col, amount_col));
        match parsed {
            Ok(quote) => loaded.quotes.push(quote),
            Err(detail) => {
                let reason = MalformedQuote::Unparsable(detail);
                warn!(index, %reason, "skipping unparsable quote row");
                loaded.skipped.push(SkippedQuote { index, reason });
            }
        }
    }
    Ok(loaded)
}

fn parse_row(
    record: &csv::StringRecord,
    ts_col: usize,
    price_col: usize,
    amount_col: usize,
) -> Result<RawQuote, String> {
    let field = |col: usize, name: &str| {
        record
            .get(col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing {name}"))
    };

    let ts = field(ts_col, TIMESTAMP_COLUMN)?;
    let local_timestamp = ts
        .parse::<i64>()
        .map_err(|e| format!("{TIMESTAMP_COLUMN} '{ts}': {e}"))?;

    let price = field(price_col, PRICE_COLUMN)?;
    let bid_price = price
        .parse::<f64>()
        .map_err(|e| format!("{PRICE_COLUMN} '{price}': {e}"))?;

    let amount = field(amount_col, AMOUNT_COLUMN)?;
    let bid_amount = amount
        .parse::<f64>()
        .map_err(|e| format!("{AMOUNT_COLUMN} '{amount}': {e}"))?;

    Ok(RawQuote {
        local_timestamp,
        bid_price,
        bid_amount,
    })
}
