//! Results table — strategy name to statistics row.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::metrics::StatisticsRow;

/// Column headers, in display and export order.
pub const COLUMNS: [&str; 8] = [
    "Strategy",
    "PnL",
    "TradedVolume",
    "SharpeRatio",
    "SortinoRatio",
    "MaxDrawdown",
    "AverageHoldingTime",
    "PositionFlips",
];

/// Per-strategy statistics, ordered by strategy name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultsTable {
    rows: BTreeMap<String, StatisticsRow>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, strategy: impl Into<String>, row: StatisticsRow) {
        self.rows.insert(strategy.into(), row);
    }

    pub fn get(&self, strategy: &str) -> Option<&StatisticsRow> {
        self.rows.get(strategy)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatisticsRow)> {
        self.rows.iter().map(|(name, row)| (name.as_str(), row))
    }

    /// One row of display cells per strategy, matching [`COLUMNS`].
    pub fn cells(&self) -> Vec<[String; 8]> {
        self.iter()
            .map(|(name, row)| {
                [
                    name.to_string(),
                    format_metric(row.pnl),
                    format_metric(row.traded_volume),
                    format_metric(row.sharpe_ratio),
                    format_metric(row.sortino_ratio),
                    format_metric(row.max_drawdown),
                    format_metric(row.average_holding_time),
                    row.position_flips.to_string(),
                ]
            })
            .collect()
    }
}

impl FromIterator<(String, StatisticsRow)> for ResultsTable {
    fn from_iter<I: IntoIterator<Item = (String, StatisticsRow)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Fixed-width text rendering: names left-aligned, numbers right-aligned.
impl fmt::Display for ResultsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells();
        let mut widths = COLUMNS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        for (i, header) in COLUMNS.iter().enumerate() {
            if i == 0 {
                write!(f, "{header:<width$}", width = widths[i])?;
            } else {
                write!(f, "  {header:>width$}", width = widths[i])?;
            }
        }
        writeln!(f)?;
        let total = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
        writeln!(f, "{}", "-".repeat(total))?;

        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i == 0 {
                    write!(f, "{cell:<width$}", width = widths[i])?;
                } else {
                    write!(f, "  {cell:>width$}", width = widths[i])?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Four decimals; NaN and infinities spelled out.
pub fn format_metric(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:.4}")
    }
}
