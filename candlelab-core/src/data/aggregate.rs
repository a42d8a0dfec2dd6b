//! Bar aggregation — resamples a raw quote stream into fixed-interval OHLCV bars.
//!
//! Intervals are aligned to the Unix epoch: a quote at `t` belongs to the
//! interval starting at `floor(t / interval) * interval`. Quotes are stably
//! sorted by timestamp before grouping, so arrival order only matters for
//! quotes sharing the exact same timestamp. Intervals without quotes produce
//! no bar; nothing is forward-filled.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{Bar, MalformedQuote, Quote, RawQuote};

/// Errors from bar aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("aggregation interval must be a positive number of milliseconds, got {0}")]
    InvalidInterval(i64),

    #[error("malformed quote at record {index}: {reason}")]
    MalformedQuote {
        index: usize,
        reason: MalformedQuote,
    },
}

/// What to do with a quote record that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Drop the record, log a warning, and report it in [`Aggregation::skipped`].
    #[default]
    Skip,
    /// Abort aggregation with [`AggregateError::MalformedQuote`].
    Reject,
}

/// Strictly positive bar length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarInterval {
    micros: i64,
}

impl BarInterval {
    pub fn from_millis(millis: i64) -> Result<Self, AggregateError> {
        if millis <= 0 {
            return Err(AggregateError::InvalidInterval(millis));
        }
        let micros = millis
            .checked_mul(1_000)
            .ok_or(AggregateError::InvalidInterval(millis))?;
        Ok(Self { micros })
    }

    pub fn as_millis(&self) -> i64 {
        self.micros / 1_000
    }

    pub fn as_micros(&self) -> i64 {
        self.micros
    }

    /// Start of the epoch-aligned interval containing `timestamp`.
    ///
    /// `None` when the start falls outside chrono's representable range.
    pub fn period_start(&self, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let micros = timestamp.timestamp_micros();
        let start = micros.div_euclid(self.micros).checked_mul(self.micros)?;
        DateTime::<Utc>::from_timestamp_micros(start)
    }
}

/// A quote record that was dropped during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedQuote {
    /// Position of the record in the input stream.
    pub index: usize,
    pub reason: MalformedQuote,
}

/// Output of [`aggregate_quotes`].
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// One bar per non-empty interval, in time order.
    pub bars: Vec<Bar>,
    pub skipped: Vec<SkippedQuote>,
    /// Number of quotes folded into bars.
    pub quote_count: usize,
}

/// Aggregate quotes into bars with the default [`MalformedPolicy::Skip`].
pub fn aggregate_quotes<I>(quotes: I, interval: BarInterval) -> Aggregation
where
    I: IntoIterator<Item = RawQuote>,
{
    let mut skipped = Vec::new();
    let valid = match validate(quotes, interval, |index, reason| {
        warn!(index, %reason, "skipping malformed quote");
        skipped.push(SkippedQuote { index, reason });
        Ok::<(), Infallible>(())
    }) {
        Ok(valid) => valid,
        Err(never) => match never {},
    };

    let quote_count = valid.len();
    Aggregation {
        bars: build_bars(valid),
        skipped,
        quote_count,
    }
}

/// Aggregate quotes into bars, applying `policy` to malformed records.
pub fn aggregate_quotes_with<I>(
    quotes: I,
    interval: BarInterval,
    policy: MalformedPolicy,
) -> Result<Aggregation, AggregateError>
where
    I: IntoIterator<Item = RawQuote>,
{
    match policy {
        MalformedPolicy::Skip => Ok(aggregate_quotes(quotes, interval)),
        MalformedPolicy::Reject => {
            let valid = validate(quotes, interval, |index, reason| {
                Err(AggregateError::MalformedQuote { index, reason })
            })?;
            let quote_count = valid.len();
            Ok(Aggregation {
                bars: build_bars(valid),
                skipped: Vec::new(),
                quote_count,
            })
        }
    }
}

/// Validate every record and tag it with its interval start.
fn validate<I, F, E>(
    quotes: I,
    interval: BarInterval,
    mut on_malformed: F,
) -> Result<Vec<(DateTime<Utc>, Quote)>, E>
where
    I: IntoIterator<Item = RawQuote>,
    F: FnMut(usize, MalformedQuote) -> Result<(), E>,
{
    let quotes = quotes.into_iter();
    let mut valid = Vec::with_capacity(quotes.size_hint().0);

    for (index, raw) in quotes.enumerate() {
        let tagged = Quote::try_from(raw).and_then(|quote| {
            interval
                .period_start(quote.timestamp)
                .map(|start| (start, quote))
                .ok_or(MalformedQuote::TimestampOutOfRange(raw.local_timestamp))
        });
        match tagged {
            Ok(pair) => valid.push(pair),
            Err(reason) => on_malformed(index, reason)?,
        }
    }
    Ok(valid)
}

fn build_bars(mut quotes: Vec<(DateTime<Utc>, Quote)>) -> Vec<Bar> {
    // Stable: equal timestamps keep input order.
    quotes.sort_by_key(|(_, quote)| quote.timestamp);

    let mut bars: Vec<Bar> = Vec::new();
    for (start, quote) in &quotes {
        match bars.last_mut() {
            Some(bar) if bar.period_start == *start => bar.absorb(quote),
            _ => bars.push(Bar::from_quote(*start, quote)),
        }
    }
    bars
}
