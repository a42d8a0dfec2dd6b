//! Quote — a single top-of-book bid observation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A quote record as it arrives from the ingestion layer.
///
/// The timestamp is in microseconds since the Unix epoch, matching the
/// `local_timestamp` column of recorded BBO files. Nothing is validated yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub local_timestamp: i64,
    pub bid_price: f64,
    pub bid_amount: f64,
}

/// A validated quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub timestamp: DateTime<Utc>,
    pub bid_price: f64,
    pub bid_amount: f64,
}

/// Why a quote record was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum MalformedQuote {
    #[error("timestamp {0}us is outside the representable range")]
    TimestampOutOfRange(i64),

    #[error("bid price {0} is not finite")]
    NonFinitePrice(f64),

    #[error("bid amount {0} is not a finite, non-negative size")]
    InvalidAmount(f64),

    #[error("unparsable record: {0}")]
    Unparsable(String),
}

impl TryFrom<RawQuote> for Quote {
    type Error = MalformedQuote;

    fn try_from(raw: RawQuote) -> Result<Self, Self::Error> {
        let timestamp = DateTime::<Utc>::from_timestamp_micros(raw.local_timestamp)
            .ok_or(MalformedQuote::TimestampOutOfRange(raw.local_timestamp))?;
        if !raw.bid_price.is_finite() {
            return Err(MalformedQuote::NonFinitePrice(raw.bid_price));
        }
        if !raw.bid_amount.is_finite() || raw.bid_amount < 0.0 {
            return Err(MalformedQuote::InvalidAmount(raw.bid_amount));
        }
        Ok(Self {
            timestamp,
            bid_price: raw.bid_price,
            bid_amount: raw.bid_amount,
        })
    }
}
