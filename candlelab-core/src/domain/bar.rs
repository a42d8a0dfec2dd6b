//! Bar — the fundamental aggregated market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// OHLCV bar for one fixed-length interval.
///
/// Bars are only produced for intervals that contain at least one quote, so
/// consecutive bars are not guaranteed to be evenly spaced in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub period_start: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Open a new bar from the first quote of an interval.
    pub fn from_quote(period_start: DateTime<Utc>, quote: &Quote) -> Self {
        Self {
            period_start,
            open: quote.bid_price,
            high: quote.bid_price,
            low: quote.bid_price,
            close: quote.bid_price,
            volume: quote.bid_amount,
        }
    }

    /// Fold a later quote of the same interval into this bar.
    pub fn absorb(&mut self, quote: &Quote) {
        self.high = self.high.max(quote.bid_price);
        self.low = self.low.min(quote.bid_price);
        self.close = quote.bid_price;
        self.volume += quote.bid_amount;
    }

    /// Midpoint of the bar's range, `(high + low) / 2`.
    pub fn average_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// OHLCV sanity check: `low <= open, close <= high` and `volume >= 0`.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
            && self.volume >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: f64, amount: f64) -> Quote {
        Quote {
            timestamp: DateTime::<Utc>::from_timestamp_micros(0).unwrap(),
            bid_price: price,
            bid_amount: amount,
        }
    }

    fn sample_bar() -> Bar {
        let start = DateTime::<Utc>::from_timestamp_micros(0).unwrap();
        let mut bar = Bar::from_quote(start, &quote(100.0, 10.0));
        bar.absorb(&quote(105.0, 5.0));
        bar.absorb(&quote(98.0, 1.0));
        bar.absorb(&quote(103.0, 4.0));
        bar
    }

    #[test]
    fn absorb_tracks_ohlcv() {
        let bar = sample_bar();
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.high, 105.0);
        assert_eq!(bar.low, 98.0);
        assert_eq!(bar.close, 103.0);
        assert_eq!(bar.volume, 20.0);
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn average_price_is_range_midpoint() {
        assert!((sample_bar().average_price() - 101.5).abs() < 1e-12);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
