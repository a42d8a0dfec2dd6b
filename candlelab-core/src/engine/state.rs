//! Simulation configuration, mutable state, and trace types.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Which price a bar trades and marks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    /// Trade at the bar close.
    #[default]
    Close,
    /// Trade at the range midpoint, `(high + low) / 2`.
    Average,
}

impl PriceMode {
    pub fn reference_price(&self, bar: &Bar) -> f64 {
        match self {
            PriceMode::Close => bar.close,
            PriceMode::Average => bar.average_price(),
        }
    }
}

/// Portfolio state after one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub cash: f64,
    pub position: f64,
    pub portfolio_value: f64,
}

/// Complete record of one strategy's replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrace {
    /// One point per bar.
    pub points: Vec<TracePoint>,
    /// Lengths of closed holding periods, in bars with a nonzero action.
    pub holding_periods: Vec<usize>,
    pub position_flips: usize,
    /// Sum of `|action| * price` over all trades.
    pub traded_volume: f64,
    /// True if a holding period was still open after the last bar
    /// (its length is the last entry of `holding_periods`).
    pub open_at_end: bool,
}

impl SimulationTrace {
    /// Portfolio value series, one entry per bar.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.portfolio_value).collect()
    }

    /// Final portfolio value, or 0.0 for an empty trace.
    pub fn final_value(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.portfolio_value)
    }

    pub fn bar_count(&self) -> usize {
        self.points.len()
    }
}

/// Mutable state that evolves bar-by-bar during a replay.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    pub cash: f64,
    pub position: f64,
    pub traded_volume: f64,
    /// Length of the holding period currently open (0 = none open).
    pub current_holding: usize,
    pub holding_periods: Vec<usize>,
    pub position_flips: usize,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a nonzero trade at `price`.
    ///
    /// A flip is detected by comparing the sign of the incoming action with the
    /// sign of the position it produces, and only while a holding period is
    /// open. Reducing a long to exactly zero therefore counts as a flip, while a
    /// reversal on the very first trade does not.
    pub fn apply_trade(&mut self, action: f64, price: f64) {
        self.cash -= action * price;
        self.position += action;
        self.traded_volume += action.abs() * price;

        if self.current_holding > 0 && sign(action) != sign(self.position) {
            self.position_flips += 1;
            self.holding_periods.push(self.current_holding);
            self.current_holding = 0;
        }
        self.current_holding += 1;
    }

    /// Mark the portfolio at `price`.
    pub fn mark(&self, price: f64) -> TracePoint {
        TracePoint {
            cash: self.cash,
            position: self.position,
            portfolio_value: self.cash + self.position * price,
        }
    }

    /// Close any open holding period (without counting a flip) and build the trace.
    pub fn finish(mut self, points: Vec<TracePoint>) -> SimulationTrace {
        let open_at_end = self.current_holding > 0;
        if open_at_end {
            self.holding_periods.push(self.current_holding);
        }
        SimulationTrace {
            points,
            holding_periods: self.holding_periods,
            position_flips: self.position_flips,
            traded_volume: self.traded_volume,
            open_at_end,
        }
    }
}

/// Three-valued sign: -1, 0, or +1. NaN maps to NaN, which compares unequal
/// to everything, so a NaN action or position always registers as a sign change.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else if x == 0.0 {
        0.0
    } else {
        f64::NAN
    }
}
