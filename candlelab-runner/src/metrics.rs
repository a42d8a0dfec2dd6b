//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: portfolio-value series and/or holding
//! periods in, scalar out. No dependencies on the batch runner or data loading.
//!
//! Degenerate inputs produce NaN rather than an error: a flat series has no
//! defined Sharpe ratio, and a series without losing bars has no defined
//! Sortino ratio. NaN is surfaced as-is in the [`StatisticsRow`].

use serde::Serialize;

use candlelab_core::engine::SimulationTrace;

/// Bars per year used to annualize the Sharpe and Sortino ratios.
pub const ANNUALIZATION_PERIODS: f64 = 252.0;

/// The fixed metric set for one strategy.
///
/// Serializes NaN metrics as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsRow {
    /// Final portfolio value. The simulation starts from zero cash, so this is also the PnL.
    pub pnl: f64,
    pub traded_volume: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub average_holding_time: f64,
    pub position_flips: usize,
}

impl StatisticsRow {
    /// Compute all metrics from a finished simulation.
    pub fn compute(trace: &SimulationTrace) -> Self {
        let values = trace.values();
        let returns = period_returns(&values);
        Self {
            pnl: trace.final_value(),
            traded_volume: trace.traded_volume,
            sharpe_ratio: sharpe_ratio(&returns),
            sortino_ratio: sortino_ratio(&returns),
            max_drawdown: max_drawdown(&values),
            average_holding_time: average_holding_time(&trace.holding_periods),
            position_flips: trace.position_flips,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Simple per-bar returns `(v[i] - v[i-1]) / v[i-1]`.
///
/// NaN values are padded forward with the last valid value before differencing,
/// so a gap contributes a zero return. The first bar has no return, nor does any
/// bar before the first valid value. Results of `0 / 0` are dropped; a move away
/// from a zero value yields ±inf, which is kept.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    let padded: Vec<f64> = values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                last = v;
            }
            last
        })
        .collect();
    padded
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| !r.is_nan())
        .collect()
}

/// Annualized Sharpe ratio: `mean / stdev * sqrt(252)`.
///
/// NaN when the standard deviation is zero or undefined (fewer than two returns).
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let std = std_dev(returns);
    if std == 0.0 {
        return f64::NAN;
    }
    mean_f64(returns) / std * ANNUALIZATION_PERIODS.sqrt()
}

/// Annualized Sortino ratio: `mean(all returns) / stdev(negative returns) * sqrt(252)`.
///
/// The denominator is the sample standard deviation of the negative returns
/// alone. NaN when there are fewer than two of them or they are all equal.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let downside_std = std_dev(&downside);
    if downside_std == 0.0 {
        return f64::NAN;
    }
    mean_f64(returns) / downside_std * ANNUALIZATION_PERIODS.sqrt()
}

/// Largest drop from the running peak, in portfolio-value units.
///
/// The running peak starts at zero, not at the first value. A series that
/// starts and stays negative therefore reports its distance below zero
/// rather than below its own first value. NaN values are ignored.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &value in values {
        peak = peak.max(value);
        max_dd = max_dd.max(peak - value);
    }
    max_dd
}

/// Mean holding period in bars; 0.0 when no position was ever held.
pub fn average_holding_time(holding_periods: &[usize]) -> f64 {
    if holding_periods.is_empty() {
        return 0.0;
    }
    holding_periods.iter().sum::<usize>() as f64 / holding_periods.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Arithmetic mean; NaN for an empty slice.
pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); NaN below two values.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
