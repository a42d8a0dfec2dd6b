//! Bar-by-bar portfolio replay — the heart of the backtesting engine.
//!
//! Per bar:
//! 1. Pick the reference price for the configured [`PriceMode`]
//! 2. Apply the bar's action to cash, position, and traded volume
//! 3. Update holding-period and flip tracking
//! 4. Mark the portfolio at the reference price
//!
//! State carries forward from bar to bar, so one replay is strictly sequential.
//! Non-finite inputs are not filtered: NaN or inf in a bar flows into the trace.

use thiserror::Error;

use crate::domain::{ActionSeries, Bar};

use super::state::{PriceMode, SimulationState, SimulationTrace};

/// Errors from the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("action series has {actions} entries but there are {bars} bars")]
    LengthMismatch { actions: usize, bars: usize },
}

/// Replay `actions` against `bars`.
pub fn simulate(
    bars: &[Bar],
    actions: &ActionSeries,
    mode: PriceMode,
) -> Result<SimulationTrace, SimulationError> {
    if actions.len() != bars.len() {
        return Err(SimulationError::LengthMismatch {
            actions: actions.len(),
            bars: bars.len(),
        });
    }

    let mut state = SimulationState::new();
    let mut points = Vec::with_capacity(bars.len());

    for (bar, &action) in bars.iter().zip(actions.iter()) {
        let price = mode.reference_price(bar);
        if action != 0.0 {
            state.apply_trade(action, price);
        }
        points.push(state.mark(price));
    }

    Ok(state.finish(points))
}
