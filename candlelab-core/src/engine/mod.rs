//! Backtesting engine — bar-by-bar portfolio replay.
//!
//! The engine consumes aggregated bars and one strategy's action series, then
//! replays the actions in order, tracking cash, position, traded volume,
//! holding periods, and position flips.

pub mod simulator;
pub mod state;

pub use simulator::{simulate, SimulationError};
pub use state::{PriceMode, SimulationState, SimulationTrace, TracePoint};
