//! Perfect-foresight benchmark — trades on the *next* bar's close.
//!
//! This source looks one bar into the future, so it is not a realizable
//! strategy. It exists as an upper bound to compare real strategies against,
//! and any report that includes it should say so.

use crate::domain::{ActionSeries, Bar};

use super::ActionSource;

/// Reference trade size of the benchmark.
pub const DEFAULT_UNIT_SIZE: f64 = 1000.0;

/// Buys `unit` when the next close is higher, sells `unit` when it is lower.
///
/// The final bar always gets `0`: there is no next close to look at.
#[derive(Debug, Clone)]
pub struct PerfectForesight {
    name: String,
    unit: f64,
}

impl PerfectForesight {
    pub fn new(name: impl Into<String>, unit: f64) -> Self {
        Self {
            name: name.into(),
            unit,
        }
    }

    pub fn unit(&self) -> f64 {
        self.unit
    }
}

impl Default for PerfectForesight {
    fn default() -> Self {
        Self::new("Perfect Strategy", DEFAULT_UNIT_SIZE)
    }
}

impl ActionSource for PerfectForesight {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, bars: &[Bar]) -> ActionSeries {
        let mut actions: Vec<f64> = bars
            .windows(2)
            .map(|w| {
                if w[1].close > w[0].close {
                    self.unit
                } else if w[1].close < w[0].close {
                    -self.unit
                } else {
                    0.0
                }
            })
            .collect();
        if !bars.is_empty() {
            actions.push(0.0);
        }
        ActionSeries::new(actions)
    }
}
