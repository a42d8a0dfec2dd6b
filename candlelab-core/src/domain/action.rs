//! ActionSeries — one strategy's signed trade sizes, aligned to bars by index.

use serde::{Deserialize, Serialize};

/// Signed trade quantities, one per bar.
///
/// A positive entry acquires that many units at the bar's reference price, a
/// negative entry sells (or shorts) them, zero does nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSeries(Vec<f64>);

impl ActionSeries {
    pub fn new(actions: Vec<f64>) -> Self {
        Self(actions)
    }

    /// A series that never trades.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// Number of bars on which the strategy trades.
    pub fn nonzero_count(&self) -> usize {
        self.0.iter().filter(|&&a| a != 0.0).count()
    }
}

impl From<Vec<f64>> for ActionSeries {
    fn from(actions: Vec<f64>) -> Self {
        Self(actions)
    }
}

impl FromIterator<f64> for ActionSeries {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ActionSeries {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
