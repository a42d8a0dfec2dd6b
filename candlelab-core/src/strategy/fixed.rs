//! Precomputed actions supplied from outside the engine.

use crate::domain::{ActionSeries, Bar};

use super::ActionSource;

/// Replays an externally produced action series unchanged.
///
/// The series is not resized to fit the bars; a length that disagrees with the
/// bar count surfaces as a length mismatch when the batch validates it.
#[derive(Debug, Clone)]
pub struct FixedActions {
    name: String,
    actions: ActionSeries,
}

impl FixedActions {
    pub fn new(name: impl Into<String>, actions: impl Into<ActionSeries>) -> Self {
        Self {
            name: name.into(),
            actions: actions.into(),
        }
    }
}

impl ActionSource for FixedActions {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, _bars: &[Bar]) -> ActionSeries {
        self.actions.clone()
    }
}
