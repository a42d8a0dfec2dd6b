//! Action sources — map a bar sequence to one strategy's trade sizes.
//!
//! Every source receives the full, read-only bar history and returns one
//! signed quantity per bar. Sources never see portfolio state; replaying the
//! actions against the bars is the simulator's job.

pub mod fixed;
pub mod perfect_foresight;
pub mod random_bounded;

pub use fixed::FixedActions;
pub use perfect_foresight::{PerfectForesight, DEFAULT_UNIT_SIZE};
pub use random_bounded::RandomBounded;

use thiserror::Error;

use crate::domain::{ActionSeries, Bar};

/// Errors from validating a generated action series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("strategy '{strategy}' produced {actions} actions for {bars} bars")]
    LengthMismatch {
        strategy: String,
        actions: usize,
        bars: usize,
    },
}

/// Trait for strategy action generators.
///
/// Implementations must return exactly one action per bar. The batch runner
/// calls [`generate_checked`] so a misbehaving source fails only its own row.
pub trait ActionSource: Send + Sync {
    /// Strategy name, unique within a run (e.g., "Perfect Strategy").
    fn name(&self) -> &str;

    /// Produce one signed trade size per bar.
    fn generate(&self, bars: &[Bar]) -> ActionSeries;
}

/// Run `source` and verify the result is aligned with `bars`.
pub fn generate_checked(
    source: &dyn ActionSource,
    bars: &[Bar],
) -> Result<ActionSeries, SourceError> {
    let actions = source.generate(bars);
    check_alignment(source.name(), &actions, bars.len())?;
    Ok(actions)
}

/// Verify an action series has exactly one entry per bar.
pub fn check_alignment(
    strategy: &str,
    actions: &ActionSeries,
    bar_count: usize,
) -> Result<(), SourceError> {
    if actions.len() != bar_count {
        return Err(SourceError::LengthMismatch {
            strategy: strategy.to_string(),
            actions: actions.len(),
            bars: bar_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortBy(usize);

    impl ActionSource for ShortBy {
        fn name(&self) -> &str {
            "short"
        }

        fn generate(&self, bars: &[Bar]) -> ActionSeries {
            ActionSeries::zeros(bars.len().saturating_sub(self.0))
        }
    }

    fn bars(n: usize) -> Vec<Bar> {
        let start = chrono::DateTime::<chrono::Utc>::from_timestamp_micros(0).unwrap();
        (0..n)
            .map(|i| Bar {
                period_start: start + chrono::Duration::seconds(i as i64),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn aligned_series_passes() {
        let bars = bars(3);
        let actions = generate_checked(&ShortBy(0), &bars).unwrap();
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn short_series_is_length_mismatch() {
        let bars = bars(3);
        let err = generate_checked(&ShortBy(1), &bars).unwrap_err();
        assert_eq!(
            err,
            SourceError::LengthMismatch {
                strategy: "short".into(),
                actions: 2,
                bars: 3,
            }
        );
    }

    #[test]
    fn trait_object_is_usable() {
        let sources: Vec<Box<dyn ActionSource>> = vec![
            Box::new(PerfectForesight::new("Perfect Strategy", 1.0)),
            Box::new(RandomBounded::new("Strategy 1", -5, 5, 7)),
        ];
        let bars = bars(4);
        for source in &sources {
            assert!(generate_checked(source.as_ref(), &bars).is_ok());
        }
    }
}
