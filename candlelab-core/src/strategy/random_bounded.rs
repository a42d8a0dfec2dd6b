//! Random baseline — independent uniform integer trade sizes per bar.
//!
//! Used only as an illustrative baseline. The seed is explicit so runs are
//! reproducible; batch runs derive it from an [`RngHierarchy`](crate::rng::RngHierarchy).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{ActionSeries, Bar};

use super::ActionSource;

/// Draws each action uniformly from the integers in `[low, high)`.
#[derive(Debug, Clone)]
pub struct RandomBounded {
    name: String,
    low: i64,
    high: i64,
    seed: u64,
}

impl RandomBounded {
    pub fn new(name: impl Into<String>, low: i64, high: i64, seed: u64) -> Self {
        assert!(low < high, "low must be < high");
        Self {
            name: name.into(),
            low,
            high,
            seed,
        }
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.low, self.high)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Same bounds and name, different seed.
    pub fn reseeded(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}

impl ActionSource for RandomBounded {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, bars: &[Bar]) -> ActionSeries {
        let mut rng = StdRng::seed_from_u64(self.seed);
        bars.iter()
            .map(|_| rng.gen_range(self.low..self.high) as f64)
            .collect()
    }
}
