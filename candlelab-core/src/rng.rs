//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(strategy, iteration)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, independently of thread scheduling
//! order, so a batch produces identical action series regardless of thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a specific (strategy, iteration).
    ///
    /// The sub-seed is independent of derivation order: deriving "A" then "B"
    /// gives the same seeds as deriving "B" then "A".
    pub fn sub_seed(&self, strategy: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(strategy.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(word)
    }

    /// Create a seeded StdRng for a (strategy, iteration).
    pub fn rng_for(&self, strategy: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(strategy, iteration))
    }
}
