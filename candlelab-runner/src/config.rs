//! Serializable run configuration.
//!
//! A [`RunConfig`] captures everything needed to reproduce a batch: bar
//! interval, malformed-quote policy, price mode, and the strategy line-up
//! with its master seed. Configs are read from TOML; any section may be
//! omitted and falls back to its default.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use candlelab_core::data::{BarInterval, MalformedPolicy};
use candlelab_core::engine::PriceMode;
use candlelab_core::rng::RngHierarchy;
use candlelab_core::strategy::{ActionSource, PerfectForesight, RandomBounded, DEFAULT_UNIT_SIZE};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Default bar length: one minute.
pub const DEFAULT_INTERVAL_MS: i64 = 60_000;

/// Default master seed for the random strategy hierarchy.
pub const DEFAULT_MASTER_SEED: u64 = 42;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("interval_ms must be positive, got {0}")]
    InvalidInterval(i64),

    #[error("random strategy '{name}': low ({low}) must be below high ({high})")]
    InvalidBounds { name: String, low: i64, high: i64 },

    #[error("strategy name '{0}' is used more than once")]
    DuplicateStrategy(String),

    #[error("perfect_foresight_unit must be finite, got {0}")]
    InvalidUnitSize(f64),

    #[error("iterations must be at least 1")]
    ZeroIterations,
}

/// Top-level configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub aggregation: AggregationConfig,
    pub simulation: SimulationConfig,
    pub strategies: StrategiesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// Bar length in milliseconds.
    pub interval_ms: i64,
    pub on_malformed: MalformedPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub price_mode: PriceMode,
}

/// Strategy line-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategiesConfig {
    pub perfect_foresight_name: String,
    pub perfect_foresight_unit: f64,
    pub master_seed: u64,
    /// Number of times the batch is repeated with fresh random seeds.
    pub iterations: u32,
    pub random: Vec<RandomStrategyConfig>,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            perfect_foresight_name: "Perfect Strategy".to_string(),
            perfect_foresight_unit: DEFAULT_UNIT_SIZE,
            master_seed: DEFAULT_MASTER_SEED,
            iterations: 1,
            random: vec![
                RandomStrategyConfig {
                    name: "Strategy 1".to_string(),
                    low: -10_000,
                    high: 10_000,
                },
                RandomStrategyConfig {
                    name: "Strategy 2".to_string(),
                    low: -5_000,
                    high: 5_000,
                },
            ],
        }
    }
}

/// A uniform random integer strategy over `[low, high)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomStrategyConfig {
    pub name: String,
    pub low: i64,
    pub high: i64,
}

impl RunConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every field a run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interval()?;

        let strategies = &self.strategies;
        if !strategies.perfect_foresight_unit.is_finite() {
            return Err(ConfigError::InvalidUnitSize(
                strategies.perfect_foresight_unit,
            ));
        }
        if strategies.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        let mut seen = HashSet::new();
        seen.insert(strategies.perfect_foresight_name.as_str());
        for random in &strategies.random {
            if random.low >= random.high {
                return Err(ConfigError::InvalidBounds {
                    name: random.name.clone(),
                    low: random.low,
                    high: random.high,
                });
            }
            if !seen.insert(random.name.as_str()) {
                return Err(ConfigError::DuplicateStrategy(random.name.clone()));
            }
        }
        Ok(())
    }

    /// The configured bar interval.
    pub fn interval(&self) -> Result<BarInterval, ConfigError> {
        BarInterval::from_millis(self.aggregation.interval_ms)
            .map_err(|_| ConfigError::InvalidInterval(self.aggregation.interval_ms))
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs over the same quotes produce
    /// identical results, so the ID names a reproducible run.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }

    /// Instantiate the strategy line-up for one iteration.
    ///
    /// Random strategies are seeded from the master seed, their name, and
    /// the iteration index, so adding or reordering strategies never changes
    /// another strategy's actions. Perfect foresight is the same every time.
    pub fn build_sources(&self, iteration: u64) -> Vec<Box<dyn ActionSource>> {
        let strategies = &self.strategies;
        let rng = RngHierarchy::new(strategies.master_seed);

        let mut sources: Vec<Box<dyn ActionSource>> = strategies
            .random
            .iter()
            .map(|r| {
                let seed = rng.sub_seed(&r.name, iteration);
                Box::new(RandomBounded::new(r.name.clone(), r.low, r.high, seed))
                    as Box<dyn ActionSource>
            })
            .collect();
        sources.push(Box::new(PerfectForesight::new(
            strategies.perfect_foresight_name.clone(),
            strategies.perfect_foresight_unit,
        )));
        sources
    }
}
