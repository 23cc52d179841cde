//! Process-wide generation settings
//!
//! `GenerationConfig` plays the same role for a fixture that a runner config plays
//! for a test engine: a plain struct with sensible defaults, cloned into every
//! builder created from the fixture.

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};

/// Inclusive size bounds for containers and strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
}

impl SizeRange {
    /// Create a range, swapping the bounds if they were given backwards
    pub fn new(min: usize, max: usize) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn exact(size: usize) -> Self {
        Self { min: size, max: size }
    }

    /// `minSize(n)`: at least `n`, with the default spread above it
    pub fn at_least(min: usize, spread: usize) -> Self {
        Self { min, max: min.saturating_add(spread) }
    }

    /// `maxSize(n)`: at most `n`, with the default spread below it
    pub fn at_most(max: usize, spread: usize) -> Self {
        Self { min: max.saturating_sub(spread), max }
    }

    /// Spread applied by `min_size` / `max_size` directives
    pub fn default_spread() -> usize {
        let default = Self::default();
        default.max - default.min
    }

    pub fn is_exact(&self) -> bool {
        self.min == self.max
    }

    /// Widen the range so that it admits at least `required` elements
    pub fn accommodate(&self, required: usize) -> Self {
        Self {
            min: self.min.max(required),
            max: self.max.max(required),
        }
    }

    pub fn contains(&self, size: usize) -> bool {
        size >= self.min && size <= self.max
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self { min: 0, max: 3 }
    }
}

/// Configuration shared by every builder of a fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Master seed; each sample draws from its own substream of it
    pub seed: u64,

    /// Container size bounds used when no size directive applies
    pub default_container_size: SizeRange,

    /// How many times a type may re-enter itself on one expansion path
    pub max_recursion_depth: usize,

    /// Hard limit on tree depth, regardless of recursion
    pub max_tree_depth: usize,

    /// Probability that a nullable node generates null
    pub null_inject: f64,

    /// Treat every nullable node as non-null
    pub default_not_null: bool,

    /// Retry ceiling for unique map keys and set elements
    pub max_unique_key_attempts: u32,

    /// Retry ceiling for post-conditions
    pub max_post_condition_attempts: u32,

    /// Length bounds for generated strings
    pub string_length: SizeRange,

    /// Probability of drawing a boundary constant instead of a uniform scalar
    pub edge_case_probability: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            default_container_size: SizeRange::default(),
            max_recursion_depth: 1,
            max_tree_depth: 16,
            null_inject: 0.2,
            default_not_null: false,
            max_unique_key_attempts: 100,
            max_post_condition_attempts: 1000,
            string_length: SizeRange::new(0, 10),
            edge_case_probability: 0.05,
        }
    }
}

impl GenerationConfig {
    /// Load a config from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> GenerationResult<Self> {
        let config: GenerationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GenerationResult<()> {
        for (name, p) in [
            ("null_inject", self.null_inject),
            ("edge_case_probability", self.edge_case_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenerationError::Conversion(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, p
                )));
            }
        }
        for (name, range) in [
            ("default_container_size", self.default_container_size),
            ("string_length", self.string_length),
        ] {
            if range.min > range.max {
                return Err(GenerationError::Conversion(format!(
                    "{} has min {} above max {}",
                    name, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}
