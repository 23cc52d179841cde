//! Fixtures: the entry point
//!
//! A [`Fixture`] owns the generation config and the strategy registry and hands
//! out [`ArbitraryBuilder`]s. All builders of one fixture draw their samples from
//! numbered substreams of the fixture's seed, so a fixture with a fixed seed
//! produces the same sequence of values on every run.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::builder::ArbitraryBuilder;
use crate::config::{GenerationConfig, SizeRange};
use crate::descriptor::{descriptor_of, Describe, TypeDescriptor};
use crate::error::GenerationResult;
use crate::strategy::{ConstructionStrategy, StrategyRegistry};
use crate::tree::PropertyTreeBuilder;

#[derive(Debug, Clone)]
pub struct Fixture {
    config: Arc<GenerationConfig>,
    registry: Arc<StrategyRegistry>,
    streams: Arc<AtomicU64>,
}

impl Fixture {
    pub fn new() -> Self {
        FixtureBuilder::default().build()
    }

    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Builder for an explicitly described type
    ///
    /// Fails with `UnsupportedType` if any type reachable from `root` has no
    /// construction strategy.
    pub fn builder_for(&self, root: impl Into<Arc<TypeDescriptor>>) -> GenerationResult<ArbitraryBuilder> {
        let root = root.into();
        log::debug!("Building property tree for {}", root.name);
        let tree = PropertyTreeBuilder::new(&self.registry, &self.config).build(root)?;
        Ok(ArbitraryBuilder::new(
            Arc::new(tree),
            Arc::clone(&self.registry),
            Arc::clone(&self.config),
            Arc::clone(&self.streams),
        ))
    }

    pub fn give_me_builder<T: Describe>(&self) -> GenerationResult<ArbitraryBuilder> {
        self.builder_for(descriptor_of::<T>())
    }

    pub fn give_me_one<T: Describe + DeserializeOwned>(&self) -> GenerationResult<T> {
        self.give_me_builder::<T>()?.sample_as()
    }

    pub fn give_me<T: Describe + DeserializeOwned>(&self, count: usize) -> GenerationResult<Vec<T>> {
        let builder = self.give_me_builder::<T>()?;
        (0..count).map(|_| builder.sample_as()).collect()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent configuration for a [`Fixture`]
#[derive(Debug, Default)]
pub struct FixtureBuilder {
    config: GenerationConfig,
    registry: StrategyRegistry,
}

impl FixtureBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn default_not_null(mut self, not_null: bool) -> Self {
        self.config.default_not_null = not_null;
        self
    }

    pub fn default_container_size(mut self, min: usize, max: usize) -> Self {
        self.config.default_container_size = SizeRange::new(min, max);
        self
    }

    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.config.max_recursion_depth = depth;
        self
    }

    pub fn max_tree_depth(mut self, depth: usize) -> Self {
        self.config.max_tree_depth = depth;
        self
    }

    pub fn null_inject(mut self, probability: f64) -> Self {
        self.config.null_inject = probability.clamp(0.0, 1.0);
        self
    }

    pub fn string_length(mut self, min: usize, max: usize) -> Self {
        self.config.string_length = SizeRange::new(min, max);
        self
    }

    pub fn edge_case_probability(mut self, probability: f64) -> Self {
        self.config.edge_case_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn max_unique_key_attempts(mut self, attempts: u32) -> Self {
        self.config.max_unique_key_attempts = attempts;
        self
    }

    pub fn max_post_condition_attempts(mut self, attempts: u32) -> Self {
        self.config.max_post_condition_attempts = attempts;
        self
    }

    /// Replace the whole config, e.g. one loaded with `GenerationConfig::from_json`
    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a strategy ahead of the built-ins and earlier registrations
    pub fn register<S: ConstructionStrategy + 'static>(mut self, strategy: S) -> Self {
        self.registry.register(Arc::new(strategy));
        self
    }

    pub fn build(self) -> Fixture {
        Fixture {
            config: Arc::new(self.config),
            registry: Arc::new(self.registry),
            streams: Arc::new(AtomicU64::new(0)),
        }
    }
}
