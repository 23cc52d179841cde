//! The customization surface
//!
//! An [`ArbitraryBuilder`] pairs a property tree with an append-only directive
//! log. Every customization method consumes the builder and returns it with one
//! more directive; nothing is resolved until `sample()`, which recomputes the plan
//! from the whole log.
//!
//! Builders are cheap to clone. Clones share the tree, the registry and the
//! fixture's stream counter, but each has its own log, so customizing a clone
//! never affects the original. A clone of a fixed builder shares its snapshot
//! only until one of them gets a new directive before the snapshot is captured.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;

use crate::config::{GenerationConfig, SizeRange};
use crate::directive::{Directive, DirectiveKind, DirectiveLog, InnerSpec, Predicate, ValueSource};
use crate::error::{GenerationError, GenerationResult};
use crate::path::PathExpression;
use crate::resolver::{ResolvedPlan, Resolver};
use crate::sampler::Sampler;
use crate::snapshot::FixedSnapshot;
use crate::source::{RandomnessSource, SeededSource};
use crate::strategy::StrategyRegistry;
use crate::tree::PropertyTree;
use crate::value::Value;

#[derive(Clone)]
struct FixedState {
    sequence: u64,
    snapshot: Arc<OnceCell<FixedSnapshot>>,
}

/// Chainable builder producing values of one root type
#[derive(Clone)]
pub struct ArbitraryBuilder {
    tree: Arc<PropertyTree>,
    registry: Arc<StrategyRegistry>,
    config: Arc<GenerationConfig>,
    log: DirectiveLog,
    fixed: Option<FixedState>,
    error: Option<GenerationError>,
    streams: Arc<AtomicU64>,
}

impl ArbitraryBuilder {
    pub fn new(
        tree: Arc<PropertyTree>,
        registry: Arc<StrategyRegistry>,
        config: Arc<GenerationConfig>,
        streams: Arc<AtomicU64>,
    ) -> Self {
        Self {
            tree,
            registry,
            config,
            log: DirectiveLog::new(),
            fixed: None,
            error: None,
            streams,
        }
    }

    pub fn tree(&self) -> &PropertyTree {
        &self.tree
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn log(&self) -> &DirectiveLog {
        &self.log
    }

    /// The captured snapshot, once a fixed builder has sampled
    pub fn snapshot(&self) -> Option<&FixedSnapshot> {
        self.fixed.as_ref()?.snapshot.get()
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }

    /// An uncaptured snapshot cell must only be filled by builders with this log
    fn detach_snapshot(&mut self) {
        if let Some(fixed) = &mut self.fixed {
            if fixed.snapshot.get().is_none() {
                fixed.snapshot = Arc::new(OnceCell::new());
            }
        }
    }

    fn directive(mut self, path: &str, kind: DirectiveKind) -> Self {
        self.detach_snapshot();
        match PathExpression::parse(path) {
            Ok(path) => {
                if log::log_enabled!(log::Level::Trace) {
                    let earlier = self.log.conflicting(&path).count();
                    log::trace!("Directive at `{}` overlaps {} earlier rules", path, earlier);
                }
                self.log.push(Directive::new(path, kind));
            }
            Err(err) => {
                log::debug!("Ignoring directive with malformed path: {}", err);
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Set the value at `path`
    ///
    /// Structured values (objects, containers) are spread over their descendants,
    /// so later directives on a part of the value still apply.
    pub fn set(self, path: &str, value: impl Into<ValueSource>) -> Self {
        self.directive(path, DirectiveKind::SetValue(value.into()))
    }

    pub fn set_null(self, path: &str) -> Self {
        self.set(path, ValueSource::null())
    }

    /// Forbid null at `path` without fixing its value
    pub fn set_not_null(self, path: &str) -> Self {
        self.set(path, ValueSource::NotNull)
    }

    /// Set `path` to whatever `supplier` returns when the node is sampled
    pub fn set_lazy<F, V>(self, path: &str, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.set(path, ValueSource::lazy(supplier))
    }

    pub fn size(self, path: &str, size: usize) -> Self {
        self.directive(path, DirectiveKind::SetSize(SizeRange::exact(size)))
    }

    pub fn size_between(self, path: &str, min: usize, max: usize) -> Self {
        self.directive(path, DirectiveKind::SetSize(SizeRange::new(min, max)))
    }

    pub fn min_size(self, path: &str, min: usize) -> Self {
        let range = SizeRange::at_least(min, SizeRange::default_spread());
        self.directive(path, DirectiveKind::SetSize(range))
    }

    pub fn max_size(self, path: &str, max: usize) -> Self {
        let range = SizeRange::at_most(max, SizeRange::default_spread());
        self.directive(path, DirectiveKind::SetSize(range))
    }

    /// Append a nested spec rooted at the builder's root
    pub fn set_inner(mut self, spec: InnerSpec) -> Self {
        self.detach_snapshot();
        let (directives, error) = spec.into_directives();
        if let Some(err) = error {
            log::debug!("Nested spec carried a malformed path: {}", err);
            self.error.get_or_insert(err);
        }
        self.log.push(Directive::new(PathExpression::root(), DirectiveKind::Nested(directives)));
        self
    }

    pub fn set_post_condition<F>(self, path: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(predicate);
        self.directive(path, DirectiveKind::PostCondition(predicate))
    }

    /// Freeze the next sample
    ///
    /// Every later sample reproduces it, except where directives appended after
    /// this call say otherwise.
    pub fn fixed(mut self) -> Self {
        let sequence = self.log.reserve();
        self.fixed = Some(FixedState {
            sequence,
            snapshot: Arc::new(OnceCell::new()),
        });
        self
    }

    /// Resolve the current log (and snapshot, if captured) into a plan
    pub fn plan(&self) -> GenerationResult<ResolvedPlan> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let mut rules = self.log.rules().to_vec();
        if let Some(snapshot) = self.snapshot() {
            rules.push(snapshot.rule());
        }
        Resolver::new(&self.tree, &self.registry, &self.config).resolve(&rules)
    }

    /// Draw one value from this builder's own substream of the fixture seed
    pub fn sample(&self) -> GenerationResult<Value> {
        let stream = self.streams.fetch_add(1, Ordering::Relaxed);
        let mut source = SeededSource::substream(&self.config, stream);
        self.sample_with(&mut source)
    }

    pub fn sample_with(&self, source: &mut dyn RandomnessSource) -> GenerationResult<Value> {
        if let Some(fixed) = &self.fixed {
            let mut captured = None;
            fixed.snapshot.get_or_try_init(|| {
                let value = self.draw(source)?;
                log::debug!("Captured fixed snapshot of {} at #{}", self.tree.root_type().name, fixed.sequence);
                captured = Some(value.clone());
                Ok::<_, GenerationError>(FixedSnapshot::new(fixed.sequence, value))
            })?;
            if let Some(value) = captured {
                return Ok(value);
            }
        }
        self.draw(source)
    }

    fn draw(&self, source: &mut dyn RandomnessSource) -> GenerationResult<Value> {
        let plan = self.plan()?;
        Sampler::new(&self.tree, &self.registry, &self.config, source).sample(&plan)
    }

    pub fn sample_list(&self, count: usize) -> GenerationResult<Vec<Value>> {
        (0..count).map(|_| self.sample()).collect()
    }

    /// Sample and convert into a Rust type through serde
    pub fn sample_as<T: DeserializeOwned>(&self) -> GenerationResult<T> {
        let value = self.sample()?;
        Ok(serde_json::from_value(value.to_json()?)?)
    }
}

impl fmt::Debug for ArbitraryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbitraryBuilder")
            .field("root", &self.tree.root_type().name)
            .field("rules", &self.log.len())
            .field("fixed", &self.fixed.as_ref().map(|state| state.sequence))
            .field("error", &self.error)
            .finish()
    }
}
