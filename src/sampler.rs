//! Plan materialization
//!
//! The sampler walks a [`ResolvedPlan`] depth-first, children before parents, and
//! assembles values through the construction strategies. Nodes are always visited
//! in the same order, so the same plan and the same randomness stream produce the
//! same value.

use crate::config::GenerationConfig;
use crate::descriptor::TypeKind;
use crate::error::{GenerationError, GenerationResult};
use crate::path::PathExpression;
use crate::resolver::{EntryPlan, Override, PlanNode, PlanShape, ResolvedPlan};
use crate::source::RandomnessSource;
use crate::strategy::{Children, StrategyRegistry};
use crate::tree::{PropertyNode, PropertyTree};
use crate::value::Value;

pub struct Sampler<'a> {
    tree: &'a PropertyTree,
    registry: &'a StrategyRegistry,
    config: &'a GenerationConfig,
    source: &'a mut dyn RandomnessSource,
}

impl<'a> Sampler<'a> {
    pub fn new(
        tree: &'a PropertyTree,
        registry: &'a StrategyRegistry,
        config: &'a GenerationConfig,
        source: &'a mut dyn RandomnessSource,
    ) -> Self {
        Self {
            tree,
            registry,
            config,
            source,
        }
    }

    pub fn sample(&mut self, plan: &ResolvedPlan) -> GenerationResult<Value> {
        self.sample_node(plan.root())
    }

    /// Draw candidates until every post-condition holds
    fn sample_node(&mut self, plan: &PlanNode) -> GenerationResult<Value> {
        if plan.post_conditions.is_empty() {
            return self.draw(plan);
        }
        let attempts = self.config.max_post_condition_attempts.max(1);
        for attempt in 1..=attempts {
            let candidate = self.draw(plan)?;
            if plan.post_conditions.iter().all(|check| check(&candidate)) {
                return Ok(candidate);
            }
            log::trace!("Post-condition at `{}` rejected attempt {}", plan.path, attempt);
        }
        log::debug!("Giving up on `{}` after {} attempts", plan.path, attempts);
        Err(GenerationError::PostConditionExhausted {
            path: plan.path.to_string(),
            attempts,
        })
    }

    fn draw(&mut self, plan: &PlanNode) -> GenerationResult<Value> {
        match &plan.value {
            Some(Override::Just(value)) => return Ok(value.clone()),
            Some(Override::Lazy(supplier)) => return Ok(supplier()),
            None => {}
        }

        let tree = self.tree;
        let registry = self.registry;
        let node = tree.node(plan.node);
        if node.truncated {
            return self.empty(node);
        }
        if plan.nullable && self.source.next_bool(self.config.null_inject) {
            return Ok(Value::Null);
        }
        if let Some(generated) = registry.generate(&node.ty, &mut *self.source) {
            return generated;
        }

        match &plan.shape {
            PlanShape::Leaf => self.source.next_scalar(&node.ty),
            PlanShape::Object(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    values.push((name.clone(), self.sample_node(field)?));
                }
                registry.construct(&node.ty, Children::Fields(values))
            }
            PlanShape::Wrapper(inner) => {
                let value = self.sample_node(inner)?;
                registry.construct(&node.ty, Children::Single(value))
            }
            PlanShape::Elements { size, slots, fallback } => {
                let count = self.source.next_int(size.min, size.max);
                let slot_plans: Vec<&PlanNode> = (0..count).map(|i| slots.get(&i).unwrap_or(fallback.as_ref())).collect();
                let items = if matches!(node.ty.kind, TypeKind::Set { .. }) {
                    self.unique_elements(&plan.path, &slot_plans)?
                } else {
                    slot_plans
                        .into_iter()
                        .map(|slot| self.sample_node(slot))
                        .collect::<GenerationResult<Vec<_>>>()?
                };
                registry.construct(&node.ty, Children::Elements(items))
            }
            PlanShape::Entries { size, slots, fallback } => {
                let count = self.source.next_int(size.min, size.max);
                let slot_plans: Vec<&EntryPlan> = (0..count).map(|i| slots.get(&i).unwrap_or(fallback.as_ref())).collect();
                let entries = self.entries(&plan.path, &slot_plans)?;
                registry.construct(&node.ty, Children::Entries(entries))
            }
        }
    }

    /// What a truncated node generates
    fn empty(&self, node: &PropertyNode) -> GenerationResult<Value> {
        let children = match node.ty.kind {
            TypeKind::List { .. } | TypeKind::Set { .. } => Children::Elements(Vec::new()),
            TypeKind::Map { .. } => Children::Entries(Vec::new()),
            _ => return Ok(Value::Null),
        };
        self.registry.construct(&node.ty, children)
    }

    /// Set elements: explicit elements are trusted, the rest are drawn distinct
    fn unique_elements(&mut self, path: &PathExpression, slots: &[&PlanNode]) -> GenerationResult<Vec<Value>> {
        let mut items: Vec<Option<Value>> = vec![None; slots.len()];
        for (i, slot) in slots.iter().enumerate() {
            if slot.is_explicit() {
                let value = self.sample_node(slot)?;
                if items.iter().flatten().any(|existing| *existing == value) {
                    log::debug!("Explicit element {:?} at `{}` repeats an earlier one", value, slot.path);
                } else {
                    items[i] = Some(value);
                }
            }
        }
        for (i, slot) in slots.iter().enumerate() {
            if !slot.is_explicit() {
                let value = self.draw_unique(path, slot, &items, false)?;
                items[i] = Some(value);
            }
        }
        Ok(items.into_iter().flatten().collect())
    }

    /// Map entries: explicit keys first, then distinct generated keys, then values
    ///
    /// Explicit keys, lazy ones included, are evaluated once and never retried. A
    /// later slot assigning the same key replaces the earlier entry.
    fn entries(&mut self, path: &PathExpression, slots: &[&EntryPlan]) -> GenerationResult<Vec<(Value, Value)>> {
        let mut keys: Vec<Option<Value>> = vec![None; slots.len()];
        for (i, slot) in slots.iter().enumerate() {
            if slot.key.is_explicit() {
                let key = self.sample_node(&slot.key)?;
                if key.is_null() {
                    return Err(GenerationError::NullMapKey {
                        path: slot.key.path.to_string(),
                    });
                }
                keys[i] = Some(key);
            }
        }
        for (i, slot) in slots.iter().enumerate() {
            if keys[i].is_none() {
                let key = self.draw_unique(path, &slot.key, &keys, true)?;
                keys[i] = Some(key);
            }
        }

        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(slots.len());
        for (slot, key) in slots.iter().zip(keys.into_iter().flatten()) {
            let value = self.sample_node(&slot.value)?;
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => {
                    log::debug!("Explicit key {:?} at `{}` replaces an earlier entry", key, slot.key.path);
                    entry.1 = value;
                }
                None => entries.push((key, value)),
            }
        }
        Ok(entries)
    }

    fn draw_unique(
        &mut self,
        container: &PathExpression,
        plan: &PlanNode,
        taken: &[Option<Value>],
        is_key: bool,
    ) -> GenerationResult<Value> {
        let attempts = self.config.max_unique_key_attempts.max(1);
        for attempt in 1..=attempts {
            let candidate = self.sample_node(plan)?;
            if is_key && candidate.is_null() {
                return Err(GenerationError::NullMapKey {
                    path: plan.path.to_string(),
                });
            }
            if !taken.iter().flatten().any(|existing| *existing == candidate) {
                return Ok(candidate);
            }
            log::trace!("Duplicate at `{}` on attempt {}", plan.path, attempt);
        }
        Err(GenerationError::DuplicateKeyExhausted {
            path: container.to_string(),
            attempts,
        })
    }
}
