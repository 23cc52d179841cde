//! Fixed snapshots
//!
//! `fixed()` freezes the next sample of a builder. The captured value is stored
//! whole and re-enters the resolver as a single root rule at the sequence number
//! reserved when `fixed()` was called. The resolver decomposes it node by node at
//! that sequence, so directives appended after fixing still win where they apply.

use crate::directive::{Action, Rule, ValueSource};
use crate::error::GenerationResult;
use crate::path::{PathExpression, PathSegment};
use crate::strategy::{Children, StrategyRegistry};
use crate::tree::{NodeId, NodeRole, PropertyTree};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FixedSnapshot {
    sequence: u64,
    value: Value,
}

impl FixedSnapshot {
    pub fn new(sequence: u64, value: Value) -> Self {
        Self { sequence, value }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The rule replaying this snapshot
    pub fn rule(&self) -> Rule {
        Rule {
            sequence: self.sequence,
            path: PathExpression::root(),
            action: Action::Set(ValueSource::Just(self.value.clone())),
        }
    }

    /// Concrete path of every leaf in the snapshot with its value
    ///
    /// Nulls, truncated nodes and values a strategy refuses to take apart are
    /// reported as leaves at their own path.
    pub fn entries(&self, tree: &PropertyTree, registry: &StrategyRegistry) -> GenerationResult<Vec<(PathExpression, Value)>> {
        let mut out = Vec::new();
        collect(tree, registry, tree.root(), PathExpression::root(), &self.value, &mut out)?;
        Ok(out)
    }
}

fn collect(
    tree: &PropertyTree,
    registry: &StrategyRegistry,
    id: NodeId,
    path: PathExpression,
    value: &Value,
    out: &mut Vec<(PathExpression, Value)>,
) -> GenerationResult<()> {
    let node = tree.node(id);
    if value.is_null() || node.truncated || node.is_leaf() {
        out.push((path, value.clone()));
        return Ok(());
    }

    match registry.decompose(&node.ty, value)? {
        Children::Leaf(leaf) => out.push((path, leaf)),
        Children::Fields(fields) => {
            for (name, field) in fields {
                if let Some(child) = tree.child(id, &NodeRole::Property(name.clone())) {
                    collect(tree, registry, child, path.property(name), &field, out)?;
                }
            }
        }
        Children::Single(inner) => match tree.child(id, &NodeRole::Wrapped) {
            Some(child) => collect(tree, registry, child, path, &inner, out)?,
            None => out.push((path, inner)),
        },
        Children::Elements(items) => {
            if let Some(element) = tree.child(id, &NodeRole::Element) {
                for (i, item) in items.iter().enumerate() {
                    collect(tree, registry, element, path.index(i), item, out)?;
                }
            }
        }
        Children::Entries(entries) => {
            let key_node = tree.child(id, &NodeRole::MapKey);
            let value_node = tree.child(id, &NodeRole::MapValue);
            if let (Some(key_node), Some(value_node)) = (key_node, value_node) {
                for (i, (k, v)) in entries.iter().enumerate() {
                    let slot = path.index(i);
                    collect(tree, registry, key_node, slot.child(PathSegment::Key), k, out)?;
                    collect(tree, registry, value_node, slot.child(PathSegment::Value), v, out)?;
                }
            }
        }
    }
    Ok(())
}
