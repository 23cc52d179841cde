//! Directive resolution
//!
//! The resolver overlays a builder's sequenced [`Rule`]s on its immutable
//! [`PropertyTree`] and produces a [`ResolvedPlan`]: per node, the final value
//! override (if any), the final cardinality of containers, concrete per-slot
//! sub-plans and post-conditions. A fresh plan is computed for every sample.
//!
//! Rules are routed down the tree one path segment at a time. At each node:
//!
//! * The newest set rule wins. A concrete object or container value is decomposed
//!   into rules for the node's children at the winner's sequence number, so newer
//!   directives on a descendant still win per node and older ones lose.
//! * A value that cannot be decomposed (a scalar, null, or a wrapper value of the
//!   wrong shape) only takes effect if it is newer than every rule below the node
//!   and every size rule on it.
//! * The newest size rule wins as a whole. A slot addressed by a rule newer than
//!   that size widens the range so the slot exists; older slots that no longer fit
//!   are dropped when the size is drawn.
//!
//! Wrappers are transparent: rules below a wrapper, and size rules on it, pass
//! through to the wrapped node unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{GenerationConfig, SizeRange};
use crate::descriptor::TypeKind;
use crate::directive::{Action, LazyValue, Predicate, Rule, ValueSource};
use crate::error::GenerationResult;
use crate::path::{PathExpression, PathSegment};
use crate::strategy::{Children, StrategyRegistry};
use crate::tree::{NodeId, NodeRole, PropertyNode, PropertyTree};
use crate::value::Value;

/// Final value of a node, replacing generation below it
#[derive(Clone)]
pub enum Override {
    Just(Value),
    /// Evaluated each time the node is sampled
    Lazy(LazyValue),
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Just(value) => f.debug_tuple("Just").field(value).finish(),
            Override::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

/// How a node's children are generated
#[derive(Debug, Clone)]
pub enum PlanShape {
    Leaf,
    Object(Vec<(String, PlanNode)>),
    Wrapper(Box<PlanNode>),
    Elements {
        size: SizeRange,
        /// Slots with their own rules; every other slot uses `fallback`
        slots: BTreeMap<usize, PlanNode>,
        fallback: Box<PlanNode>,
    },
    Entries {
        size: SizeRange,
        slots: BTreeMap<usize, EntryPlan>,
        fallback: Box<EntryPlan>,
    },
}

#[derive(Debug, Clone)]
pub struct EntryPlan {
    pub key: PlanNode,
    pub value: PlanNode,
}

/// Effective generation plan for one node
#[derive(Clone)]
pub struct PlanNode {
    pub node: NodeId,
    /// Concrete path, with indices for resolved slots
    pub path: PathExpression,
    pub nullable: bool,
    pub value: Option<Override>,
    pub post_conditions: Vec<Predicate>,
    pub shape: PlanShape,
}

impl PlanNode {
    /// Size bounds of a container plan
    pub fn size(&self) -> Option<SizeRange> {
        match &self.shape {
            PlanShape::Elements { size, .. } | PlanShape::Entries { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// The fixed value, if the node has a non-lazy override
    pub fn fixed_value(&self) -> Option<&Value> {
        match &self.value {
            Some(Override::Just(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.value, Some(Override::Lazy(_)))
    }

    /// Whether a directive assigns this node outright, lazily or not
    pub fn is_explicit(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Debug for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanNode")
            .field("path", &self.path.to_string())
            .field("nullable", &self.nullable)
            .field("value", &self.value)
            .field("post_conditions", &self.post_conditions.len())
            .field("shape", &self.shape)
            .finish()
    }
}

/// Plan for one sample
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    root: PlanNode,
}

impl ResolvedPlan {
    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    /// Plan node that generates the position at `path`
    ///
    /// Slots without rules of their own map to the container's fallback plan.
    pub fn find(&self, path: &PathExpression) -> Option<&PlanNode> {
        let mut current = &self.root;
        let mut segments = path.segments().iter().peekable();
        while let Some(segment) = segments.peek().copied() {
            current = match (&current.shape, segment) {
                (PlanShape::Wrapper(child), _) => child.as_ref(),
                (PlanShape::Object(fields), PathSegment::Property(name)) => {
                    segments.next();
                    fields.iter().find(|(n, _)| n == name).map(|(_, plan)| plan)?
                }
                (PlanShape::Elements { slots, fallback, .. }, PathSegment::Index(i)) => {
                    segments.next();
                    slots.get(i).unwrap_or(fallback.as_ref())
                }
                (PlanShape::Elements { fallback, .. }, PathSegment::Wildcard) => {
                    segments.next();
                    fallback.as_ref()
                }
                (PlanShape::Entries { slots, fallback, .. }, s) => {
                    segments.next();
                    let (entry, side) = match s {
                        PathSegment::Key | PathSegment::Value => (fallback.as_ref(), s),
                        PathSegment::Index(i) => (slots.get(i).unwrap_or(fallback.as_ref()), segments.next()?),
                        PathSegment::Wildcard => (fallback.as_ref(), segments.next()?),
                        PathSegment::Property(_) => return None,
                    };
                    match side {
                        PathSegment::Key => &entry.key,
                        PathSegment::Value => &entry.value,
                        _ => return None,
                    }
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

/// A rule on its way down the tree
#[derive(Clone)]
struct Pending {
    sequence: u64,
    segments: Arc<[PathSegment]>,
    offset: usize,
    action: Action,
}

impl Pending {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            sequence: rule.sequence,
            segments: Arc::from(rule.path.segments()),
            offset: 0,
            action: rule.action.clone(),
        }
    }

    fn local(sequence: u64, segments: Vec<PathSegment>, action: Action) -> Self {
        Self {
            sequence,
            segments: Arc::from(segments),
            offset: 0,
            action,
        }
    }

    fn rest(&self) -> &[PathSegment] {
        &self.segments[self.offset..]
    }

    fn advance(&self, by: usize) -> Self {
        Self {
            offset: self.offset + by,
            ..self.clone()
        }
    }
}

/// Rules a decomposed value contributes to a node
struct Decomposed {
    size: Option<SizeRange>,
    rules: Vec<Pending>,
}

/// Computes plans from a tree and a rule set
pub struct Resolver<'a> {
    tree: &'a PropertyTree,
    registry: &'a StrategyRegistry,
    config: &'a GenerationConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a PropertyTree, registry: &'a StrategyRegistry, config: &'a GenerationConfig) -> Self {
        Self { tree, registry, config }
    }

    pub fn resolve(&self, rules: &[Rule]) -> GenerationResult<ResolvedPlan> {
        let pending = rules.iter().map(Pending::from_rule).collect();
        let root = self.resolve_node(self.tree.root(), PathExpression::root(), pending)?;
        Ok(ResolvedPlan { root })
    }

    /// Nodes whose value can be decomposed into child rules
    fn is_structured(node: &PropertyNode) -> bool {
        !node.truncated
            && matches!(
                node.ty.kind,
                TypeKind::Object { .. }
                    | TypeKind::Wrapper { .. }
                    | TypeKind::List { .. }
                    | TypeKind::Set { .. }
                    | TypeKind::Map { .. }
            )
    }

    fn resolve_node(&self, id: NodeId, path: PathExpression, rules: Vec<Pending>) -> GenerationResult<PlanNode> {
        let node = self.tree.node(id);
        let (here, mut below): (Vec<Pending>, Vec<Pending>) = rules.into_iter().partition(|r| r.rest().is_empty());

        let mut sets = Vec::new();
        let mut sizes = Vec::new();
        let mut checks = Vec::new();
        for rule in here {
            match rule.action {
                Action::Set(source) => sets.push((rule.sequence, source)),
                Action::Size(range) => sizes.push((rule.sequence, range)),
                Action::Check(predicate) => checks.push((rule.sequence, predicate)),
            }
        }
        checks.sort_by_key(|(sequence, _)| *sequence);
        let post_conditions: Vec<Predicate> = checks.into_iter().map(|(_, p)| p).collect();

        let winner = match sets.into_iter().max_by_key(|(sequence, _)| *sequence) {
            // Structured lazies are evaluated now so their result can be decomposed
            Some((sequence, ValueSource::Lazy(supplier))) if Self::is_structured(node) => {
                Some((sequence, ValueSource::Just(supplier())))
            }
            other => other,
        };

        let mut present = false;
        let mut value = None;
        let mut opaque = None;
        match winner {
            None => {}
            Some((_, ValueSource::NotNull)) => present = true,
            Some((_, ValueSource::Lazy(supplier))) => value = Some(Override::Lazy(supplier)),
            Some((sequence, ValueSource::Just(v))) => {
                if v.is_null() || !Self::is_structured(node) {
                    opaque = Some((sequence, v));
                } else {
                    match self.decompose(node, sequence, &v)? {
                        Some(decomposed) => {
                            present = true;
                            if let Some(size) = decomposed.size {
                                sizes.push((sequence, size));
                            }
                            below.extend(decomposed.rules);
                        }
                        None => opaque = Some((sequence, v)),
                    }
                }
            }
        }

        if let Some((sequence, v)) = opaque {
            let newest_below = below.iter().map(|r| r.sequence).max();
            let newest_size = sizes.iter().map(|(s, _)| *s).max().filter(|_| !node.ty.is_scalar());
            if newest_below.map_or(true, |s| sequence > s) && newest_size.map_or(true, |s| sequence > s) {
                value = Some(Override::Just(v));
            } else {
                log::debug!("Discarding value set at `{}` by #{}: newer directives reach inside it", path, sequence);
            }
        }

        if value.is_some() {
            return Ok(PlanNode {
                node: id,
                path,
                nullable: false,
                value,
                post_conditions,
                shape: PlanShape::Leaf,
            });
        }

        if !node.ty.is_scalar() {
            present = present || !below.is_empty() || !sizes.is_empty();
        }
        let nullable = node.nullable && !self.config.default_not_null && !present && node.role != NodeRole::MapKey;

        let shape = if node.truncated {
            self.unmatched(&path, below);
            PlanShape::Leaf
        } else {
            match &node.ty.kind {
                TypeKind::Scalar(_) | TypeKind::Opaque => {
                    self.unmatched(&path, below);
                    PlanShape::Leaf
                }
                TypeKind::Object { .. } => self.object_shape(node, &path, below)?,
                TypeKind::Wrapper { .. } => {
                    let mut forwarded = below;
                    forwarded.extend(
                        sizes
                            .into_iter()
                            .map(|(sequence, range)| Pending::local(sequence, Vec::new(), Action::Size(range))),
                    );
                    match node.children.first() {
                        Some(child) => PlanShape::Wrapper(Box::new(self.resolve_node(*child, path.clone(), forwarded)?)),
                        None => PlanShape::Leaf,
                    }
                }
                TypeKind::List { .. } | TypeKind::Set { .. } => self.elements_shape(node, &path, &sizes, below)?,
                TypeKind::Map { .. } => self.entries_shape(node, &path, &sizes, below)?,
            }
        };

        Ok(PlanNode {
            node: id,
            path,
            nullable,
            value: None,
            post_conditions,
            shape,
        })
    }

    fn decompose(&self, node: &PropertyNode, sequence: u64, value: &Value) -> GenerationResult<Option<Decomposed>> {
        let children = match self.registry.decompose(&node.ty, value) {
            Ok(children) => children,
            // A mismatched value on a wrapper replaces it wholesale
            Err(_) if matches!(node.ty.kind, TypeKind::Wrapper { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let set = |segments: Vec<PathSegment>, v: Value| Pending::local(sequence, segments, Action::Set(ValueSource::Just(v)));

        let decomposed = match children {
            Children::Leaf(_) => return Ok(None),
            Children::Fields(fields) => Decomposed {
                size: None,
                rules: fields
                    .into_iter()
                    .map(|(name, v)| set(vec![PathSegment::Property(name)], v))
                    .collect(),
            },
            Children::Single(inner) => Decomposed {
                size: None,
                rules: vec![set(Vec::new(), inner)],
            },
            Children::Elements(items) => Decomposed {
                size: Some(SizeRange::exact(items.len())),
                rules: items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| set(vec![PathSegment::Index(i)], v))
                    .collect(),
            },
            Children::Entries(entries) => Decomposed {
                size: Some(SizeRange::exact(entries.len())),
                rules: entries
                    .into_iter()
                    .enumerate()
                    .flat_map(|(i, (k, v))| {
                        [
                            set(vec![PathSegment::Index(i), PathSegment::Key], k),
                            set(vec![PathSegment::Index(i), PathSegment::Value], v),
                        ]
                    })
                    .collect(),
            },
        };
        Ok(Some(decomposed))
    }

    fn object_shape(&self, node: &PropertyNode, path: &PathExpression, below: Vec<Pending>) -> GenerationResult<PlanShape> {
        let mut groups: Vec<(String, NodeId, Vec<Pending>)> = node
            .children
            .iter()
            .filter_map(|child| match &self.tree.node(*child).role {
                NodeRole::Property(name) => Some((name.clone(), *child, Vec::new())),
                _ => None,
            })
            .collect();

        let mut unmatched = Vec::new();
        for rule in below {
            let group = match rule.rest().first() {
                Some(PathSegment::Property(name)) => groups.iter_mut().find(|(n, _, _)| n == name),
                _ => None,
            };
            match group {
                Some((_, _, rules)) => rules.push(rule.advance(1)),
                None => unmatched.push(rule),
            }
        }
        self.unmatched(path, unmatched);

        let fields = groups
            .into_iter()
            .map(|(name, child, rules)| {
                let plan = self.resolve_node(child, path.property(name.clone()), rules)?;
                Ok((name, plan))
            })
            .collect::<GenerationResult<Vec<_>>>()?;
        Ok(PlanShape::Object(fields))
    }

    fn elements_shape(
        &self,
        node: &PropertyNode,
        path: &PathExpression,
        sizes: &[(u64, SizeRange)],
        below: Vec<Pending>,
    ) -> GenerationResult<PlanShape> {
        let element = match node.children.first() {
            Some(element) => *element,
            None => return Ok(PlanShape::Leaf),
        };

        let mut slots: BTreeMap<usize, Vec<Pending>> = BTreeMap::new();
        let mut every = Vec::new();
        let mut unmatched = Vec::new();
        for rule in below {
            match rule.rest().first() {
                Some(PathSegment::Index(i)) => slots.entry(*i).or_default().push(rule.advance(1)),
                Some(PathSegment::Wildcard) => every.push(rule.advance(1)),
                _ => unmatched.push(rule),
            }
        }
        self.unmatched(path, unmatched);

        let required = slots
            .iter()
            .map(|(slot, rules)| (*slot, rules.iter().map(|r| r.sequence).max().unwrap_or(0)));
        let size = self.cardinality(node, sizes, required);

        let mut plans = BTreeMap::new();
        for (slot, rules) in slots.into_iter().filter(|(slot, _)| *slot < size.max) {
            let mut all = every.clone();
            all.extend(rules);
            plans.insert(slot, self.resolve_node(element, path.index(slot), all)?);
        }
        let fallback = self.resolve_node(element, path.child(PathSegment::Wildcard), every)?;

        Ok(PlanShape::Elements {
            size,
            slots: plans,
            fallback: Box::new(fallback),
        })
    }

    fn entries_shape(
        &self,
        node: &PropertyNode,
        path: &PathExpression,
        sizes: &[(u64, SizeRange)],
        below: Vec<Pending>,
    ) -> GenerationResult<PlanShape> {
        let (key, value) = match (
            self.tree.child(node.id, &NodeRole::MapKey),
            self.tree.child(node.id, &NodeRole::MapValue),
        ) {
            (Some(key), Some(value)) => (key, value),
            _ => return Ok(PlanShape::Leaf),
        };

        let mut slots: BTreeMap<usize, (Vec<Pending>, Vec<Pending>)> = BTreeMap::new();
        let mut every_key = Vec::new();
        let mut every_value = Vec::new();
        let mut unmatched = Vec::new();
        for rule in below {
            match (rule.rest().first(), rule.rest().get(1)) {
                (Some(PathSegment::Index(i)), Some(PathSegment::Key)) => {
                    slots.entry(*i).or_default().0.push(rule.advance(2))
                }
                (Some(PathSegment::Index(i)), Some(PathSegment::Value)) => {
                    slots.entry(*i).or_default().1.push(rule.advance(2))
                }
                (Some(PathSegment::Wildcard), Some(PathSegment::Key)) => every_key.push(rule.advance(2)),
                (Some(PathSegment::Wildcard), Some(PathSegment::Value)) => every_value.push(rule.advance(2)),
                (Some(PathSegment::Key), _) => every_key.push(rule.advance(1)),
                (Some(PathSegment::Value), _) => every_value.push(rule.advance(1)),
                _ => unmatched.push(rule),
            }
        }
        self.unmatched(path, unmatched);

        let required = slots.iter().map(|(slot, (keys, values))| {
            let newest = keys.iter().chain(values).map(|r| r.sequence).max().unwrap_or(0);
            (*slot, newest)
        });
        let size = self.cardinality(node, sizes, required);

        let mut plans = BTreeMap::new();
        for (slot, (keys, values)) in slots.into_iter().filter(|(slot, _)| *slot < size.max) {
            let slot_path = path.index(slot);
            let mut key_rules = every_key.clone();
            key_rules.extend(keys);
            let mut value_rules = every_value.clone();
            value_rules.extend(values);
            plans.insert(
                slot,
                EntryPlan {
                    key: self.resolve_node(key, slot_path.child(PathSegment::Key), key_rules)?,
                    value: self.resolve_node(value, slot_path.child(PathSegment::Value), value_rules)?,
                },
            );
        }
        let fallback = EntryPlan {
            key: self.resolve_node(key, path.child(PathSegment::Key), every_key)?,
            value: self.resolve_node(value, path.child(PathSegment::Value), every_value)?,
        };

        Ok(PlanShape::Entries {
            size,
            slots: plans,
            fallback: Box::new(fallback),
        })
    }

    /// Final size bounds: the newest size rule, widened for newer slot rules
    fn cardinality(
        &self,
        node: &PropertyNode,
        sizes: &[(u64, SizeRange)],
        required: impl Iterator<Item = (usize, u64)>,
    ) -> SizeRange {
        let winner = sizes.iter().max_by_key(|(sequence, _)| *sequence);
        let mut range = winner
            .map(|(_, range)| *range)
            .or(node.cardinality)
            .unwrap_or(self.config.default_container_size);
        let floor = winner.map(|(sequence, _)| *sequence);
        for (slot, newest) in required {
            if floor.map_or(true, |f| newest > f) {
                range = range.accommodate(slot + 1);
            }
        }
        range
    }

    fn unmatched(&self, path: &PathExpression, rules: Vec<Pending>) {
        for rule in rules {
            log::debug!(
                "Ignoring directive #{}: no node at `{}`",
                rule.sequence,
                path.join(&PathExpression::from_segments(rule.rest().to_vec()))
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{Directive, DirectiveKind, DirectiveLog, InnerSpec};
    use crate::descriptor::TypeDescriptor;
    use crate::tree::PropertyTreeBuilder;

    fn list_object() -> TypeDescriptor {
        TypeDescriptor::record("ListStringObject").property("values", TypeDescriptor::list(TypeDescriptor::string()))
    }

    fn map_object() -> TypeDescriptor {
        TypeDescriptor::record("MapObject")
            .property("strMap", TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::string()))
    }

    fn plan(desc: TypeDescriptor, specs: Vec<InnerSpec>) -> ResolvedPlan {
        let registry = StrategyRegistry::new();
        let config = GenerationConfig::default();
        let tree = PropertyTreeBuilder::new(&registry, &config).build(Arc::new(desc)).unwrap();
        let mut log = DirectiveLog::new();
        for spec in specs {
            let (directives, _) = spec.into_directives();
            log.push(Directive::new(PathExpression::root(), DirectiveKind::Nested(directives)));
        }
        Resolver::new(&tree, &registry, &config).resolve(log.rules()).unwrap()
    }

    fn at<'p>(plan: &'p ResolvedPlan, path: &str) -> &'p PlanNode {
        plan.find(&PathExpression::parse(path).unwrap()).unwrap()
    }

    #[test]
    fn later_size_wins_over_older_slot() {
        let plan = plan(
            map_object(),
            vec![InnerSpec::new().property_spec("strMap", |m| m.size(1).entry("key", "test").size(0))],
        );
        assert_eq!(at(&plan, "strMap").size(), Some(SizeRange::exact(0)));
    }

    #[test]
    fn newer_slot_widens_size() {
        let plan = plan(
            list_object(),
            vec![InnerSpec::new().property_spec("values", |v| v.max_size(2).list_element(0, "a").list_element(1, "b"))],
        );
        assert_eq!(at(&plan, "values").size(), Some(SizeRange::exact(2)));
        assert_eq!(at(&plan, "values[1]").fixed_value(), Some(&Value::from("b")));
    }

    #[test]
    fn set_after_size_and_size_after_set() {
        let set_last = plan(
            list_object(),
            vec![InnerSpec::new().property_spec("values", |v| v.size(2)).property("values", Vec::<String>::new())],
        );
        assert_eq!(at(&set_last, "values").size(), Some(SizeRange::exact(0)));

        let size_last = plan(
            list_object(),
            vec![InnerSpec::new().property("values", Vec::<String>::new()).property_spec("values", |v| v.size(2))],
        );
        assert_eq!(at(&size_last, "values").size(), Some(SizeRange::exact(2)));
    }

    #[test]
    fn wildcard_and_exact_slot_precedence() {
        let exact_last = plan(
            TypeDescriptor::list(TypeDescriptor::string()),
            vec![InnerSpec::new().size(3).all_list_element("x").list_element(0, "y")],
        );
        assert_eq!(at(&exact_last, "[0]").fixed_value(), Some(&Value::from("y")));
        assert_eq!(at(&exact_last, "[2]").fixed_value(), Some(&Value::from("x")));

        let wildcard_last = plan(
            TypeDescriptor::list(TypeDescriptor::string()),
            vec![InnerSpec::new().size(3).list_element(0, "y").all_list_element("x")],
        );
        assert_eq!(at(&wildcard_last, "[0]").fixed_value(), Some(&Value::from("x")));
    }

    #[test]
    fn whole_object_value_is_decomposed_per_field() {
        let desc = TypeDescriptor::record("ComplexObject").property(
            "value",
            TypeDescriptor::record("SimpleObject")
                .property("str", TypeDescriptor::string())
                .property("integer", TypeDescriptor::int()),
        );
        let plan = plan(
            desc,
            vec![InnerSpec::new()
                .property("value", Value::object("SimpleObject", [("str", Value::from("a")), ("integer", Value::from(1))]))
                .property("value.integer", 2)],
        );
        assert_eq!(at(&plan, "value.str").fixed_value(), Some(&Value::from("a")));
        assert_eq!(at(&plan, "value.integer").fixed_value(), Some(&Value::from(2)));
        assert!(at(&plan, "value").value.is_none());
    }

    #[test]
    fn null_loses_to_newer_descendant_directive() {
        let desc = TypeDescriptor::record("Holder").nullable_property(
            "value",
            TypeDescriptor::record("SimpleObject").property("str", TypeDescriptor::string()),
        );
        let discarded = plan(desc.clone(), vec![InnerSpec::new().property_null("value").property("value.str", "x")]);
        let node = at(&discarded, "value");
        assert!(node.value.is_none());
        assert!(!node.nullable);

        let kept = plan(desc, vec![InnerSpec::new().property("value.str", "x").property_null("value")]);
        assert_eq!(at(&kept, "value").fixed_value(), Some(&Value::Null));
    }

    #[test]
    fn not_null_clears_nullability() {
        let desc = TypeDescriptor::record("Holder").nullable_property("str", TypeDescriptor::string());
        let plain = plan(desc.clone(), Vec::new());
        assert!(at(&plain, "str").nullable);

        let forced = plan(desc, vec![InnerSpec::new().property_not_null("str")]);
        assert!(!at(&forced, "str").nullable);
    }

    #[test]
    fn map_key_and_value_slots_route_separately() {
        let plan = plan(
            map_object(),
            vec![InnerSpec::new().property_spec("strMap", |m| m.key("k").value("v").all_value("all"))],
        );
        assert_eq!(at(&plan, "strMap[0].KEY").fixed_value(), Some(&Value::from("k")));
        assert_eq!(at(&plan, "strMap[1].VALUE").fixed_value(), Some(&Value::from("all")));
        assert_eq!(at(&plan, "strMap[3].VALUE").fixed_value(), Some(&Value::from("all")));
        assert_eq!(at(&plan, "strMap").size(), Some(SizeRange::new(2, 3)));
    }

    #[test]
    fn wrapper_forwards_rules_to_wrapped_node() {
        let desc = TypeDescriptor::deferred(TypeDescriptor::record("SimpleObject").property("str", TypeDescriptor::string()));
        let plan = plan(desc, vec![InnerSpec::new().property("str", "test")]);
        assert!(matches!(plan.root().shape, PlanShape::Wrapper(_)));
        assert_eq!(at(&plan, "str").fixed_value(), Some(&Value::from("test")));
    }

    #[test]
    fn mismatched_object_value_is_an_error() {
        let registry = StrategyRegistry::new();
        let config = GenerationConfig::default();
        let desc = TypeDescriptor::record("SimpleObject").property("str", TypeDescriptor::string());
        let tree = PropertyTreeBuilder::new(&registry, &config).build(Arc::new(desc)).unwrap();
        let mut log = DirectiveLog::new();
        log.push(Directive::new(
            PathExpression::root(),
            DirectiveKind::SetValue(ValueSource::just("not an object")),
        ));
        assert!(Resolver::new(&tree, &registry, &config).resolve(log.rules()).is_err());
    }
}
