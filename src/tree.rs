//! Property tree model
//!
//! A [`PropertyTree`] expands a root [`TypeDescriptor`] into one node per
//! addressable position. Nodes live in an arena owned by the tree and refer to
//! each other by [`NodeId`]; the structure is a strict hierarchy.
//!
//! Containers get a single template child (`[*]` for lists and sets, `KEY` and
//! `VALUE` for maps) describing the shape of any element. Concrete per-index
//! positions are only materialised by the resolver. Wrappers get one synthetic
//! child that shares the wrapper's path, which is what makes paths address
//! straight through them.
//!
//! Expansion is bounded: a type that re-enters itself more often than
//! `max_recursion_depth` allows, or any node deeper than `max_tree_depth`, is
//! marked truncated and always generates null (objects, wrappers) or empty
//! (containers).

use std::sync::Arc;

use crate::config::{GenerationConfig, SizeRange};
use crate::descriptor::{TypeDescriptor, TypeKind, WrapperKind};
use crate::error::{GenerationError, GenerationResult};
use crate::path::{PathExpression, PathSegment};
use crate::strategy::StrategyRegistry;

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Position of a node relative to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    Root,
    Property(String),
    Element,
    MapKey,
    MapValue,
    /// The single child of a wrapper
    Wrapped,
}

/// One addressable position in a tree
#[derive(Debug, Clone)]
pub struct PropertyNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub role: NodeRole,
    /// Template path from the root (`[*]`, `KEY`, `VALUE` for container slots)
    pub path: PathExpression,
    pub ty: Arc<TypeDescriptor>,
    /// Default size bounds, containers only
    pub cardinality: Option<SizeRange>,
    pub nullable: bool,
    pub truncated: bool,
    pub children: Vec<NodeId>,
}

impl PropertyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Immutable expansion of a type
#[derive(Debug, Clone)]
pub struct PropertyTree {
    nodes: Vec<PropertyNode>,
}

impl PropertyTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_type(&self) -> &Arc<TypeDescriptor> {
        &self.nodes[0].ty
    }

    pub fn node(&self, id: NodeId) -> &PropertyNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[PropertyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child of `id` playing `role`
    pub fn child(&self, id: NodeId, role: &NodeRole) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|child| &self.node(*child).role == role)
    }

    /// Template node addressed by `path`
    ///
    /// Indices select the element template; wrappers are passed through.
    pub fn find(&self, path: &PathExpression) -> Option<NodeId> {
        let mut current = self.root();
        let mut segments = path.segments().iter().peekable();
        while let Some(segment) = segments.peek().copied() {
            let node = self.node(current);
            current = match (&node.ty.kind, segment) {
                (TypeKind::Wrapper { .. }, _) => self.child(current, &NodeRole::Wrapped)?,
                (TypeKind::Object { .. }, PathSegment::Property(name)) => {
                    segments.next();
                    self.child(current, &NodeRole::Property(name.clone()))?
                }
                (TypeKind::List { .. } | TypeKind::Set { .. }, s) if s.is_slot_selector() => {
                    segments.next();
                    self.child(current, &NodeRole::Element)?
                }
                (TypeKind::Map { .. }, s) if s.is_slot_selector() => {
                    segments.next();
                    match segments.next()? {
                        PathSegment::Key => self.child(current, &NodeRole::MapKey)?,
                        PathSegment::Value => self.child(current, &NodeRole::MapValue)?,
                        _ => return None,
                    }
                }
                (TypeKind::Map { .. }, PathSegment::Key) => {
                    segments.next();
                    self.child(current, &NodeRole::MapKey)?
                }
                (TypeKind::Map { .. }, PathSegment::Value) => {
                    segments.next();
                    self.child(current, &NodeRole::MapValue)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Expands descriptors into property trees
pub struct PropertyTreeBuilder<'a> {
    registry: &'a StrategyRegistry,
    config: &'a GenerationConfig,
    nodes: Vec<PropertyNode>,
    /// Type names on the current expansion path
    lineage: Vec<String>,
}

impl<'a> PropertyTreeBuilder<'a> {
    pub fn new(registry: &'a StrategyRegistry, config: &'a GenerationConfig) -> Self {
        Self {
            registry,
            config,
            nodes: Vec::new(),
            lineage: Vec::new(),
        }
    }

    /// Expand `root`, failing if any reachable type has no construction strategy
    pub fn build(mut self, root: Arc<TypeDescriptor>) -> GenerationResult<PropertyTree> {
        self.expand(root, NodeRole::Root, None, PathExpression::root(), false, 0)?;
        log::debug!("Built property tree with {} nodes", self.nodes.len());
        Ok(PropertyTree { nodes: self.nodes })
    }

    fn expand(
        &mut self,
        ty: Arc<TypeDescriptor>,
        role: NodeRole,
        parent: Option<NodeId>,
        path: PathExpression,
        nullable: bool,
        depth: usize,
    ) -> GenerationResult<NodeId> {
        if !self.registry.can_handle(&ty) {
            return Err(GenerationError::UnsupportedType {
                type_name: ty.name.clone(),
            });
        }

        let reentries = self.lineage.iter().filter(|name| **name == ty.name).count();
        let truncated = !ty.is_scalar()
            && (reentries > self.config.max_recursion_depth || depth > self.config.max_tree_depth);
        if truncated {
            log::debug!("Truncating {} at `{}` (depth {})", ty.name, path, depth);
        }

        let id = NodeId(self.nodes.len());
        let (nullable, cardinality) = match &ty.kind {
            TypeKind::Wrapper { wrapper, .. } => (
                nullable || *wrapper == WrapperKind::Optional,
                None,
            ),
            TypeKind::List { .. } | TypeKind::Set { .. } | TypeKind::Map { .. } => {
                (nullable, Some(self.config.default_container_size))
            }
            _ => (nullable, None),
        };
        self.nodes.push(PropertyNode {
            id,
            parent,
            role,
            path: path.clone(),
            ty: Arc::clone(&ty),
            cardinality,
            nullable,
            truncated,
            children: Vec::new(),
        });
        if truncated {
            return Ok(id);
        }

        self.lineage.push(ty.name.clone());
        let children = self.expand_children(&ty, id, &path, depth)?;
        self.lineage.pop();

        self.nodes[id.0].children = children;
        Ok(id)
    }

    fn expand_children(
        &mut self,
        ty: &TypeDescriptor,
        id: NodeId,
        path: &PathExpression,
        depth: usize,
    ) -> GenerationResult<Vec<NodeId>> {
        let mut children = Vec::new();
        match &ty.kind {
            TypeKind::Scalar(_) | TypeKind::Opaque => {}
            TypeKind::Object { properties, .. } => {
                for prop in properties {
                    children.push(self.expand(
                        prop.ty.resolve(),
                        NodeRole::Property(prop.name.clone()),
                        Some(id),
                        path.property(prop.name.clone()),
                        prop.nullable,
                        depth + 1,
                    )?);
                }
            }
            // The wrapped child shares the wrapper's path and depth
            TypeKind::Wrapper { inner, .. } => {
                children.push(self.expand(inner.resolve(), NodeRole::Wrapped, Some(id), path.clone(), false, depth)?);
            }
            TypeKind::List { element } | TypeKind::Set { element } => {
                children.push(self.expand(
                    element.resolve(),
                    NodeRole::Element,
                    Some(id),
                    path.child(PathSegment::Wildcard),
                    false,
                    depth + 1,
                )?);
            }
            TypeKind::Map { key, value } => {
                children.push(self.expand(key.resolve(), NodeRole::MapKey, Some(id), path.child(PathSegment::Key), false, depth + 1)?);
                children.push(self.expand(
                    value.resolve(),
                    NodeRole::MapValue,
                    Some(id),
                    path.child(PathSegment::Value),
                    false,
                    depth + 1,
                )?);
            }
        }
        Ok(children)
    }
}
