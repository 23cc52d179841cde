//! Construction strategies
//!
//! A construction strategy turns generated child values into an instance of a type
//! and decomposes an instance back into the same children. The built-in strategies
//! form a closed set selected by descriptor shape ([`BuiltinStrategy`]); callers
//! can register their own for types with custom invariants (validating
//! constructors) or for opaque types the engine cannot otherwise produce.
//!
//! Every strategy must satisfy the round-trip law
//! `construct(ty, decompose(ty, v)?)? == v` for the values it produces.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::{ObjectShape, TypeDescriptor, TypeKind, WrapperKind};
use crate::error::{GenerationError, GenerationResult};
use crate::source::RandomnessSource;
use crate::value::{tuple_position, Value};

/// Child values keyed the way the property tree expands a type
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    /// A scalar is its own child
    Leaf(Value),
    Fields(Vec<(String, Value)>),
    Single(Value),
    Elements(Vec<Value>),
    Entries(Vec<(Value, Value)>),
}

/// Capability to build and take apart values of the types it handles
pub trait ConstructionStrategy: fmt::Debug + Send + Sync {
    fn can_handle(&self, ty: &TypeDescriptor) -> bool;

    fn construct(&self, ty: &TypeDescriptor, children: Children) -> GenerationResult<Value>;

    fn decompose(&self, ty: &TypeDescriptor, value: &Value) -> GenerationResult<Children>;

    /// Produce a value directly instead of assembling children
    ///
    /// Strategies for opaque types must implement this; the default defers to
    /// normal generation.
    fn generate(&self, _ty: &TypeDescriptor, _source: &mut dyn RandomnessSource) -> Option<GenerationResult<Value>> {
        None
    }
}

/// Strategies the engine knows without registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinStrategy {
    Scalar,
    Record,
    Tuple,
    Optional,
    Deferred,
    List,
    Set,
    Map,
}

impl BuiltinStrategy {
    pub const ALL: [BuiltinStrategy; 8] = [
        BuiltinStrategy::Scalar,
        BuiltinStrategy::Record,
        BuiltinStrategy::Tuple,
        BuiltinStrategy::Optional,
        BuiltinStrategy::Deferred,
        BuiltinStrategy::List,
        BuiltinStrategy::Set,
        BuiltinStrategy::Map,
    ];

    /// The built-in strategy matching a descriptor's shape
    pub fn for_type(ty: &TypeDescriptor) -> Option<Self> {
        match &ty.kind {
            TypeKind::Scalar(_) => Some(BuiltinStrategy::Scalar),
            TypeKind::Object { shape: ObjectShape::Record, .. } => Some(BuiltinStrategy::Record),
            TypeKind::Object { shape: ObjectShape::Tuple, .. } => Some(BuiltinStrategy::Tuple),
            TypeKind::Wrapper { wrapper: WrapperKind::Optional, .. } => Some(BuiltinStrategy::Optional),
            TypeKind::Wrapper { wrapper: WrapperKind::Deferred, .. } => Some(BuiltinStrategy::Deferred),
            TypeKind::List { .. } => Some(BuiltinStrategy::List),
            TypeKind::Set { .. } => Some(BuiltinStrategy::Set),
            TypeKind::Map { .. } => Some(BuiltinStrategy::Map),
            TypeKind::Opaque => None,
        }
    }

    fn mismatch(ty: &TypeDescriptor, what: &str) -> GenerationError {
        GenerationError::construction(ty.name.clone(), format!("expected {}", what))
    }
}

impl ConstructionStrategy for BuiltinStrategy {
    fn can_handle(&self, ty: &TypeDescriptor) -> bool {
        BuiltinStrategy::for_type(ty) == Some(*self)
    }

    fn construct(&self, ty: &TypeDescriptor, children: Children) -> GenerationResult<Value> {
        match (self, children) {
            (BuiltinStrategy::Scalar, Children::Leaf(value)) => Ok(value),
            (BuiltinStrategy::Record, Children::Fields(fields)) => Ok(Value::Object {
                type_name: ty.name.clone(),
                fields,
            }),
            (BuiltinStrategy::Tuple, Children::Fields(mut fields)) => {
                fields.sort_by_key(|(name, _)| tuple_position(name).unwrap_or(usize::MAX));
                Ok(Value::Tuple(fields.into_iter().map(|(_, v)| v).collect()))
            }
            (BuiltinStrategy::Optional, Children::Single(value)) => Ok(value),
            (BuiltinStrategy::Deferred, Children::Single(value)) => Ok(Value::Deferred(Box::new(value))),
            (BuiltinStrategy::List, Children::Elements(items)) => Ok(Value::List(items)),
            (BuiltinStrategy::Set, Children::Elements(items)) => Ok(Value::Set(items)),
            (BuiltinStrategy::Map, Children::Entries(entries)) => Ok(Value::Map(entries)),
            (strategy, children) => Err(GenerationError::construction(
                ty.name.clone(),
                format!("{:?} strategy cannot assemble {:?}", strategy, children),
            )),
        }
    }

    fn decompose(&self, ty: &TypeDescriptor, value: &Value) -> GenerationResult<Children> {
        match (self, value) {
            (BuiltinStrategy::Scalar, v) => Ok(Children::Leaf(v.clone())),
            (BuiltinStrategy::Record, Value::Object { fields, .. }) => Ok(Children::Fields(fields.clone())),
            (BuiltinStrategy::Record, _) => Err(Self::mismatch(ty, "an object")),
            (BuiltinStrategy::Tuple, Value::Tuple(items)) => Ok(Children::Fields(
                ["first", "second", "third"]
                    .iter()
                    .zip(items)
                    .map(|(name, v)| (name.to_string(), v.clone()))
                    .collect(),
            )),
            (BuiltinStrategy::Tuple, _) => Err(Self::mismatch(ty, "a tuple")),
            (BuiltinStrategy::Optional, v) => Ok(Children::Single(v.clone())),
            (BuiltinStrategy::Deferred, Value::Deferred(inner)) => Ok(Children::Single((**inner).clone())),
            (BuiltinStrategy::Deferred, _) => Err(Self::mismatch(ty, "a deferred value")),
            (BuiltinStrategy::List | BuiltinStrategy::Set, Value::List(items) | Value::Set(items)) => {
                Ok(Children::Elements(items.clone()))
            }
            (BuiltinStrategy::List | BuiltinStrategy::Set, _) => Err(Self::mismatch(ty, "a list or set")),
            (BuiltinStrategy::Map, Value::Map(entries)) => Ok(Children::Entries(entries.clone())),
            (BuiltinStrategy::Map, _) => Err(Self::mismatch(ty, "a map")),
        }
    }
}

/// Registered strategies, consulted before the built-ins
#[derive(Clone)]
pub struct StrategyRegistry {
    custom: Vec<Arc<dyn ConstructionStrategy>>,
    builtins: Vec<Arc<dyn ConstructionStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            builtins: BuiltinStrategy::ALL
                .iter()
                .map(|s| Arc::new(*s) as Arc<dyn ConstructionStrategy>)
                .collect(),
        }
    }

    /// Register a strategy; later registrations take precedence
    pub fn register(&mut self, strategy: Arc<dyn ConstructionStrategy>) {
        self.custom.insert(0, strategy);
    }

    pub fn strategy_for(&self, ty: &TypeDescriptor) -> Option<&dyn ConstructionStrategy> {
        self.custom
            .iter()
            .chain(self.builtins.iter())
            .find(|s| s.can_handle(ty))
            .map(|s| s.as_ref())
    }

    pub fn can_handle(&self, ty: &TypeDescriptor) -> bool {
        self.strategy_for(ty).is_some()
    }

    fn require(&self, ty: &TypeDescriptor) -> GenerationResult<&dyn ConstructionStrategy> {
        self.strategy_for(ty).ok_or_else(|| GenerationError::UnsupportedType {
            type_name: ty.name.clone(),
        })
    }

    pub fn construct(&self, ty: &TypeDescriptor, children: Children) -> GenerationResult<Value> {
        self.require(ty)?.construct(ty, children)
    }

    pub fn decompose(&self, ty: &TypeDescriptor, value: &Value) -> GenerationResult<Children> {
        self.require(ty)?.decompose(ty, value)
    }

    pub fn generate(&self, ty: &TypeDescriptor, source: &mut dyn RandomnessSource) -> Option<GenerationResult<Value>> {
        self.strategy_for(ty)?.generate(ty, source)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("custom", &self.custom)
            .finish()
    }
}
