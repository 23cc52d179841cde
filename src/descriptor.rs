//! Type descriptors and the process-wide descriptor cache
//!
//! A [`TypeDescriptor`] is the language-neutral shape of a type: scalar, object
//! with named properties, single-slot wrapper, or container. Descriptors are pure
//! data. Property and element types are held as [`TypeRef`]s so that
//! self-referential types can be described without building an infinite value;
//! deferred references are resolved only when the property tree expands them.
//!
//! Rust types opt in through the [`Describe`] trait. [`descriptor_of`] builds a
//! descriptor once per `TypeId` and caches it for the lifetime of the process.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Leaf types drawn directly from the randomness source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
        }
    }
}

/// How an object's properties are addressed when it is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectShape {
    /// Named fields
    Record,
    /// Positional members exposed as `first`, `second`, `third`
    Tuple,
}

/// Single-slot containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperKind {
    /// Absent values are represented as null
    Optional,
    /// A box that yields its value when invoked
    Deferred,
}

/// Reference to a property or element type
#[derive(Clone)]
pub enum TypeRef {
    Resolved(Arc<TypeDescriptor>),
    /// Resolved on demand; used for types that may refer to themselves
    Deferred {
        name: String,
        resolve: fn() -> Arc<TypeDescriptor>,
    },
}

impl TypeRef {
    /// Lazily reference a described Rust type
    pub fn of<T: Describe>() -> Self {
        TypeRef::Deferred {
            name: T::type_name(),
            resolve: descriptor_of::<T>,
        }
    }

    pub fn name(&self) -> String {
        match self {
            TypeRef::Resolved(desc) => desc.name.clone(),
            TypeRef::Deferred { name, .. } => name.clone(),
        }
    }

    pub fn resolve(&self) -> Arc<TypeDescriptor> {
        match self {
            TypeRef::Resolved(desc) => Arc::clone(desc),
            TypeRef::Deferred { resolve, .. } => resolve(),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Resolved(desc) => write!(f, "{}", desc.name),
            TypeRef::Deferred { name, .. } => write!(f, "{} (deferred)", name),
        }
    }
}

impl From<TypeDescriptor> for TypeRef {
    fn from(desc: TypeDescriptor) -> Self {
        TypeRef::Resolved(Arc::new(desc))
    }
}

impl From<Arc<TypeDescriptor>> for TypeRef {
    fn from(desc: Arc<TypeDescriptor>) -> Self {
        TypeRef::Resolved(desc)
    }
}

/// A declared property of an object type
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Scalar(ScalarKind),
    Object {
        shape: ObjectShape,
        properties: Vec<PropertyDescriptor>,
    },
    Wrapper {
        wrapper: WrapperKind,
        inner: TypeRef,
    },
    List {
        element: TypeRef,
    },
    Set {
        element: TypeRef,
    },
    Map {
        key: TypeRef,
        value: TypeRef,
    },
    /// A type with no discoverable shape; only a registered strategy can produce it
    Opaque,
}

/// Property names of tuple members, in position order
pub const TUPLE_MEMBERS: [&str; 3] = ["first", "second", "third"];

/// Language-neutral description of a type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind: TypeKind::Scalar(kind),
        }
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn int() -> Self {
        Self::scalar(ScalarKind::I32)
    }

    pub fn long() -> Self {
        Self::scalar(ScalarKind::I64)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Bool)
    }

    /// An object with named fields; add fields with [`TypeDescriptor::property`]
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Object {
                shape: ObjectShape::Record,
                properties: Vec::new(),
            },
        }
    }

    /// A positional object (pair, triple)
    ///
    /// # Panics
    ///
    /// If given more than three members, which have no property name.
    pub fn tuple(members: Vec<TypeRef>) -> Self {
        assert!(
            members.len() <= TUPLE_MEMBERS.len(),
            "tuples have at most {} members, got {}",
            TUPLE_MEMBERS.len(),
            members.len()
        );
        let name = format!(
            "({})",
            members.iter().map(TypeRef::name).collect::<Vec<_>>().join(", ")
        );
        let properties = members
            .into_iter()
            .zip(TUPLE_MEMBERS)
            .map(|(ty, name)| PropertyDescriptor {
                name: name.to_string(),
                ty,
                nullable: false,
            })
            .collect();
        Self {
            name,
            kind: TypeKind::Object {
                shape: ObjectShape::Tuple,
                properties,
            },
        }
    }

    /// Add a non-nullable property. No-op for non-object descriptors.
    pub fn property(self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.push_property(name.into(), ty.into(), false)
    }

    pub fn nullable_property(self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.push_property(name.into(), ty.into(), true)
    }

    fn push_property(mut self, name: String, ty: TypeRef, nullable: bool) -> Self {
        if let TypeKind::Object { properties, .. } = &mut self.kind {
            properties.push(PropertyDescriptor { name, ty, nullable });
        }
        self
    }

    pub fn list(element: impl Into<TypeRef>) -> Self {
        let element = element.into();
        Self {
            name: format!("List<{}>", element.name()),
            kind: TypeKind::List { element },
        }
    }

    pub fn set(element: impl Into<TypeRef>) -> Self {
        let element = element.into();
        Self {
            name: format!("Set<{}>", element.name()),
            kind: TypeKind::Set { element },
        }
    }

    pub fn map(key: impl Into<TypeRef>, value: impl Into<TypeRef>) -> Self {
        let key = key.into();
        let value = value.into();
        Self {
            name: format!("Map<{}, {}>", key.name(), value.name()),
            kind: TypeKind::Map { key, value },
        }
    }

    pub fn optional(inner: impl Into<TypeRef>) -> Self {
        let inner = inner.into();
        Self {
            name: format!("Option<{}>", inner.name()),
            kind: TypeKind::Wrapper {
                wrapper: WrapperKind::Optional,
                inner,
            },
        }
    }

    pub fn deferred(inner: impl Into<TypeRef>) -> Self {
        let inner = inner.into();
        Self {
            name: format!("Deferred<{}>", inner.name()),
            kind: TypeKind::Wrapper {
                wrapper: WrapperKind::Deferred,
                inner,
            },
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Opaque,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::List { .. } | TypeKind::Set { .. } | TypeKind::Map { .. }
        )
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar(_))
    }
}

/// Discovery capability: describe a Rust type as a [`TypeDescriptor`]
pub trait Describe: 'static {
    /// Stable display name; also the identity used by the recursion guard
    fn type_name() -> String;

    fn describe() -> TypeDescriptor;
}

static DESCRIPTOR_CACHE: Lazy<RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Cached descriptor for `T`
///
/// Concurrent first lookups may both build a descriptor; the first insert wins and
/// both callers receive it.
pub fn descriptor_of<T: Describe>() -> Arc<TypeDescriptor> {
    let id = TypeId::of::<T>();
    {
        let cache = DESCRIPTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(desc) = cache.get(&id) {
            return Arc::clone(desc);
        }
    }

    let built = Arc::new(T::describe());
    log::trace!("Describing type {}", built.name);

    let mut cache = DESCRIPTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    Arc::clone(cache.entry(id).or_insert(built))
}

/// Number of descriptors currently cached
pub fn cached_descriptor_count() -> usize {
    DESCRIPTOR_CACHE.read().unwrap_or_else(|e| e.into_inner()).len()
}

macro_rules! describe_scalar {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(impl Describe for $t {
            fn type_name() -> String {
                ScalarKind::$kind.name().to_string()
            }

            fn describe() -> TypeDescriptor {
                TypeDescriptor::scalar(ScalarKind::$kind)
            }
        })*
    };
}

describe_scalar!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
);

impl<T: Describe> Describe for Option<T> {
    fn type_name() -> String {
        format!("Option<{}>", T::type_name())
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::optional(TypeRef::of::<T>())
    }
}

impl<T: Describe> Describe for Box<T> {
    fn type_name() -> String {
        T::type_name()
    }

    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

macro_rules! describe_sequence {
    ($ctor:ident, $label:literal, $($t:ident),*) => {
        $(impl<T: Describe> Describe for $t<T> {
            fn type_name() -> String {
                format!(concat!($label, "<{}>"), T::type_name())
            }

            fn describe() -> TypeDescriptor {
                TypeDescriptor::$ctor(TypeRef::of::<T>())
            }
        })*
    };
}

describe_sequence!(list, "List", Vec, VecDeque);
describe_sequence!(set, "Set", HashSet, BTreeSet);

impl<K: Describe, V: Describe> Describe for HashMap<K, V> {
    fn type_name() -> String {
        format!("Map<{}, {}>", K::type_name(), V::type_name())
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(TypeRef::of::<K>(), TypeRef::of::<V>())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn type_name() -> String {
        format!("Map<{}, {}>", K::type_name(), V::type_name())
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(TypeRef::of::<K>(), TypeRef::of::<V>())
    }
}

impl<A: Describe, B: Describe> Describe for (A, B) {
    fn type_name() -> String {
        format!("({}, {})", A::type_name(), B::type_name())
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::tuple(vec![TypeRef::of::<A>(), TypeRef::of::<B>()])
    }
}

impl<A: Describe, B: Describe, C: Describe> Describe for (A, B, C) {
    fn type_name() -> String {
        format!("({}, {}, {})", A::type_name(), B::type_name(), C::type_name())
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::tuple(vec![TypeRef::of::<A>(), TypeRef::of::<B>(), TypeRef::of::<C>()])
    }
}
