//! Customization directives and the directive log
//!
//! Users describe customizations with [`InnerSpec`], a nested builder whose
//! operations mirror the shape of the target type: properties, container sizes,
//! map slots, list elements, wildcards and nested specs in every position. Each
//! operation records a [`Directive`].
//!
//! A [`DirectiveLog`] lowers directives into flat, path-addressed [`Rule`]s and
//! numbers them in the order they were appended. A nested spec is lowered
//! depth-first, so its rules occupy one contiguous block of sequence numbers.
//! Sequence numbers are the only tie-breaker the resolver uses.

use std::fmt;
use std::sync::Arc;

use crate::config::SizeRange;
use crate::error::GenerationError;
use crate::path::{PathExpression, PathSegment};
use crate::value::Value;

/// Supplier evaluated when the node it targets is sampled
pub type LazyValue = Arc<dyn Fn() -> Value + Send + Sync>;

/// Predicate a sampled candidate must satisfy
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Where a set directive takes its value from
#[derive(Clone)]
pub enum ValueSource {
    Just(Value),
    /// Only require the node to be present
    NotNull,
    Lazy(LazyValue),
}

impl ValueSource {
    pub fn just(value: impl Into<Value>) -> Self {
        ValueSource::Just(value.into())
    }

    pub fn null() -> Self {
        ValueSource::Just(Value::Null)
    }

    pub fn lazy<F, V>(supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        ValueSource::Lazy(Arc::new(move || supplier().into()))
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Just(value) => f.debug_tuple("Just").field(value).finish(),
            ValueSource::NotNull => write!(f, "NotNull"),
            ValueSource::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

macro_rules! source_from {
    ($($t:ty),*) => {
        $(impl From<$t> for ValueSource {
            fn from(value: $t) -> Self {
                ValueSource::Just(value.into())
            }
        })*
    };
}

source_from!(Value, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, &str, String);

impl<T: Into<Value>> From<Option<T>> for ValueSource {
    fn from(value: Option<T>) -> Self {
        ValueSource::Just(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for ValueSource {
    fn from(value: Vec<T>) -> Self {
        ValueSource::Just(value.into())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for ValueSource {
    fn from(value: (A, B)) -> Self {
        ValueSource::Just(value.into())
    }
}

#[derive(Clone)]
pub enum DirectiveKind {
    SetValue(ValueSource),
    SetSize(SizeRange),
    SetKey { slot: usize, key: ValueSource },
    SetMapValue { slot: usize, value: ValueSource },
    SetEntry { slot: usize, key: ValueSource, value: ValueSource },
    SetAllKeys(ValueSource),
    SetAllValues(ValueSource),
    SetAllEntries { key: ValueSource, value: ValueSource },
    /// Directives relative to the target path
    Nested(Vec<Directive>),
    PostCondition(Predicate),
}

impl fmt::Debug for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveKind::SetValue(source) => f.debug_tuple("SetValue").field(source).finish(),
            DirectiveKind::SetSize(range) => f.debug_tuple("SetSize").field(range).finish(),
            DirectiveKind::SetKey { slot, key } => {
                f.debug_struct("SetKey").field("slot", slot).field("key", key).finish()
            }
            DirectiveKind::SetMapValue { slot, value } => {
                f.debug_struct("SetMapValue").field("slot", slot).field("value", value).finish()
            }
            DirectiveKind::SetEntry { slot, key, value } => f
                .debug_struct("SetEntry")
                .field("slot", slot)
                .field("key", key)
                .field("value", value)
                .finish(),
            DirectiveKind::SetAllKeys(key) => f.debug_tuple("SetAllKeys").field(key).finish(),
            DirectiveKind::SetAllValues(value) => f.debug_tuple("SetAllValues").field(value).finish(),
            DirectiveKind::SetAllEntries { key, value } => f
                .debug_struct("SetAllEntries")
                .field("key", key)
                .field("value", value)
                .finish(),
            DirectiveKind::Nested(directives) => f.debug_tuple("Nested").field(directives).finish(),
            DirectiveKind::PostCondition(_) => write!(f, "PostCondition(..)"),
        }
    }
}

/// A customization addressed relative to the spec that recorded it
#[derive(Debug, Clone)]
pub struct Directive {
    pub path: PathExpression,
    pub kind: DirectiveKind,
}

impl Directive {
    pub fn new(path: PathExpression, kind: DirectiveKind) -> Self {
        Self { path, kind }
    }
}

/// What a lowered rule does to the node it reaches
#[derive(Clone)]
pub enum Action {
    Set(ValueSource),
    Size(SizeRange),
    Check(Predicate),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Set(source) => f.debug_tuple("Set").field(source).finish(),
            Action::Size(range) => f.debug_tuple("Size").field(range).finish(),
            Action::Check(_) => write!(f, "Check(..)"),
        }
    }
}

/// A sequenced, absolutely addressed directive
#[derive(Debug, Clone)]
pub struct Rule {
    pub sequence: u64,
    pub path: PathExpression,
    pub action: Action,
}

/// Append-only log of lowered directives owned by one builder
#[derive(Debug, Clone, Default)]
pub struct DirectiveLog {
    rules: Vec<Rule>,
    next_sequence: u64,
}

impl DirectiveLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower `directive` and append its rules, returning how many were added
    pub fn push(&mut self, directive: Directive) -> usize {
        let before = self.rules.len();
        self.lower(&PathExpression::root(), directive);
        self.rules.len() - before
    }

    /// Claim a sequence number without appending a rule
    pub fn reserve(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Rules that may address the same node as `path`
    pub fn conflicting<'a>(&'a self, path: &'a PathExpression) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| rule.path.conflicts_with(path))
    }

    fn append(&mut self, path: PathExpression, action: Action) {
        let sequence = self.reserve();
        self.rules.push(Rule { sequence, path, action });
    }

    fn lower(&mut self, base: &PathExpression, directive: Directive) {
        let path = base.join(&directive.path);
        let key_at = |slot: usize| path.index(slot).child(PathSegment::Key);
        let value_at = |slot: usize| path.index(slot).child(PathSegment::Value);
        let all_keys = path.child(PathSegment::Wildcard).child(PathSegment::Key);
        let all_values = path.child(PathSegment::Wildcard).child(PathSegment::Value);

        match directive.kind {
            DirectiveKind::SetValue(source) => self.append(path.clone(), Action::Set(source)),
            DirectiveKind::SetSize(range) => self.append(path.clone(), Action::Size(range)),
            DirectiveKind::SetKey { slot, key } => self.append(key_at(slot), Action::Set(key)),
            DirectiveKind::SetMapValue { slot, value } => self.append(value_at(slot), Action::Set(value)),
            DirectiveKind::SetEntry { slot, key, value } => {
                self.append(key_at(slot), Action::Set(key));
                self.append(value_at(slot), Action::Set(value));
            }
            DirectiveKind::SetAllKeys(key) => self.append(all_keys, Action::Set(key)),
            DirectiveKind::SetAllValues(value) => self.append(all_values, Action::Set(value)),
            DirectiveKind::SetAllEntries { key, value } => {
                self.append(all_keys, Action::Set(key));
                self.append(all_values, Action::Set(value));
            }
            DirectiveKind::Nested(children) => {
                for child in children {
                    self.lower(&path, child);
                }
            }
            DirectiveKind::PostCondition(predicate) => self.append(path.clone(), Action::Check(predicate)),
        }
    }
}

/// Nested customization builder
///
/// Map slot operations (`key`, `value`, `entry` and their variants) each claim the
/// next free entry slot of the map the spec is applied to, so
/// `entry("a", 1).entry("b", 2)` describes two distinct entries.
#[derive(Debug, Clone, Default)]
pub struct InnerSpec {
    directives: Vec<Directive>,
    next_entry: usize,
    error: Option<GenerationError>,
}

impl InnerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// First malformed path recorded by this spec or a nested one
    pub fn error(&self) -> Option<&GenerationError> {
        self.error.as_ref()
    }

    pub fn into_directives(self) -> (Vec<Directive>, Option<GenerationError>) {
        (self.directives, self.error)
    }

    fn push(mut self, path: PathExpression, kind: DirectiveKind) -> Self {
        self.directives.push(Directive::new(path, kind));
        self
    }

    fn here(self, kind: DirectiveKind) -> Self {
        self.push(PathExpression::root(), kind)
    }

    fn at(mut self, expression: &str, kind: DirectiveKind) -> Self {
        match PathExpression::parse(expression) {
            Ok(path) => self.push(path, kind),
            Err(err) => {
                self.error.get_or_insert(err);
                self
            }
        }
    }

    fn nested(mut self, path: PathExpression, spec: InnerSpec) -> Self {
        if let Some(err) = spec.error {
            self.error.get_or_insert(err);
        }
        self.push(path, DirectiveKind::Nested(spec.directives))
    }

    fn claim_entry(&mut self) -> usize {
        let slot = self.next_entry;
        self.next_entry += 1;
        slot
    }

    fn build<F>(f: F) -> InnerSpec
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        f(InnerSpec::new())
    }

    // --- Properties ---

    pub fn property(self, path: &str, value: impl Into<ValueSource>) -> Self {
        self.at(path, DirectiveKind::SetValue(value.into()))
    }

    pub fn property_null(self, path: &str) -> Self {
        self.property(path, ValueSource::null())
    }

    pub fn property_not_null(self, path: &str) -> Self {
        self.property(path, ValueSource::NotNull)
    }

    pub fn property_lazy<F, V>(self, path: &str, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.property(path, ValueSource::lazy(supplier))
    }

    /// Apply a nested spec to the node at `path`
    pub fn property_spec<F>(self, path: &str, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        self.property_inner(path, Self::build(f))
    }

    pub fn property_inner(mut self, path: &str, spec: InnerSpec) -> Self {
        match PathExpression::parse(path) {
            Ok(path) => self.nested(path, spec),
            Err(err) => {
                self.error.get_or_insert(err);
                self
            }
        }
    }

    /// Splice a pre-built spec at the current position
    pub fn inner(self, spec: InnerSpec) -> Self {
        self.nested(PathExpression::root(), spec)
    }

    // --- Sizes ---

    pub fn size(self, size: usize) -> Self {
        self.here(DirectiveKind::SetSize(SizeRange::exact(size)))
    }

    pub fn size_between(self, min: usize, max: usize) -> Self {
        self.here(DirectiveKind::SetSize(SizeRange::new(min, max)))
    }

    /// At least `min` elements, up to the default spread above it
    pub fn min_size(self, min: usize) -> Self {
        self.here(DirectiveKind::SetSize(SizeRange::at_least(min, SizeRange::default_spread())))
    }

    pub fn max_size(self, max: usize) -> Self {
        self.here(DirectiveKind::SetSize(SizeRange::at_most(max, SizeRange::default_spread())))
    }

    // --- Map slots ---

    pub fn key(self, key: impl Into<ValueSource>) -> Self {
        self.key_source(key.into())
    }

    pub fn key_lazy<F, V>(self, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.key_source(ValueSource::lazy(supplier))
    }

    fn key_source(mut self, key: ValueSource) -> Self {
        let slot = self.claim_entry();
        self.here(DirectiveKind::SetKey { slot, key })
    }

    pub fn keys<I, V>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        keys.into_iter().fold(self, |spec, key| spec.key(key.into()))
    }

    /// Customize the key of a new entry with a nested spec
    pub fn key_spec<F>(mut self, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        let slot = self.claim_entry();
        let path = PathExpression::root().index(slot).child(PathSegment::Key);
        self.nested(path, Self::build(f))
    }

    pub fn value(self, value: impl Into<ValueSource>) -> Self {
        self.value_source(value.into())
    }

    pub fn value_lazy<F, V>(self, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.value_source(ValueSource::lazy(supplier))
    }

    fn value_source(mut self, value: ValueSource) -> Self {
        let slot = self.claim_entry();
        self.here(DirectiveKind::SetMapValue { slot, value })
    }

    pub fn values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values.into_iter().fold(self, |spec, value| spec.value(value.into()))
    }

    pub fn value_spec<F>(mut self, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        let slot = self.claim_entry();
        let path = PathExpression::root().index(slot).child(PathSegment::Value);
        self.nested(path, Self::build(f))
    }

    pub fn entry(self, key: impl Into<ValueSource>, value: impl Into<ValueSource>) -> Self {
        self.entry_source(key.into(), value.into())
    }

    pub fn entry_lazy<K, KV, V, VV>(self, key: K, value: V) -> Self
    where
        K: Fn() -> KV + Send + Sync + 'static,
        KV: Into<Value>,
        V: Fn() -> VV + Send + Sync + 'static,
        VV: Into<Value>,
    {
        self.entry_source(ValueSource::lazy(key), ValueSource::lazy(value))
    }

    fn entry_source(mut self, key: ValueSource, value: ValueSource) -> Self {
        let slot = self.claim_entry();
        self.here(DirectiveKind::SetEntry { slot, key, value })
    }

    pub fn entries<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        entries
            .into_iter()
            .fold(self, |spec, (key, value)| spec.entry(key.into(), value.into()))
    }

    /// New entry whose key is built by a nested spec
    pub fn entry_spec<F>(mut self, key: F, value: impl Into<ValueSource>) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        let slot = self.claim_entry();
        let slot_path = PathExpression::root().index(slot);
        let spec = self.nested(slot_path.child(PathSegment::Key), Self::build(key));
        spec.push(slot_path.child(PathSegment::Value), DirectiveKind::SetValue(value.into()))
    }

    /// New entry whose value is built by a nested spec
    pub fn entry_value_spec<F>(mut self, key: impl Into<ValueSource>, value: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        let slot = self.claim_entry();
        let slot_path = PathExpression::root().index(slot);
        let spec = self.push(slot_path.child(PathSegment::Key), DirectiveKind::SetValue(key.into()));
        spec.nested(slot_path.child(PathSegment::Value), Self::build(value))
    }

    // --- Every entry ---

    pub fn all_key(self, key: impl Into<ValueSource>) -> Self {
        self.here(DirectiveKind::SetAllKeys(key.into()))
    }

    pub fn all_key_lazy<F, V>(self, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.all_key(ValueSource::lazy(supplier))
    }

    pub fn all_key_spec<F>(self, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        let path = PathExpression::root().child(PathSegment::Wildcard).child(PathSegment::Key);
        self.nested(path, Self::build(f))
    }

    pub fn all_value(self, value: impl Into<ValueSource>) -> Self {
        self.here(DirectiveKind::SetAllValues(value.into()))
    }

    pub fn all_value_lazy<F, V>(self, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.all_value(ValueSource::lazy(supplier))
    }

    pub fn all_value_spec<F>(self, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        let path = PathExpression::root().child(PathSegment::Wildcard).child(PathSegment::Value);
        self.nested(path, Self::build(f))
    }

    pub fn all_entry(self, key: impl Into<ValueSource>, value: impl Into<ValueSource>) -> Self {
        self.here(DirectiveKind::SetAllEntries {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn all_entry_lazy<K, KV, V, VV>(self, key: K, value: V) -> Self
    where
        K: Fn() -> KV + Send + Sync + 'static,
        KV: Into<Value>,
        V: Fn() -> VV + Send + Sync + 'static,
        VV: Into<Value>,
    {
        self.all_entry(ValueSource::lazy(key), ValueSource::lazy(value))
    }

    // --- List elements ---

    pub fn list_element(self, index: usize, value: impl Into<ValueSource>) -> Self {
        self.push(PathExpression::root().index(index), DirectiveKind::SetValue(value.into()))
    }

    pub fn list_element_lazy<F, V>(self, index: usize, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.list_element(index, ValueSource::lazy(supplier))
    }

    pub fn list_element_spec<F>(self, index: usize, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        self.nested(PathExpression::root().index(index), Self::build(f))
    }

    pub fn all_list_element(self, value: impl Into<ValueSource>) -> Self {
        self.push(
            PathExpression::root().child(PathSegment::Wildcard),
            DirectiveKind::SetValue(value.into()),
        )
    }

    pub fn all_list_element_lazy<F, V>(self, supplier: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.all_list_element(ValueSource::lazy(supplier))
    }

    pub fn all_list_element_spec<F>(self, f: F) -> Self
    where
        F: FnOnce(InnerSpec) -> InnerSpec,
    {
        self.nested(PathExpression::root().child(PathSegment::Wildcard), Self::build(f))
    }

    // --- Checks ---

    pub fn post_condition<F>(self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.here(DirectiveKind::PostCondition(Arc::new(predicate)))
    }
}
