//! Dynamic value model
//!
//! Every generated instance is represented as a [`Value`] tree. Construction
//! strategies assemble values from their children and decompose them again, so the
//! same shape can be fed back into the resolver as directives.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::GenerationResult;

/// A generated (or user supplied) value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    List(Vec<Value>),
    /// Unordered collection with unique elements
    Set(Vec<Value>),
    /// Key/value pairs with unique keys; insertion order is kept for reproducibility
    Map(Vec<(Value, Value)>),
    /// Positional object such as a pair or triple
    Tuple(Vec<Value>),
    Object {
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    /// A deferred-computation box that yields the inner value when invoked
    Deferred(Box<Value>),
}

impl Value {
    /// Build an object value from `(name, value)` pairs
    pub fn object<N, I, V>(type_name: N, fields: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Value>,
    {
        Value::Object {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.into()))
                .collect(),
        }
    }

    /// Build a map value from key/value pairs
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn deferred(inner: impl Into<Value>) -> Self {
        Value::Deferred(Box::new(inner.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of a list, set or tuple
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Field of an object, or positional member of a tuple by `first`/`second`/`third`
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object { fields, .. } => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            Value::Tuple(items) => tuple_position(name).and_then(|i| items.get(i)),
            Value::Deferred(inner) => inner.field(name),
            _ => None,
        }
    }

    /// Look up a map entry by key
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Unwrap a deferred box, as invoking the supplier would
    pub fn invoke(&self) -> &Value {
        match self {
            Value::Deferred(inner) => inner.invoke(),
            other => other,
        }
    }

    /// Number of elements or entries for containers, `None` otherwise
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn to_json(&self) -> GenerationResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Convert a JSON document into a value; JSON objects become untyped objects
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(fields) => Value::Object {
                type_name: String::new(),
                fields: fields.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect(),
            },
        }
    }

    /// Convert any serializable Rust value
    pub fn from_serializable<T: Serialize>(value: &T) -> GenerationResult<Self> {
        Ok(Value::from_json(serde_json::to_value(value)?))
    }
}

pub(crate) fn tuple_position(name: &str) -> Option<usize> {
    match name {
        "first" => Some(0),
        "second" => Some(1),
        "third" => Some(2),
        _ => None,
    }
}

/// Multiset comparison for unordered containers
fn same_elements<T, F>(a: &[T], b: &[T], eq: F) -> bool
where
    F: Fn(&T, &T) -> bool,
{
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        match b.iter().enumerate().position(|(i, y)| !used[i] && eq(x, y)) {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
                *a >= 0 && *a as u64 == *b
            }
            // Bitwise, so NaN equals NaN and -0.0 differs from 0.0
            (Value::Float(a), Value::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a.to_bits() == b.to_bits()
                }
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => same_elements(a, b, |x, y| x == y),
            (Value::Map(a), Value::Map(b)) => same_elements(a, b, |x, y| x.0 == y.0 && x.1 == y.1),
            (
                Value::Object { type_name: ta, fields: fa },
                Value::Object { type_name: tb, fields: fb },
            ) => ta == tb && same_elements(fa, fb, |x, y| x.0 == y.0 && x.1 == y.1),
            (Value::Deferred(a), Value::Deferred(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Object { fields, .. } => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Deferred(inner) => inner.serialize(serializer),
        }
    }
}

macro_rules! value_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! value_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(v as u64)
            }
        })*
    };
}

value_from_signed!(i8, i16, i32, i64, isize);
value_from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into()])
    }
}
