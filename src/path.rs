//! Path expressions
//!
//! Paths address positions in a property tree:
//!
//! ```text
//! strMap                 property
//! values[0]              list element (or map entry slot)
//! values[*]  values.*    every element
//! mapValueMap.VALUE.KEY  key of the map held in every value
//! $                      the root
//! ```
//!
//! `KEY` and `VALUE` select the key or value side of a map entry. Written directly
//! after a map they apply to every entry.

use std::fmt;
use std::str::FromStr;

use crate::error::{GenerationError, GenerationResult};

/// One step of a path expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Property(String),
    Index(usize),
    Wildcard,
    Key,
    Value,
}

impl PathSegment {
    pub fn is_slot_selector(&self) -> bool {
        matches!(self, PathSegment::Index(_) | PathSegment::Wildcard)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{}", name),
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Wildcard => write!(f, "[*]"),
            PathSegment::Key => write!(f, "KEY"),
            PathSegment::Value => write!(f, "VALUE"),
        }
    }
}

/// An ordered sequence of segments, relative to the root of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathExpression {
    segments: Vec<PathSegment>,
}

impl PathExpression {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn parse(expression: &str) -> GenerationResult<Self> {
        expression.parse()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path with `segment` appended
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn property(&self, name: impl Into<String>) -> Self {
        self.child(PathSegment::Property(name.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// `self` followed by every segment of `other`
    pub fn join(&self, other: &PathExpression) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Whether both expressions can address the same node of some instance
    ///
    /// Exact indices and wildcards over the same container conflict with each other.
    pub fn conflicts_with(&self, other: &PathExpression) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (PathSegment::Wildcard, s) | (s, PathSegment::Wildcard) => s.is_slot_selector(),
                    (a, b) => a == b,
                })
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            let bracketed = matches!(segment, PathSegment::Index(_) | PathSegment::Wildcard);
            if i > 0 && !bracketed {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = GenerationError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| GenerationError::invalid_path(expression, reason);

        let mut rest = expression.trim();
        if let Some(stripped) = rest.strip_prefix('$') {
            rest = stripped.strip_prefix('.').unwrap_or(stripped);
            if stripped.starts_with('.') && rest.is_empty() {
                return Err(fail("trailing '.'"));
            }
        }

        let mut segments = Vec::new();
        let mut chars = rest.chars().peekable();
        // True right after a '.', where a name is mandatory
        let mut expect_name = false;

        while let Some(&c) = chars.peek() {
            match c {
                '[' => {
                    if expect_name {
                        return Err(fail("expected a property name after '.'"));
                    }
                    chars.next();
                    let mut inner = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(ch) => inner.push(ch),
                            None => return Err(fail("unterminated '['")),
                        }
                    }
                    let inner = inner.trim();
                    if inner == "*" {
                        segments.push(PathSegment::Wildcard);
                    } else {
                        let index = inner
                            .parse::<usize>()
                            .map_err(|_| fail("index must be a non-negative integer or '*'"))?;
                        segments.push(PathSegment::Index(index));
                    }
                }
                '.' => {
                    if expect_name || segments.is_empty() {
                        return Err(fail("empty segment"));
                    }
                    chars.next();
                    expect_name = true;
                }
                _ => {
                    if !segments.is_empty() && !expect_name {
                        return Err(fail("missing '.' between segments"));
                    }
                    let mut name = String::new();
                    while let Some(&ch) = chars.peek() {
                        if ch == '.' || ch == '[' {
                            break;
                        }
                        name.push(ch);
                        chars.next();
                    }
                    let segment = match name.as_str() {
                        "*" => PathSegment::Wildcard,
                        "KEY" => PathSegment::Key,
                        "VALUE" => PathSegment::Value,
                        _ if name.chars().all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$') => {
                            PathSegment::Property(name)
                        }
                        _ => return Err(fail("property names may contain only letters, digits, '_' and '$'")),
                    };
                    segments.push(segment);
                    expect_name = false;
                }
            }
        }

        if expect_name {
            return Err(fail("trailing '.'"));
        }
        Ok(PathExpression { segments })
    }
}

impl TryFrom<&str> for PathExpression {
    type Error = GenerationError;

    fn try_from(expression: &str) -> Result<Self, Self::Error> {
        expression.parse()
    }
}
