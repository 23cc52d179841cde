//! # Specimen
//!
//! Path-addressed generation of arbitrary object graphs for tests.
//!
//! A type is described once ([`TypeDescriptor`], or [`Describe`] for Rust types),
//! expanded into a [`PropertyTree`], and customized through an
//! [`ArbitraryBuilder`] whose directives address nodes by path (`a.b[2].KEY`,
//! `items[*]`). Directives form an append-only log; on every `sample()` the
//! [`Resolver`] turns the log into a plan in which the most recent directive
//! targeting a node wins, and the [`Sampler`] fills everything left open from a
//! seeded [`RandomnessSource`].
//!
//! ```
//! use specimen::{Fixture, InnerSpec, TypeDescriptor, Value};
//!
//! let order = TypeDescriptor::record("Order")
//!     .property("id", TypeDescriptor::long())
//!     .property("tags", TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::int()));
//!
//! let fixture = Fixture::builder().seed(42).build();
//! let value = fixture
//!     .builder_for(order)?
//!     .set("id", 7i64)
//!     .set_inner(InnerSpec::new().property_spec("tags", |tags| tags.entry("priority", 1).size(1)))
//!     .sample()?;
//!
//! assert_eq!(value.field("id"), Some(&Value::from(7i64)));
//! let tags = value.field("tags").unwrap();
//! assert_eq!(tags.get(&Value::from("priority")), Some(&Value::from(1)));
//! # Ok::<(), specimen::GenerationError>(())
//! ```

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod directive;
pub mod error;
pub mod fixture;
pub mod path;
pub mod resolver;
pub mod sampler;
pub mod snapshot;
pub mod source;
pub mod strategy;
pub mod tree;
pub mod value;

pub use builder::ArbitraryBuilder;
pub use config::{GenerationConfig, SizeRange};
pub use descriptor::{descriptor_of, Describe, ObjectShape, ScalarKind, TypeDescriptor, TypeKind, TypeRef, WrapperKind};
pub use directive::{Directive, DirectiveKind, DirectiveLog, InnerSpec, ValueSource};
pub use error::{GenerationError, GenerationResult};
pub use fixture::{Fixture, FixtureBuilder};
pub use path::{PathExpression, PathSegment};
pub use resolver::{PlanNode, ResolvedPlan, Resolver};
pub use sampler::Sampler;
pub use snapshot::FixedSnapshot;
pub use source::{RandomnessSource, SeededSource};
pub use strategy::{BuiltinStrategy, Children, ConstructionStrategy, StrategyRegistry};
pub use tree::{NodeId, NodeRole, PropertyNode, PropertyTree, PropertyTreeBuilder};
pub use value::Value;
