//! invql core - field registry, record scope and query execution.
//!
//! This crate holds everything the query language compiles *into*: the
//! catalog of queryable fields, the in-memory record store and the scoped
//! view a caller is allowed to see, the predicate tree, and the executor and
//! post-processor that turn a compiled query into display-ready rows.

pub mod error;
pub mod query;
pub mod registry;
pub mod store;
pub mod value;

pub use error::Error;
pub use query::{
    CompiledQuery, Condition, Conjunction, Lookup, Predicate, PredicateVisitor, QueryExecutor,
    QueryResult, ResultProcessor, Row,
};
pub use registry::{
    host_registry, host_scope, ComputeFn, DerivedColumn, DerivedFunction, FieldDescriptor,
    FieldKind, PostTransform, PreTransform, Registry, RelatedHop, HOSTS_TABLE,
};
pub use store::{Inventory, Record, RecordId, Scope, ScopeOptions};
pub use value::Value;
