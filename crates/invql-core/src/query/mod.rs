//! Query execution for invql.
//!
//! A [`CompiledQuery`] is what the language crate produces from a query
//! string. [`QueryExecutor`] narrows a scope with its predicate and projects
//! the stored columns, and [`ResultProcessor`] turns the raw rows into
//! display-ready ones.

mod executor;
mod filter;
mod predicate;
mod result;

pub use executor::{read_field, QueryExecutor};
pub use filter::{extract_predicate_columns, RowEvaluator};
pub use predicate::{Condition, Conjunction, Lookup, Predicate, PredicateVisitor};
pub use result::{display_header, QueryResult, ResultProcessor};

use std::collections::HashSet;

use crate::registry::{DerivedColumn, FieldDescriptor};
use crate::value::Value;

/// One row of `(column, value)` pairs.
pub type Row = Vec<(String, Value)>;

/// A query ready to run: projection, flat condition list and the folded
/// predicate built from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    /// Requested fields in the order given, duplicates included.
    pub fields: Vec<FieldDescriptor>,
    pub conditions: Vec<Condition>,
    /// `conjunctions[i]` joins `conditions[i]` and `conditions[i + 1]`.
    pub conjunctions: Vec<Conjunction>,
    /// Columns the executor materialises before filtering.
    pub derived_columns: Vec<DerivedColumn>,
    /// `None` when the query has no conditions.
    pub predicate: Option<Predicate>,
}

impl CompiledQuery {
    /// Requested fields with repeated tokens collapsed, first occurrence wins.
    ///
    /// Execution reads each field once; the result header still follows
    /// [`CompiledQuery::fields`].
    pub fn projected_fields(&self) -> Vec<&FieldDescriptor> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter(|field| seen.insert(field.token.as_str()))
            .collect()
    }

    /// Whether the query filters at all.
    pub fn has_conditions(&self) -> bool {
        self.predicate.is_some()
    }
}
