//! Scoped query execution.

use std::collections::HashSet;

use tracing::debug;

use super::filter::RowEvaluator;
use super::{CompiledQuery, Row};
use crate::error::Error;
use crate::registry::FieldDescriptor;
use crate::store::{Inventory, Record, Scope, IDENTITY_FIELD};
use crate::value::Value;

/// Read a stored field for a record, following its related hops.
///
/// A broken hop (null or dangling reference) reads as null. The value is
/// coerced to the field's kind. Dynamic fields read as null; they are
/// computed by the result processor.
pub fn read_field(inventory: &Inventory, record: &Record, field: &FieldDescriptor) -> Value {
    if field.is_dynamic() {
        return Value::Null;
    }
    let mut current = record;
    for hop in &field.related {
        let target = current
            .get(&hop.field)
            .and_then(|v| v.as_i64())
            .and_then(|id| inventory.get(&hop.table, id));
        match target {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current
        .get(&field.storage_field)
        .unwrap_or(Value::Null)
        .coerce(field.kind)
}

/// Runs compiled queries against a caller scope.
pub struct QueryExecutor<'s, 'a> {
    scope: &'s Scope<'a>,
}

impl<'s, 'a> QueryExecutor<'s, 'a> {
    /// Create an executor over a scope.
    pub fn new(scope: &'s Scope<'a>) -> Self {
        Self { scope }
    }

    /// Filter the scope and project the requested stored fields.
    ///
    /// Every row starts with the record identifier under `id`, followed by
    /// the stored requested fields keyed by token. Dynamic fields are left to
    /// [`super::ResultProcessor`].
    pub fn execute(&self, query: &CompiledQuery) -> Result<Vec<Row>, Error> {
        Self::check_filterable(query)?;

        if self.scope.is_empty() {
            debug!(table = self.scope.table(), "scope is empty");
            return Err(Error::EmptyResult);
        }

        let inventory = self.scope.inventory();
        let projected: Vec<&FieldDescriptor> = query
            .projected_fields()
            .into_iter()
            .filter(|f| !f.is_dynamic() && f.token != IDENTITY_FIELD)
            .collect();

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for record in self.scope.records() {
            if !seen.insert(record.id) {
                continue;
            }
            if let Some(predicate) = &query.predicate {
                let eval_row = Self::evaluation_row(inventory, record, query);
                if !RowEvaluator::evaluate(predicate, &eval_row) {
                    continue;
                }
            }

            let mut row = Vec::with_capacity(projected.len() + 1);
            row.push((IDENTITY_FIELD.to_string(), Value::Int(record.id)));
            for field in &projected {
                row.push((field.token.clone(), read_field(inventory, record, field)));
            }
            rows.push(row);
        }

        debug!(
            table = self.scope.table(),
            scope = self.scope.len(),
            matched = rows.len(),
            "executed query"
        );

        if rows.is_empty() {
            return Err(Error::EmptyResult);
        }
        Ok(rows)
    }

    /// Dynamic fields have no stored value to filter on.
    fn check_filterable(query: &CompiledQuery) -> Result<(), Error> {
        let dynamic = query
            .conditions
            .iter()
            .map(|c| &c.field)
            .chain(query.derived_columns.iter().map(|d| &d.source))
            .find(|f| f.is_dynamic());
        match dynamic {
            Some(field) => Err(Error::UnsupportedOperation(field.token.clone())),
            None => Ok(()),
        }
    }

    /// Derived columns first, then every column a condition reads.
    fn evaluation_row(inventory: &Inventory, record: &Record, query: &CompiledQuery) -> Row {
        let mut row: Row = query
            .derived_columns
            .iter()
            .map(|derived| {
                let source = read_field(inventory, record, &derived.source);
                (derived.name.clone(), derived.evaluate(&source))
            })
            .collect();

        for condition in &query.conditions {
            let column = condition.column();
            if row.iter().any(|(name, _)| *name == column) {
                continue;
            }
            let value = read_field(inventory, record, &condition.field);
            row.push((column, value));
        }
        row
    }
}
