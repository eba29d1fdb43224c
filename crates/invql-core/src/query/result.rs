//! Result post-processing.

use tracing::debug;

use super::{CompiledQuery, Row};
use crate::registry::FieldDescriptor;
use crate::store::{Inventory, IDENTITY_FIELD};
use crate::value::Value;

/// Display-ready query output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// `(token, display name)` per column, in request order.
    pub header: Vec<(String, String)>,
    /// One row per matched record, columns in header order.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Column tokens in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.header.iter().map(|(token, _)| token.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Header label for a field: all-lower-case display names are capitalised,
/// anything else is shown as registered.
pub fn display_header(field: &FieldDescriptor) -> String {
    let name = &field.display_name;
    if name.chars().any(char::is_uppercase) {
        return name.clone();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns executor rows into display rows.
pub struct ResultProcessor<'a> {
    inventory: &'a Inventory,
}

impl<'a> ResultProcessor<'a> {
    pub fn new(inventory: &'a Inventory) -> Self {
        Self { inventory }
    }

    /// Compute dynamic fields, apply display transforms and reorder each row
    /// to the header. The identifier column is kept only when requested.
    ///
    /// Each distinct field is computed once per row; a token requested twice
    /// appears twice in the header and repeats its value.
    pub fn process(&self, query: &CompiledQuery, rows: Vec<Row>) -> QueryResult {
        let header = query
            .fields
            .iter()
            .map(|f| (f.token.clone(), display_header(f)))
            .collect();

        let distinct = query.projected_fields();
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|row| {
                let values = self.process_row(&distinct, row);
                query
                    .fields
                    .iter()
                    .map(|field| {
                        let value = values
                            .iter()
                            .find(|(token, _)| *token == field.token)
                            .map(|(_, value)| value.clone())
                            .unwrap_or(Value::Null);
                        (field.token.clone(), value)
                    })
                    .collect()
            })
            .collect();

        debug!(
            columns = query.fields.len(),
            rows = rows.len(),
            "processed result"
        );
        QueryResult { header, rows }
    }

    fn process_row(&self, fields: &[&FieldDescriptor], mut row: Row) -> Row {
        let id = take(&mut row, IDENTITY_FIELD).and_then(|v| v.as_i64());

        fields
            .iter()
            .map(|field| {
                let raw = match (&field.compute, id) {
                    (Some(compute), Some(id)) => compute.call(self.inventory, id),
                    (Some(_), None) => Value::Null,
                    (None, Some(id)) if field.token == IDENTITY_FIELD => Value::Int(id),
                    (None, _) => take(&mut row, &field.token).unwrap_or(Value::Null),
                };
                let value = match &field.post_transform {
                    Some(transform) if !raw.is_null() => transform.apply(self.inventory, &raw),
                    _ => raw,
                };
                (field.token.clone(), value)
            })
            .collect()
    }
}

fn take(row: &mut Row, column: &str) -> Option<Value> {
    let pos = row.iter().position(|(name, _)| name == column)?;
    Some(row.swap_remove(pos).1)
}
