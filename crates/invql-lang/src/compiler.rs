//! Compiler from the query AST to a [`CompiledQuery`].

use tracing::debug;

use crate::ast::{ConditionExpr, Query};
use crate::error::CompileError;
use crate::operator::{resolve_lookup, resolve_unary, OperatorSymbol};
use crate::span::Spanned;
use invql_core::{
    CompiledQuery, Condition, Conjunction, DerivedColumn, FieldDescriptor, FieldKind, Inventory,
    Lookup, Predicate, Registry, Value,
};

/// Literal standing for the largest storable timestamp.
pub const INFINITE: &str = "infinite";

/// Resolves a parsed query against a registry.
///
/// The inventory is only read by value transforms that map display names to
/// stored identifiers.
pub struct Compiler<'a> {
    registry: &'a Registry,
    inventory: &'a Inventory,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a Registry, inventory: &'a Inventory) -> Self {
        Self {
            registry,
            inventory,
        }
    }

    /// Compile a parsed query.
    pub fn compile(&self, query: &Query) -> Result<CompiledQuery, CompileError> {
        let fields = query
            .fields
            .iter()
            .map(|field| self.resolve(field).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        let mut conditions = Vec::new();
        let mut conjunctions = Vec::new();
        let mut derived_columns = Vec::new();

        for (i, expr) in query.conditions.iter().enumerate() {
            if let Some(conjunction) = i.checked_sub(1).and_then(|j| query.conjunctions.get(j)) {
                conjunctions.push(conjunction.value);
            }

            let mut compiled = self
                .compile_condition(expr, &mut derived_columns)?
                .into_iter();
            if let Some(first) = compiled.next() {
                conditions.push(first);
            }
            // Rewritten conditions are joined with OR in place.
            for extra in compiled {
                conjunctions.push(Conjunction::Or);
                conditions.push(extra);
            }
        }

        let predicate = Predicate::fold(conditions.clone(), &conjunctions);
        if let Some(predicate) = &predicate {
            debug!(
                %predicate,
                derived_columns = derived_columns.len(),
                "compiled query"
            );
        }

        Ok(CompiledQuery {
            fields,
            conditions,
            conjunctions,
            derived_columns,
            predicate,
        })
    }

    fn resolve(&self, token: &Spanned<String>) -> Result<&'a FieldDescriptor, CompileError> {
        self.registry.resolve(&token.value).map_err(|_| {
            CompileError::unknown_field(self.registry.entity(), &token.value, token.span)
        })
    }

    /// One condition as written becomes one or two compiled conditions.
    fn compile_condition(
        &self,
        expr: &ConditionExpr,
        derived_columns: &mut Vec<DerivedColumn>,
    ) -> Result<Vec<Condition>, CompileError> {
        let token = expr.field();
        let field = self.resolve(token)?;
        if field.is_dynamic() {
            return Err(CompileError::unsupported_operation(&token.value, token.span));
        }

        match expr {
            ConditionExpr::Unary { negated, .. } => {
                let unary = resolve_unary(self.registry, field, *negated);
                if let Some(derived) = unary.derived {
                    if !derived_columns.contains(&derived) {
                        derived_columns.push(derived);
                    }
                }
                Ok(vec![unary.condition])
            }
            ConditionExpr::Comparison { op, value, .. } => {
                let lookup = self.resolve_operator(field, op)?;
                let value = self.convert_value(field, lookup, value)?;

                // A stored reference cannot be negated directly: `!= v` is
                // `> v OR < v`.
                if field.kind == FieldKind::Reference && lookup == Lookup::NotEqual {
                    return Ok(vec![
                        Condition::new(field.clone(), Lookup::Gt, value.clone()),
                        Condition::new(field.clone(), Lookup::Lt, value),
                    ]);
                }
                // Substring and prefix tests read what the user sees.
                let target = match lookup {
                    Lookup::IContains | Lookup::IStartsWith => {
                        field.display_variant().unwrap_or_else(|| field.clone())
                    }
                    _ => field.clone(),
                };
                Ok(vec![Condition::new(target, lookup, value)])
            }
        }
    }

    fn resolve_operator(
        &self,
        field: &FieldDescriptor,
        op: &Spanned<OperatorSymbol>,
    ) -> Result<Lookup, CompileError> {
        resolve_lookup(op.value, field.kind).ok_or_else(|| {
            CompileError::invalid_operator(
                op.value.as_str(),
                &field.token,
                field.kind.name(),
                op.span,
            )
        })
    }

    /// Turn a decoded literal into the value stored for `field`.
    fn convert_value(
        &self,
        field: &FieldDescriptor,
        lookup: Lookup,
        literal: &Spanned<String>,
    ) -> Result<Value, CompileError> {
        let text = literal.value.as_str();

        if field.kind == FieldKind::DateTime && text.eq_ignore_ascii_case(INFINITE) {
            return Ok(Value::infinite(!lookup.is_exact_match()));
        }
        if matches!(lookup, Lookup::IContains | Lookup::IStartsWith) {
            return Ok(Value::from(text));
        }
        if let Some(transform) = &field.pre_transform {
            return transform
                .apply(self.inventory, &field.token, text)
                .map_err(|e| CompileError::invalid_value(e.to_string(), literal.span));
        }

        Value::parse_literal(text, field.kind).map_err(|reason| {
            CompileError::invalid_value(
                format!(
                    "invalid value '{}' for field '{}': {}",
                    text, field.token, reason
                ),
                literal.span,
            )
        })
    }
}

/// Compile a parsed query against a registry and inventory.
pub fn compile(
    query: &Query,
    registry: &Registry,
    inventory: &Inventory,
) -> Result<CompiledQuery, CompileError> {
    Compiler::new(registry, inventory).compile(query)
}
