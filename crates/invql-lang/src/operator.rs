//! Operator resolution: symbol plus field kind to lookup semantics.

use std::fmt;

use invql_core::{Condition, DerivedColumn, FieldDescriptor, FieldKind, Lookup, Registry, Value};

/// Operator symbols accepted between a field and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorSymbol {
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `=~`
    Contains,
    /// `=*`
    StartsWith,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl OperatorSymbol {
    pub const ALL: [OperatorSymbol; 9] = [
        OperatorSymbol::Eq,
        OperatorSymbol::EqEq,
        OperatorSymbol::Contains,
        OperatorSymbol::StartsWith,
        OperatorSymbol::Ne,
        OperatorSymbol::Gt,
        OperatorSymbol::Lt,
        OperatorSymbol::Ge,
        OperatorSymbol::Le,
    ];

    /// Parse an operator word.
    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == word)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorSymbol::Eq => "=",
            OperatorSymbol::EqEq => "==",
            OperatorSymbol::Contains => "=~",
            OperatorSymbol::StartsWith => "=*",
            OperatorSymbol::Ne => "!=",
            OperatorSymbol::Gt => ">",
            OperatorSymbol::Lt => "<",
            OperatorSymbol::Ge => ">=",
            OperatorSymbol::Le => "<=",
        }
    }

    /// `>`, `<`, `>=` and `<=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            OperatorSymbol::Gt | OperatorSymbol::Lt | OperatorSymbol::Ge | OperatorSymbol::Le
        )
    }
}

impl fmt::Display for OperatorSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup for an operator applied to a field of `kind`.
///
/// `None` when the kind does not support the operator (ordering on anything
/// but numbers, dates and timestamps).
pub fn resolve_lookup(symbol: OperatorSymbol, kind: FieldKind) -> Option<Lookup> {
    let lookup = match symbol {
        OperatorSymbol::Eq | OperatorSymbol::EqEq => match kind {
            FieldKind::DateTime | FieldKind::Reference => Lookup::Exact,
            FieldKind::Boolean
            | FieldKind::Text
            | FieldKind::LongText
            | FieldKind::Date
            | FieldKind::Numeric => Lookup::IExact,
        },
        OperatorSymbol::Contains => Lookup::IContains,
        OperatorSymbol::StartsWith => Lookup::IStartsWith,
        OperatorSymbol::Ne => Lookup::NotEqual,
        OperatorSymbol::Gt if kind.is_ordered() => Lookup::Gt,
        OperatorSymbol::Lt if kind.is_ordered() => Lookup::Lt,
        OperatorSymbol::Ge if kind.is_ordered() => Lookup::Gte,
        OperatorSymbol::Le if kind.is_ordered() => Lookup::Lte,
        OperatorSymbol::Gt | OperatorSymbol::Lt | OperatorSymbol::Ge | OperatorSymbol::Le => {
            return None
        }
    };
    Some(lookup)
}

/// A bare (optionally negated) field turned into a condition, plus the
/// derived column it needs, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryCondition {
    pub condition: Condition,
    pub derived: Option<DerivedColumn>,
}

/// Derive the condition for a bare field.
///
/// Nullable fields test presence, booleans test truth, non-nullable text
/// tests for a non-empty value through its length column, and anything else
/// falls back to the presence test.
pub fn resolve_unary(
    registry: &Registry,
    field: &FieldDescriptor,
    negated: bool,
) -> UnaryCondition {
    let presence = || UnaryCondition {
        condition: Condition::new(field.clone(), Lookup::IsNull, negated),
        derived: None,
    };

    if field.nullable {
        return presence();
    }

    match field.kind {
        FieldKind::Boolean => UnaryCondition {
            condition: Condition::new(field.clone(), Lookup::Exact, !negated),
            derived: None,
        },
        FieldKind::Text | FieldKind::LongText => match registry.length_annotated_variant(field) {
            Some((length, derived)) => {
                let (lookup, value) = if negated {
                    (Lookup::Exact, Value::Int(0))
                } else {
                    (Lookup::Gt, Value::Int(0))
                };
                UnaryCondition {
                    condition: Condition::new(length, lookup, value),
                    derived: Some(derived),
                }
            }
            None => presence(),
        },
        FieldKind::Reference | FieldKind::Date | FieldKind::DateTime | FieldKind::Numeric => {
            presence()
        }
    }
}
