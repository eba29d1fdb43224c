//! Abstract syntax tree for query strings.
//!
//! The tree is purely syntactic: field tokens are unresolved and values are
//! decoded text. The compiler resolves both against a registry.

use std::fmt;

use crate::operator::OperatorSymbol;
use crate::span::{Span, Spanned};
use invql_core::Conjunction;

/// A parsed query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Requested field tokens in order, duplicates kept.
    pub fields: Vec<Spanned<String>>,
    pub conditions: Vec<ConditionExpr>,
    /// `conjunctions[i]` joins `conditions[i]` and `conditions[i + 1]`.
    pub conjunctions: Vec<Spanned<Conjunction>>,
    pub span: Span,
}

impl Query {
    /// Whether the query has a `where` section.
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }
}

/// One condition as written.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpr {
    /// `field operator value`.
    Comparison {
        field: Spanned<String>,
        op: Spanned<OperatorSymbol>,
        /// Value with `%20` decoded and quotes stripped.
        value: Spanned<String>,
    },
    /// `field` or `!field`; operator and value follow from the field kind.
    Unary {
        field: Spanned<String>,
        negated: bool,
    },
}

impl ConditionExpr {
    /// The field token.
    pub fn field(&self) -> &Spanned<String> {
        match self {
            ConditionExpr::Comparison { field, .. } | ConditionExpr::Unary { field, .. } => field,
        }
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionExpr::Comparison { field, op, value } => {
                write!(f, "{} {} {:?}", field.value, op.value, value.value)
            }
            ConditionExpr::Unary { field, negated } => {
                if *negated {
                    f.write_str("!")?;
                }
                f.write_str(&field.value)
            }
        }
    }
}
