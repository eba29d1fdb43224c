//! Conditions and the predicate tree they fold into.

use std::fmt;

use crate::registry::FieldDescriptor;
use crate::value::Value;

/// Comparison semantics of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// Case-insensitive equality.
    IExact,
    /// Equality by identity (case-sensitive for text).
    Exact,
    /// Case-insensitive substring.
    IContains,
    /// Case-insensitive prefix.
    IStartsWith,
    /// Inequality; a null value counts as different.
    NotEqual,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Null test; the condition value is the expected nullness.
    IsNull,
}

impl Lookup {
    /// Column suffix naming this lookup, e.g. `__icontains`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Lookup::IExact => "__iexact",
            Lookup::Exact => "__exact",
            Lookup::IContains => "__icontains",
            Lookup::IStartsWith => "__istartswith",
            Lookup::NotEqual => "__ne",
            Lookup::Gt => "__gt",
            Lookup::Lt => "__lt",
            Lookup::Gte => "__gte",
            Lookup::Lte => "__lte",
            Lookup::IsNull => "__isnull",
        }
    }

    /// Whether this lookup is an exact (identity) match.
    pub fn is_exact_match(&self) -> bool {
        matches!(self, Lookup::Exact)
    }
}

/// One resolved `(field, lookup, value)` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: FieldDescriptor,
    pub lookup: Lookup,
    pub value: Value,
}

impl Condition {
    pub fn new(field: FieldDescriptor, lookup: Lookup, value: impl Into<Value>) -> Self {
        Self {
            field,
            lookup,
            value: value.into(),
        }
    }

    /// Column the condition reads from an evaluation row.
    pub fn column(&self) -> String {
        self.field.column()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}=", self.column(), self.lookup.suffix())?;
        match &self.value {
            Value::Null => f.write_str("null"),
            Value::Text(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// Boolean connective between two consecutive conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    /// Parse `and`/`or` in any letter case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Conjunction::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Conjunction::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => f.write_str("AND"),
            Conjunction::Or => f.write_str("OR"),
        }
    }
}

/// A composable boolean test over a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Condition(Condition),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// Backend-specific evaluation of a predicate tree.
pub trait PredicateVisitor {
    type Output;

    fn visit_condition(&mut self, condition: &Condition) -> Self::Output;
    fn visit_and(&mut self, left: &Predicate, right: &Predicate) -> Self::Output;
    fn visit_or(&mut self, left: &Predicate, right: &Predicate) -> Self::Output;
}

impl Predicate {
    /// Dispatch to the visitor method for this node.
    pub fn accept<V: PredicateVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Predicate::Condition(condition) => visitor.visit_condition(condition),
            Predicate::And(left, right) => visitor.visit_and(left, right),
            Predicate::Or(left, right) => visitor.visit_or(left, right),
        }
    }

    /// Fold conditions left to right, joining condition `i + 1` to everything
    /// before it with `conjunctions[i]`. No precedence applies: `a OR b AND c`
    /// is `(a OR b) AND c`.
    ///
    /// Returns `None` when there are no conditions. Surplus conjunctions are
    /// ignored.
    pub fn fold(conditions: Vec<Condition>, conjunctions: &[Conjunction]) -> Option<Predicate> {
        let mut rest = conditions.into_iter();
        let first = Predicate::Condition(rest.next()?);
        Some(
            rest.zip(conjunctions)
                .fold(first, |acc, (condition, conjunction)| {
                    let next = Box::new(Predicate::Condition(condition));
                    match conjunction {
                        Conjunction::And => Predicate::And(Box::new(acc), next),
                        Conjunction::Or => Predicate::Or(Box::new(acc), next),
                    }
                }),
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Condition(condition) => write!(f, "{}", condition),
            Predicate::And(left, right) => write!(f, "({} AND {})", left, right),
            Predicate::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}
