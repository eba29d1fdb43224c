//! Predicate evaluation over materialised rows.
//!
//! The executor builds one row per record holding every column the predicate
//! reads, then runs [`RowEvaluator`] over it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::predicate::{Condition, Lookup, Predicate, PredicateVisitor};
use crate::value::Value;

/// Collect every column a predicate reads.
pub fn extract_predicate_columns(predicate: &Predicate) -> BTreeSet<String> {
    let mut collector = ColumnCollector::default();
    predicate.accept(&mut collector);
    collector.columns
}

#[derive(Default)]
struct ColumnCollector {
    columns: BTreeSet<String>,
}

impl PredicateVisitor for ColumnCollector {
    type Output = ();

    fn visit_condition(&mut self, condition: &Condition) {
        self.columns.insert(condition.column());
    }

    fn visit_and(&mut self, left: &Predicate, right: &Predicate) {
        left.accept(self);
        right.accept(self);
    }

    fn visit_or(&mut self, left: &Predicate, right: &Predicate) {
        left.accept(self);
        right.accept(self);
    }
}

/// Evaluates a predicate against one row of `(column, value)` pairs.
pub struct RowEvaluator<'r> {
    row: &'r [(String, Value)],
}

impl<'r> RowEvaluator<'r> {
    pub fn new(row: &'r [(String, Value)]) -> Self {
        Self { row }
    }

    /// Evaluate `predicate` against the row.
    pub fn evaluate(predicate: &Predicate, row: &'r [(String, Value)]) -> bool {
        predicate.accept(&mut Self::new(row))
    }

    fn get_field_value(&self, column: &str) -> Option<&'r Value> {
        self.row
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    fn matches(field_value: &Value, lookup: Lookup, value: &Value) -> bool {
        match lookup {
            Lookup::IsNull => field_value.is_null() == value.as_bool().unwrap_or(true),
            Lookup::NotEqual => field_value.is_null() || !field_value.eq_ignore_case(value),
            _ if field_value.is_null() => false,
            Lookup::IExact => field_value.eq_ignore_case(value),
            Lookup::Exact => field_value.compare(value) == Some(Ordering::Equal),
            Lookup::IContains => Self::text_match(field_value, value, |s, p| s.contains(p)),
            Lookup::IStartsWith => Self::text_match(field_value, value, |s, p| s.starts_with(p)),
            Lookup::Gt => Self::ordering(field_value, value, Ordering::is_gt),
            Lookup::Lt => Self::ordering(field_value, value, Ordering::is_lt),
            Lookup::Gte => Self::ordering(field_value, value, Ordering::is_ge),
            Lookup::Lte => Self::ordering(field_value, value, Ordering::is_le),
        }
    }

    /// Case-insensitive text test over the textual forms of both sides.
    fn text_match<F>(field_value: &Value, value: &Value, test: F) -> bool
    where
        F: FnOnce(&str, &str) -> bool,
    {
        match (field_value.text_form(), value.text_form()) {
            (Some(s), Some(p)) => test(&s.to_lowercase(), &p.to_lowercase()),
            _ => false,
        }
    }

    fn ordering<F>(field_value: &Value, value: &Value, test: F) -> bool
    where
        F: FnOnce(Ordering) -> bool,
    {
        field_value.compare(value).map(test).unwrap_or(false)
    }
}

impl PredicateVisitor for RowEvaluator<'_> {
    type Output = bool;

    fn visit_condition(&mut self, condition: &Condition) -> bool {
        let field_value = self.get_field_value(&condition.column()).unwrap_or(&Value::Null);
        Self::matches(field_value, condition.lookup, &condition.value)
    }

    fn visit_and(&mut self, left: &Predicate, right: &Predicate) -> bool {
        left.accept(self) && right.accept(self)
    }

    fn visit_or(&mut self, left: &Predicate, right: &Predicate) -> bool {
        left.accept(self) || right.accept(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::Conjunction;
    use crate::registry::{FieldDescriptor, FieldKind};

    fn make_row(fields: Vec<(&str, Value)>) -> Vec<(String, Value)> {
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn check(kind: FieldKind, lookup: Lookup, stored: Value, value: Value) -> bool {
        let predicate = Predicate::Condition(Condition::new(
            FieldDescriptor::stored("f", kind),
            lookup,
            value,
        ));
        RowEvaluator::evaluate(&predicate, &make_row(vec![("f", stored)]))
    }

    #[test]
    fn test_iexact_and_exact() {
        use FieldKind::Text;
        assert!(check(Text, Lookup::IExact, "Intel".into(), "INTEL".into()));
        assert!(!check(Text, Lookup::Exact, "Intel".into(), "INTEL".into()));
        assert!(check(Text, Lookup::Exact, "Intel".into(), "Intel".into()));
        assert!(check(
            FieldKind::Numeric,
            Lookup::IExact,
            Value::Int(2),
            Value::Float(2.0)
        ));
    }

    #[test]
    fn test_contains_and_prefix() {
        use FieldKind::Text;
        let model = Value::from("Intel(R) Xeon(R) CPU E5-2630");
        assert!(check(Text, Lookup::IContains, model.clone(), "xeon".into()));
        assert!(!check(Text, Lookup::IContains, model.clone(), "amd".into()));
        assert!(check(Text, Lookup::IStartsWith, model.clone(), "intel".into()));
        assert!(!check(Text, Lookup::IStartsWith, model, "xeon".into()));
        assert!(!check(Text, Lookup::IContains, Value::Null, "x".into()));
    }

    #[test]
    fn test_not_equal_matches_null() {
        use FieldKind::Text;
        assert!(check(Text, Lookup::NotEqual, "a".into(), "b".into()));
        assert!(!check(Text, Lookup::NotEqual, "a".into(), "A".into()));
        assert!(check(Text, Lookup::NotEqual, Value::Null, "a".into()));
    }

    #[test]
    fn test_ordering() {
        use FieldKind::Numeric;
        assert!(check(Numeric, Lookup::Gt, Value::Int(4), Value::Int(2)));
        assert!(!check(Numeric, Lookup::Lt, Value::Int(4), Value::Int(2)));
        assert!(check(Numeric, Lookup::Gte, Value::Int(2), Value::Int(2)));
        assert!(check(Numeric, Lookup::Lte, Value::Float(1.5), Value::Int(2)));
        assert!(!check(Numeric, Lookup::Gt, Value::Null, Value::Int(0)));
        assert!(!check(Numeric, Lookup::Gt, "x".into(), Value::Int(0)));
    }

    #[test]
    fn test_is_null() {
        use FieldKind::DateTime;
        assert!(check(DateTime, Lookup::IsNull, Value::Null, Value::Bool(true)));
        assert!(!check(DateTime, Lookup::IsNull, Value::Null, Value::Bool(false)));
        assert!(check(
            DateTime,
            Lookup::IsNull,
            Value::infinite(false),
            Value::Bool(false)
        ));
    }

    #[test]
    fn test_missing_column_reads_as_null() {
        let predicate = Predicate::Condition(Condition::new(
            FieldDescriptor::stored("missing", FieldKind::Text),
            Lookup::IsNull,
            true,
        ));
        assert!(RowEvaluator::evaluate(&predicate, &make_row(vec![])));
    }

    #[test]
    fn test_and_or() {
        let row = make_row(vec![("a", Value::Int(1)), ("b", Value::Int(2))]);
        let a = Condition::new(FieldDescriptor::stored("a", FieldKind::Numeric), Lookup::Gt, 5);
        let b = Condition::new(FieldDescriptor::stored("b", FieldKind::Numeric), Lookup::Gt, 1);

        let or = Predicate::fold(vec![a.clone(), b.clone()], &[Conjunction::Or]).unwrap();
        assert!(RowEvaluator::evaluate(&or, &row));

        let and = Predicate::fold(vec![a, b], &[Conjunction::And]).unwrap();
        assert!(!RowEvaluator::evaluate(&and, &row));
        assert_eq!(
            extract_predicate_columns(&and),
            ["a", "b"].iter().map(|s| s.to_string()).collect()
        );
    }
}
