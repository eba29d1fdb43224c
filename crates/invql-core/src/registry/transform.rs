//! Value transforms between query/display form and storage form.

use crate::error::Error;
use crate::store::Inventory;
use crate::value::Value;

/// Converts a query literal into the stored representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreTransform {
    /// Resolve a display name to the id of the record in `table` whose
    /// `field` equals it.
    LookupId {
        table: &'static str,
        field: &'static str,
    },
}

impl PreTransform {
    /// Apply to a decoded query literal for the field named `token`.
    pub fn apply(
        &self,
        inventory: &Inventory,
        token: &str,
        literal: &str,
    ) -> Result<Value, Error> {
        match self {
            PreTransform::LookupId { table, field } => inventory
                .find_id(table, field, literal)
                .map(Value::Int)
                .ok_or_else(|| {
                    Error::invalid_value(
                        token,
                        literal,
                        format!("no {} record with {} '{}'", table, field, literal),
                    )
                }),
        }
    }
}

/// Converts a stored value into its display representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostTransform {
    /// Replace a referenced id with `field` of the record in `table`.
    LookupField {
        table: &'static str,
        field: &'static str,
    },
    /// Show the open-ended timestamp sentinel as `infinite`.
    InfiniteSentinel,
}

impl PostTransform {
    /// Apply to a non-null stored value. Values with no display form are
    /// returned unchanged.
    pub fn apply(&self, inventory: &Inventory, value: &Value) -> Value {
        match self {
            PostTransform::LookupField { table, field } => value
                .as_i64()
                .and_then(|id| inventory.get(table, id))
                .and_then(|record| record.get(field))
                .unwrap_or_else(|| value.clone()),
            PostTransform::InfiniteSentinel => {
                if value.is_infinite() {
                    Value::from("infinite")
                } else {
                    value.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldKind;
    use crate::store::Record;

    const ARCH_ID: PreTransform = PreTransform::LookupId {
        table: "architectures",
        field: "name",
    };
    const ARCH_NAME: PostTransform = PostTransform::LookupField {
        table: "architectures",
        field: "name",
    };

    fn inventory() -> Inventory {
        Inventory::from_tables([(
            "architectures",
            vec![
                Record::new(1).with("name", "x86_64"),
                Record::new(2).with("name", "ppc64le"),
            ],
        )])
    }

    #[test]
    fn test_reference_round_trip() {
        let inventory = inventory();
        for name in ["x86_64", "ppc64le"] {
            let stored = ARCH_ID.apply(&inventory, "architecture", name).unwrap();
            assert_eq!(ARCH_NAME.apply(&inventory, &stored), Value::from(name));
        }
    }

    #[test]
    fn test_unknown_reference_name() {
        let err = ARCH_ID.apply(&inventory(), "architecture", "sparc").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert!(err.to_string().contains("sparc"));
    }

    #[test]
    fn test_dangling_reference_passes_through() {
        assert_eq!(ARCH_NAME.apply(&inventory(), &Value::Int(9)), Value::Int(9));
    }

    #[test]
    fn test_infinite_sentinel_display() {
        let inventory = inventory();
        let shown = PostTransform::InfiniteSentinel.apply(&inventory, &Value::infinite(true));
        assert_eq!(shown, Value::from("infinite"));

        let ordinary = Value::parse_literal("2024-01-01", FieldKind::DateTime).unwrap();
        assert_eq!(
            PostTransform::InfiniteSentinel.apply(&inventory, &ordinary),
            ordinary
        );
    }
}
