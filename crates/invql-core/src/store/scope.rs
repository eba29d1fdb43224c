//! Caller-supplied views over a table.

use super::inventory::{Inventory, Record};

/// An ordered, caller-authorised subset of one table.
///
/// The query engine never widens a scope; it only narrows it with the
/// compiled predicate.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    inventory: &'a Inventory,
    table: String,
    records: Vec<&'a Record>,
}

impl<'a> Scope<'a> {
    /// Every record of `table`.
    pub fn all(inventory: &'a Inventory, table: &str) -> Self {
        Self::filtered(inventory, table, |_| true)
    }

    /// The records of `table` for which `keep` holds, in stored order.
    pub fn filtered<F>(inventory: &'a Inventory, table: &str, keep: F) -> Self
    where
        F: Fn(&Record) -> bool,
    {
        Self {
            inventory,
            table: table.to_string(),
            records: inventory.table(table).iter().filter(|r| keep(r)).collect(),
        }
    }

    /// The store this scope was cut from.
    pub fn inventory(&self) -> &'a Inventory {
        self.inventory
    }

    /// Name of the scoped table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Records in scope, in the table's natural order.
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    /// Number of records in scope.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the scope has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Widening switches for the default host scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Include hosts whose `active` flag is false.
    pub include_inactive: bool,
    /// Include hosts flagged `administrative`.
    pub include_administrative: bool,
}
