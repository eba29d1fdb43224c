//! Tables of records and their look-up indexes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::value::Value;

/// Identifier of a record within its table.
pub type RecordId = i64;

/// Name of the identity attribute every record carries.
pub const IDENTITY_FIELD: &str = "id";

/// A stored record: an identifier plus named attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier, unique within the table.
    pub id: RecordId,
    /// Attribute values keyed by storage name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with no attributes.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Set an attribute.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Get an attribute by storage name. The identity is readable as `id`.
    pub fn get(&self, field: &str) -> Option<Value> {
        if field == IDENTITY_FIELD {
            Some(Value::Int(self.id))
        } else {
            self.fields.get(field).cloned()
        }
    }
}

/// On-disk layout of an inventory document.
#[derive(Debug, Deserialize)]
struct InventoryDocument {
    tables: BTreeMap<String, Vec<Record>>,
}

/// Named tables of records with look-up indexes.
#[derive(Debug, Default)]
pub struct Inventory {
    tables: BTreeMap<String, Vec<Record>>,
    /// table -> id -> position.
    positions: HashMap<String, HashMap<RecordId, usize>>,
    /// (table, field, text) -> id, for exact name look-ups.
    names: HashMap<(String, String, String), RecordId>,
    /// (table, field, referenced id) -> positions of referencing records.
    references: HashMap<(String, String, RecordId), Vec<usize>>,
}

impl Inventory {
    /// Build an inventory from tables of records.
    pub fn new(tables: BTreeMap<String, Vec<Record>>) -> Self {
        let mut inventory = Self {
            tables,
            ..Self::default()
        };
        inventory.build_indexes();
        inventory
    }

    /// Build an inventory from `(table, records)` pairs.
    pub fn from_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Record>)>,
        S: Into<String>,
    {
        Self::new(
            tables
                .into_iter()
                .map(|(name, records)| (name.into(), records))
                .collect(),
        )
    }

    /// Decode an inventory document: `{"tables": {"hosts": [{"id": 1, ...}]}}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let document: InventoryDocument = serde_json::from_str(json)?;
        Ok(Self::new(document.tables))
    }

    /// Read and decode an inventory document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let inventory = Self::from_json(&content)?;
        debug!(
            path = %path.as_ref().display(),
            tables = inventory.tables.len(),
            "loaded inventory"
        );
        Ok(inventory)
    }

    fn build_indexes(&mut self) {
        for (table, records) in &self.tables {
            let positions = self.positions.entry(table.clone()).or_default();
            for (pos, record) in records.iter().enumerate() {
                positions.insert(record.id, pos);
                for (field, value) in &record.fields {
                    match value {
                        Value::Text(text) => {
                            self.names
                                .entry((table.clone(), field.clone(), text.clone()))
                                .or_insert(record.id);
                        }
                        Value::Int(id) => {
                            self.references
                                .entry((table.clone(), field.clone(), *id))
                                .or_default()
                                .push(pos);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// All records of a table in stored order; empty if the table is unknown.
    pub fn table(&self, name: &str) -> &[Record] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Point look-up by identifier.
    pub fn get(&self, table: &str, id: RecordId) -> Option<&Record> {
        let pos = *self.positions.get(table)?.get(&id)?;
        self.tables.get(table)?.get(pos)
    }

    /// Identifier of the first record whose `field` equals `text` exactly.
    pub fn find_id(&self, table: &str, field: &str, text: &str) -> Option<RecordId> {
        self.names
            .get(&(table.to_string(), field.to_string(), text.to_string()))
            .copied()
    }

    /// Records of `table` whose `field` references `id`, in stored order.
    pub fn referencing<'a>(
        &'a self,
        table: &str,
        field: &str,
        id: RecordId,
    ) -> impl Iterator<Item = &'a Record> + 'a {
        let records = self.table(table);
        self.references
            .get(&(table.to_string(), field.to_string(), id))
            .into_iter()
            .flatten()
            .filter_map(move |pos| records.get(*pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Inventory {
        Inventory::from_json(
            r#"{
                "tables": {
                    "architectures": [
                        {"id": 1, "name": "x86_64"},
                        {"id": 2, "name": "aarch64"}
                    ],
                    "network_interfaces": [
                        {"id": 10, "host": 7, "mac_address": "aa"},
                        {"id": 11, "host": 8, "mac_address": "bb"},
                        {"id": 12, "host": 7, "mac_address": "cc"}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_point_lookup() {
        let inventory = sample();
        let record = inventory.get("architectures", 2).unwrap();
        assert_eq!(record.get("name"), Some(Value::from("aarch64")));
        assert_eq!(record.get("id"), Some(Value::Int(2)));
        assert!(inventory.get("architectures", 3).is_none());
        assert!(inventory.get("missing", 1).is_none());
    }

    #[test]
    fn test_find_id_is_exact() {
        let inventory = sample();
        assert_eq!(inventory.find_id("architectures", "name", "x86_64"), Some(1));
        assert_eq!(inventory.find_id("architectures", "name", "X86_64"), None);
    }

    #[test]
    fn test_referencing_keeps_order() {
        let inventory = sample();
        let macs: Vec<Value> = inventory
            .referencing("network_interfaces", "host", 7)
            .filter_map(|r| r.get("mac_address"))
            .collect();
        assert_eq!(macs, vec![Value::from("aa"), Value::from("cc")]);
        assert_eq!(inventory.referencing("network_interfaces", "host", 9).count(), 0);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tables": {{"hosts": [{{"id": 1, "fqdn": "a.test"}}]}}}}"#).unwrap();

        let inventory = Inventory::from_path(file.path()).unwrap();
        assert_eq!(inventory.table("hosts").len(), 1);
        assert!(inventory.table("users").is_empty());
    }

    #[test]
    fn test_malformed_document() {
        let err = Inventory::from_json(r#"{"tables": []}"#).unwrap_err();
        assert!(matches!(err, Error::Inventory(_)));
    }
}
