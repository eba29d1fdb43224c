//! Field registry: the catalog mapping query tokens to field descriptors.
//!
//! A registry is built once and only read afterwards, so a single instance
//! can be shared by every request without locking.
//!
//! Resolution order for a token:
//! 1. the alias table (renames and fields reached through a reference),
//! 2. stored attributes of the primary table,
//! 3. dynamic (computed) fields,
//! 4. `<related>__<field>` compositions matching an alias's path.

mod field;
mod hosts;
mod transform;

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::error::Error;

pub use field::{
    ComputeFn, DerivedColumn, DerivedFunction, FieldDescriptor, FieldKind, RelatedHop,
};
pub use hosts::{host_registry, host_scope, HOSTS_TABLE};
pub use transform::{PostTransform, PreTransform};

/// Separator between a related path and a field name in tokens and columns.
pub const PATH_SEPARATOR: &str = "__";

/// Catalog of queryable fields for one primary table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entity: String,
    fields: BTreeMap<String, FieldDescriptor>,
    aliases: BTreeMap<String, FieldDescriptor>,
    dynamic: BTreeMap<String, FieldDescriptor>,
}

impl Registry {
    /// Create an empty registry for the primary table `entity`.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Register a stored attribute of the primary table.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.insert(field.token.clone(), field);
        self
    }

    /// Register an alias.
    pub fn with_alias(mut self, alias: FieldDescriptor) -> Self {
        self.aliases.insert(alias.token.clone(), alias);
        self
    }

    /// Register a dynamic field.
    pub fn with_dynamic(mut self, field: FieldDescriptor) -> Self {
        self.dynamic.insert(field.token.clone(), field);
        self
    }

    /// Name of the primary table.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Look up the descriptor for a token.
    pub fn resolve(&self, token: &str) -> Result<&FieldDescriptor, Error> {
        let found = self
            .aliases
            .get(token)
            .or_else(|| self.fields.get(token))
            .or_else(|| self.dynamic.get(token))
            .or_else(|| self.resolve_composed(token));

        match found {
            Some(field) => {
                trace!(token, column = %field.column(), "resolved field");
                Ok(field)
            }
            None => Err(Error::UnknownField(token.to_string())),
        }
    }

    /// `<related>__<field>` against the aliases' related paths.
    fn resolve_composed(&self, token: &str) -> Option<&FieldDescriptor> {
        let (prefix, suffix) = token.rsplit_once(PATH_SEPARATOR)?;
        self.aliases.values().find(|alias| {
            !alias.related.is_empty()
                && alias.related_prefix() == prefix
                && alias.storage_field == suffix
        })
    }

    /// Every token `resolve` accepts directly: stored fields, aliases and
    /// dynamic fields.
    pub fn all_valid_tokens(&self) -> BTreeSet<String> {
        self.fields
            .keys()
            .chain(self.aliases.keys())
            .chain(self.dynamic.keys())
            .cloned()
            .collect()
    }

    /// Every registered descriptor, stored fields first.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .values()
            .chain(self.aliases.values())
            .chain(self.dynamic.values())
    }

    /// The length pseudo-field for a text field plus the column the executor
    /// must materialise before filtering on it. `None` for non-text kinds.
    pub fn length_annotated_variant(
        &self,
        field: &FieldDescriptor,
    ) -> Option<(FieldDescriptor, DerivedColumn)> {
        field.length_annotated()
    }
}
