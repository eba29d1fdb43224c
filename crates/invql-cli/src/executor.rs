//! Query execution against a loaded inventory.

use crate::config::ShellConfig;
use crate::formatter::Formatter;
use invql_core::{host_registry, host_scope, FieldDescriptor, Inventory, Scope};
use invql_lang::{parse_and_compile, run};
use thiserror::Error;
use tracing::info;

/// Execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Parse, compile or execution error, rendered with source context.
    #[error("{0}")]
    Query(String),

    /// The inventory file could not be loaded.
    #[error("failed to load inventory: {0}")]
    Inventory(#[from] invql_core::Error),
}

/// A loaded inventory plus the settings to query it with.
pub struct Session {
    config: ShellConfig,
    inventory: Inventory,
}

impl Session {
    /// Load the configured inventory.
    pub fn open(config: ShellConfig) -> Result<Self, ExecuteError> {
        let inventory = Inventory::from_path(config.inventory_path())?;
        info!(path = %config.inventory_path().display(), "loaded inventory");
        Ok(Self { config, inventory })
    }

    /// Re-read the inventory file, keeping the current one on failure.
    pub fn reload(&mut self) -> Result<(), ExecuteError> {
        self.inventory = Inventory::from_path(self.config.inventory_path())?;
        info!(path = %self.config.inventory_path().display(), "reloaded inventory");
        Ok(())
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Hosts visible to queries under the configured scope options.
    pub fn scope(&self) -> Scope<'_> {
        host_scope(&self.inventory, self.config.scope)
    }

    /// Run a query and return formatted output.
    pub fn execute(&self, input: &str, formatter: &dyn Formatter) -> Result<String, ExecuteError> {
        let scope = self.scope();
        match run(input, host_registry(), &scope) {
            Ok(result) => Ok(formatter.format_query_result(&result)),
            Err(e) if e.is_empty_result() => Ok(formatter.format_message("No results")),
            Err(e) => Err(ExecuteError::Query(e.format_with_source(input))),
        }
    }

    /// Describe how a query compiles without running it.
    pub fn explain(&self, input: &str) -> Result<String, ExecuteError> {
        let compiled = parse_and_compile(input, host_registry(), &self.inventory)
            .map_err(|e| ExecuteError::Query(e.format_with_source(input)))?;

        let mut lines = Vec::new();
        let fields: Vec<&str> = compiled
            .projected_fields()
            .iter()
            .map(|f| f.token.as_str())
            .collect();
        lines.push(format!("Fields: {}", fields.join(", ")));

        match &compiled.predicate {
            Some(predicate) => lines.push(format!("Filter: {}", predicate)),
            None => lines.push("Filter: none".to_string()),
        }

        if !compiled.derived_columns.is_empty() {
            let derived: Vec<&str> = compiled
                .derived_columns
                .iter()
                .map(|d| d.name.as_str())
                .collect();
            lines.push(format!("Derived: {}", derived.join(", ")));
        }

        lines.push(format!("Scope: {} host(s)", self.scope().len()));
        Ok(lines.join("\n"))
    }

    /// Every queryable field.
    pub fn fields(&self, formatter: &dyn Formatter) -> String {
        let fields: Vec<&FieldDescriptor> = host_registry().descriptors().collect();
        formatter.format_fields(&fields)
    }
}
