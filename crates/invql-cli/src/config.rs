//! Shell configuration.

use std::path::{Path, PathBuf};

use crate::formatter::OutputFormat;
use invql_core::ScopeOptions;

/// Inventory file read when none is given.
pub const DEFAULT_INVENTORY: &str = "inventory.json";

/// History file name under the home directory.
pub const DEFAULT_HISTORY_FILE: &str = ".invql_history";

/// Default output format.
pub const DEFAULT_FORMAT: OutputFormat = OutputFormat::Table;

/// Settings shared by every shell mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    /// JSON inventory document to query.
    pub inventory_path: PathBuf,

    /// Output format for results.
    pub format: OutputFormat,

    /// Widening of the default host scope.
    pub scope: ScopeOptions,

    /// REPL history file; the home directory default when unset.
    pub history_path: Option<PathBuf>,
}

impl ShellConfig {
    /// Create a configuration for the given inventory file.
    pub fn new(inventory_path: impl Into<PathBuf>) -> Self {
        Self {
            inventory_path: inventory_path.into(),
            format: DEFAULT_FORMAT,
            scope: ScopeOptions::default(),
            history_path: None,
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the scope options.
    pub fn with_scope_options(mut self, scope: ScopeOptions) -> Self {
        self.scope = scope;
        self
    }

    /// Set the history file.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// The history file to load and save.
    pub fn history_file(&self) -> PathBuf {
        match &self.history_path {
            Some(path) => path.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_HISTORY_FILE),
        }
    }

    pub fn inventory_path(&self) -> &Path {
        &self.inventory_path
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShellConfig::default();
        assert_eq!(config.inventory_path(), Path::new(DEFAULT_INVENTORY));
        assert_eq!(config.format, DEFAULT_FORMAT);
        assert_eq!(config.scope, ScopeOptions::default());
        assert!(config.history_file().ends_with(DEFAULT_HISTORY_FILE));
    }

    #[test]
    fn test_config_builder() {
        let config = ShellConfig::new("/srv/inventory.json")
            .with_format(OutputFormat::Csv)
            .with_scope_options(ScopeOptions {
                include_inactive: true,
                include_administrative: false,
            })
            .with_history_path("/tmp/history");

        assert_eq!(config.inventory_path(), Path::new("/srv/inventory.json"));
        assert_eq!(config.format, OutputFormat::Csv);
        assert!(config.scope.include_inactive);
        assert_eq!(config.history_file(), PathBuf::from("/tmp/history"));
    }
}
