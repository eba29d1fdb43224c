//! REPL dot-command handling.

use crate::formatter::OutputFormat;

/// Result of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the REPL.
    Exit,
    /// Output to display.
    Output(String),
    /// Change the output format.
    SetFormat(OutputFormat),
    /// Show history.
    ShowHistory,
    /// Clear screen.
    Clear,
    /// Explain a query.
    Explain(String),
    /// List the queryable fields.
    Fields,
    /// Re-read the inventory file.
    Reload,
}

/// Parse a dot-command.
pub fn handle_command(line: &str, format: OutputFormat) -> CommandResult {
    let line = line.trim();
    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match command.as_str() {
        ".exit" | ".quit" | ".q" => CommandResult::Exit,

        ".help" | ".h" | ".?" => CommandResult::Output(get_help()),

        ".clear" | ".cls" => CommandResult::Clear,

        ".fields" => CommandResult::Fields,

        ".reload" => CommandResult::Reload,

        ".format" => {
            if let Some(fmt) = arg {
                match fmt.to_lowercase().as_str() {
                    "table" => CommandResult::SetFormat(OutputFormat::Table),
                    "json" => CommandResult::SetFormat(OutputFormat::Json),
                    "csv" => CommandResult::SetFormat(OutputFormat::Csv),
                    _ => CommandResult::Output(format!(
                        "Unknown format '{}'. Use: table, json, csv",
                        fmt
                    )),
                }
            } else {
                CommandResult::Output(format!("Current format: {}", format))
            }
        }

        ".history" => CommandResult::ShowHistory,

        ".explain" => {
            if let Some(query_str) = arg {
                CommandResult::Explain(query_str.to_string())
            } else {
                CommandResult::Output("Usage: .explain <query>".to_string())
            }
        }

        _ => CommandResult::Output(format!("Unknown command: {}", command)),
    }
}

/// Check if a line is a dot-command.
pub fn is_command(line: &str) -> bool {
    line.trim().starts_with('.')
}

/// Get help text for REPL commands.
fn get_help() -> String {
    r#"REPL Commands
=============

.fields               List every queryable field
.explain <query>      Show how a query compiles without running it
.format [type]        Get or set output format (table, json, csv)
.reload               Re-read the inventory file
.history              Show query history
.clear                Clear the screen
.help                 Show this help message
.exit / .quit         Exit the REPL

Query Language
==============
<field>[, <field>...] [where <condition> [and|or <condition>...]]

Conditions are evaluated left to right without precedence.

  <field> <op> <value>   op: = == =~ =* != > < >= <=
  <field>                field is set (non-empty, true, not null)
  !<field>               field is unset

Examples:
  fqdn, cpu_model, ram
  fqdn where cpu_model =~ Intel or !efi
  fqdn, reserved_by where reserved_until == infinite
  fqdn where comment =~ "GPU box"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        assert!(is_command(".exit"));
        assert!(is_command(".help"));
        assert!(is_command("  .fields"));
        assert!(!is_command("fqdn where efi"));
        assert!(!is_command("fqdn"));
    }

    #[test]
    fn test_exit_aliases() {
        for line in [".exit", ".quit", ".q", ".EXIT"] {
            assert_eq!(handle_command(line, OutputFormat::Table), CommandResult::Exit);
        }
    }

    #[test]
    fn test_format_command() {
        assert_eq!(
            handle_command(".format json", OutputFormat::Table),
            CommandResult::SetFormat(OutputFormat::Json)
        );
        assert_eq!(
            handle_command(".format", OutputFormat::Csv),
            CommandResult::Output("Current format: csv".to_string())
        );
        assert!(matches!(
            handle_command(".format yaml", OutputFormat::Table),
            CommandResult::Output(msg) if msg.starts_with("Unknown format 'yaml'")
        ));
    }

    #[test]
    fn test_explain_requires_query() {
        assert_eq!(
            handle_command(".explain fqdn where efi", OutputFormat::Table),
            CommandResult::Explain("fqdn where efi".to_string())
        );
        assert_eq!(
            handle_command(".explain", OutputFormat::Table),
            CommandResult::Output("Usage: .explain <query>".to_string())
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            handle_command(".status", OutputFormat::Table),
            CommandResult::Output("Unknown command: .status".to_string())
        );
    }
}
