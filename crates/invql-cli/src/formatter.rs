//! Output formatters for query results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use invql_core::{FieldDescriptor, QueryResult, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a query result.
    fn format_query_result(&self, result: &QueryResult) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;

    /// Format the field listing.
    fn format_fields(&self, fields: &[&FieldDescriptor]) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

fn field_source(field: &FieldDescriptor) -> String {
    if field.is_dynamic() {
        "computed".to_string()
    } else {
        field.column()
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_query_result(&self, result: &QueryResult) -> String {
        if result.is_empty() {
            return "No results".to_string();
        }

        let mut table = Table::new();
        table.set_header(
            result
                .header
                .iter()
                .map(|(_, display)| Cell::new(display))
                .collect::<Vec<_>>(),
        );

        for row in &result.rows {
            let cells: Vec<Cell> = row
                .iter()
                .map(|(_, value)| Cell::new(format_value(value)))
                .collect();
            table.add_row(cells);
        }

        format!("{}\n{} row(s)", table, result.len())
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_fields(&self, fields: &[&FieldDescriptor]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Field", "Name", "Kind", "Source"]);

        for field in fields {
            table.add_row(vec![
                field.token.clone(),
                field.display_name.clone(),
                field.kind.to_string(),
                field_source(field),
            ]);
        }

        table.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_query_result(&self, result: &QueryResult) -> String {
        let rows: Vec<serde_json::Value> = result
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = row
                    .iter()
                    .map(|(column, value)| (column.clone(), value_to_json(value)))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();

        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({
            "message": message
        })
        .to_string()
    }

    fn format_fields(&self, fields: &[&FieldDescriptor]) -> String {
        let listing: Vec<serde_json::Value> = fields
            .iter()
            .map(|field| {
                serde_json::json!({
                    "field": field.token,
                    "name": field.display_name,
                    "kind": field.kind.name(),
                    "source": field_source(field),
                })
            })
            .collect();

        serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "[]".to_string())
    }
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_query_result(&self, result: &QueryResult) -> String {
        let mut output = String::new();

        let header: Vec<String> = result.columns().map(escape_csv).collect();
        output.push_str(&header.join(","));
        output.push('\n');

        for row in &result.rows {
            let values: Vec<String> = row.iter().map(|(_, value)| csv_value(value)).collect();
            output.push_str(&values.join(","));
            output.push('\n');
        }

        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("error,{}", escape_csv(error))
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_fields(&self, fields: &[&FieldDescriptor]) -> String {
        let mut output = String::from("field,name,kind,source\n");
        for field in fields {
            output.push_str(&format!(
                "{},{},{},{}\n",
                escape_csv(&field.token),
                escape_csv(&field.display_name),
                escape_csv(field.kind.name()),
                escape_csv(&field_source(field)),
            ));
        }
        output
    }
}

/// Format a value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Convert a value to JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Format a value as a CSV field.
fn csv_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        other => escape_csv(&other.to_string()),
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
