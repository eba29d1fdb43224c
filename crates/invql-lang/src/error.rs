//! Error types for parsing, compilation and execution.

use crate::span::{offset_to_line_col, Span};
use thiserror::Error;

/// Malformed query structure.
#[derive(Debug, Error)]
pub struct ParseError {
    pub message: String,
    /// Source span where the error occurred.
    pub span: Span,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!("error: {}\n", self.message);
        result.push_str(&source_context(source, self.span));
        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }
        result
    }
}

/// A query that parsed but does not fit the registry.
#[derive(Debug, Error)]
pub struct CompileError {
    pub message: String,
    /// Source span where the error occurred.
    pub span: Span,
    /// Error kind for programmatic handling.
    pub kind: CompileErrorKind,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Token not in the field registry.
    UnknownField,
    /// Computed field used in a condition.
    UnsupportedOperation,
    /// Operator not valid for the field kind.
    InvalidOperator,
    /// Literal that does not convert to the field's storage form.
    InvalidValue,
}

impl CompileError {
    pub fn new(message: impl Into<String>, span: Span, kind: CompileErrorKind) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    pub fn unknown_field(entity: &str, field: &str, span: Span) -> Self {
        Self::new(
            format!("unknown field '{}' on '{}'", field, entity),
            span,
            CompileErrorKind::UnknownField,
        )
    }

    pub fn unsupported_operation(field: &str, span: Span) -> Self {
        Self::new(
            format!(
                "field '{}' is computed per record and cannot be used in a condition",
                field
            ),
            span,
            CompileErrorKind::UnsupportedOperation,
        )
    }

    pub fn invalid_operator(operator: &str, field: &str, kind: &str, span: Span) -> Self {
        Self::new(
            format!(
                "operator '{}' is not valid for {} field '{}'",
                operator, kind, field
            ),
            span,
            CompileErrorKind::InvalidOperator,
        )
    }

    pub fn invalid_value(message: impl Into<String>, span: Span) -> Self {
        Self::new(message, span, CompileErrorKind::InvalidValue)
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!("error[{:?}]: {}\n", self.kind, self.message);
        result.push_str(&source_context(source, self.span));
        result
    }
}

/// Location line plus the offending source line with a caret under the span.
fn source_context(source: &str, span: Span) -> String {
    let (line, col) = offset_to_line_col(source, span.start);
    let mut result = format!("  --> line {}:{}\n", line, col);

    if let Some(source_line) = source.lines().nth(line - 1) {
        result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
        for _ in 0..col {
            result.push(' ');
        }
        result.push('^');

        let line_len = source_line.chars().count();
        let span_len = source
            .get(span.start..span.end.min(source.len()))
            .map_or(0, |s| s.chars().count());
        for _ in 1..span_len.min(line_len + 1 - col.min(line_len + 1)) {
            result.push('~');
        }
        result.push('\n');
    }

    result
}

/// Outcome classes a caller distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed structure, an operator the field kind does not support, or a
    /// literal that does not convert.
    Syntax,
    UnknownField,
    UnsupportedOperation,
    /// The query matched nothing. An expected outcome, not a fault.
    EmptyResult,
    /// The inventory itself could not be loaded.
    Inventory,
}

/// A combined error type for the public API.
#[derive(Debug, Error)]
pub enum LangError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Execute(#[from] invql_core::Error),
}

impl LangError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        use invql_core::Error as CoreError;

        match self {
            LangError::Parse(_) => ErrorKind::Syntax,
            LangError::Compile(e) => match e.kind {
                CompileErrorKind::UnknownField => ErrorKind::UnknownField,
                CompileErrorKind::UnsupportedOperation => ErrorKind::UnsupportedOperation,
                CompileErrorKind::InvalidOperator | CompileErrorKind::InvalidValue => {
                    ErrorKind::Syntax
                }
            },
            LangError::Execute(e) => match e {
                CoreError::UnknownField(_) => ErrorKind::UnknownField,
                CoreError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
                CoreError::InvalidValue { .. } => ErrorKind::Syntax,
                CoreError::EmptyResult => ErrorKind::EmptyResult,
                CoreError::Inventory(_) | CoreError::Io(_) => ErrorKind::Inventory,
            },
        }
    }

    /// Whether the query simply matched nothing.
    pub fn is_empty_result(&self) -> bool {
        self.kind() == ErrorKind::EmptyResult
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        match self {
            LangError::Parse(e) => e.format_with_source(source),
            LangError::Compile(e) => e.format_with_source(source),
            LangError::Execute(e) => format!("error: {}\n", e),
        }
    }

    /// Get the span of the error, if it points into the query.
    pub fn span(&self) -> Option<Span> {
        match self {
            LangError::Parse(e) => Some(e.span),
            LangError::Compile(e) => Some(e.span),
            LangError::Execute(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let source = "fqdn where where";
        let err = ParseError::new("more than one 'where'", Span::new(11, 16))
            .with_hint("combine conditions with AND or OR");

        let formatted = err.format_with_source(source);
        assert!(formatted.contains("line 1:12"));
        assert!(formatted.contains("more than one 'where'"));
        assert!(formatted.contains("^~~~~"));
        assert!(formatted.contains("hint: combine conditions"));
    }

    #[test]
    fn test_compile_error_formatting() {
        let source = "nope";
        let err = CompileError::unknown_field("hosts", "nope", Span::new(0, 4));
        let formatted = err.format_with_source(source);
        assert!(formatted.starts_with("error[UnknownField]: unknown field 'nope' on 'hosts'"));
    }

    #[test]
    fn test_error_kinds() {
        let parse: LangError = ParseError::new("x", Span::default()).into();
        assert_eq!(parse.kind(), ErrorKind::Syntax);

        let operator: LangError =
            CompileError::invalid_operator(">", "fqdn", "text", Span::default()).into();
        assert_eq!(operator.kind(), ErrorKind::Syntax);

        let empty: LangError = invql_core::Error::EmptyResult.into();
        assert!(empty.is_empty_result());
        assert_eq!(empty.span(), None);
    }
}
