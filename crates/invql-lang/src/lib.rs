//! invql query language
//!
//! This crate parses and compiles the compact filter language used to query
//! the machine inventory, and runs compiled queries through `invql-core`.
//!
//! # Syntax
//!
//! ```text
//! query       ::= field-list ( "where" conditions )?
//! field-list  ::= token ( "," token )*
//! conditions  ::= condition ( ("AND"|"OR") condition )*
//! condition   ::= field operator value | "!"? field
//! operator    ::= "=" | "==" | "=~" | "=*" | "!=" | ">" | "<" | ">=" | "<="
//! ```
//!
//! Keywords match in any letter case. Values containing spaces are quoted
//! (`'...'` or `"..."`) or written with `%20`. Conditions are combined
//! strictly left to right; there is no precedence and no parenthesis.
//!
//! ```text
//! fqdn, cpu_physical
//! fqdn where cpu_model =~ Intel
//! fqdn where cpu_model =~ Intel OR !efi
//! fqdn, reserved_by where reserved_until == infinite
//! ```
//!
//! # Usage
//!
//! ```rust
//! use invql_core::{host_registry, Inventory, Record, Scope};
//! use invql_lang::run;
//!
//! let inventory = Inventory::from_tables([(
//!     "hosts",
//!     vec![Record::new(1).with("fqdn", "a.test").with("efi", true)],
//! )]);
//! let scope = Scope::all(&inventory, "hosts");
//! let result = run("fqdn where efi", host_registry(), &scope).unwrap();
//! assert_eq!(result.rows.len(), 1);
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod span;

use std::collections::BTreeSet;

use invql_core::{
    CompiledQuery, Inventory, QueryExecutor, QueryResult, Registry, ResultProcessor, Scope,
};
use tracing::debug;

pub use ast::{ConditionExpr, Query};
pub use compiler::{Compiler, INFINITE};
pub use error::{CompileError, CompileErrorKind, ErrorKind, LangError, ParseError};
pub use operator::{resolve_lookup, resolve_unary, OperatorSymbol, UnaryCondition};
pub use parser::WHERE;
pub use span::{Span, Spanned};

/// Reserved words of the language, lower case.
pub const KEYWORDS: [&str; 4] = [WHERE, "and", "or", INFINITE];

/// Parse a query string into an AST.
///
/// # Example
///
/// ```rust
/// use invql_lang::parse;
///
/// let query = parse("fqdn where cpu_model =~ Intel OR !efi").unwrap();
/// assert_eq!(query.conditions.len(), 2);
/// ```
pub fn parse(source: &str) -> Result<Query, ParseError> {
    parser::parse(source)
}

/// Compile a parsed query against a registry.
pub fn compile(
    query: &Query,
    registry: &Registry,
    inventory: &Inventory,
) -> Result<CompiledQuery, CompileError> {
    compiler::compile(query, registry, inventory)
}

/// Parse and compile a query string in one step.
pub fn parse_and_compile(
    source: &str,
    registry: &Registry,
    inventory: &Inventory,
) -> Result<CompiledQuery, LangError> {
    let query = parse(source)?;
    let compiled = compile(&query, registry, inventory)?;
    Ok(compiled)
}

/// Run a query string against a caller scope.
///
/// Returns the header and display-ready rows, or a [`LangError`] whose
/// [`LangError::kind`] tells bad input from an empty result.
pub fn run(
    source: &str,
    registry: &Registry,
    scope: &Scope<'_>,
) -> Result<QueryResult, LangError> {
    let compiled = parse_and_compile(source, registry, scope.inventory())?;
    let rows = QueryExecutor::new(scope).execute(&compiled)?;
    let result = ResultProcessor::new(scope.inventory()).process(&compiled, rows);
    debug!(query = source, rows = result.len(), "ran query");
    Ok(result)
}

/// Words offered by interactive completion: every field token, the operator
/// symbols and the keywords.
pub fn completion_words(registry: &Registry) -> BTreeSet<String> {
    let mut words = registry.all_valid_tokens();
    words.extend(OperatorSymbol::ALL.iter().map(|op| op.as_str().to_string()));
    words.extend(KEYWORDS.iter().map(|k| k.to_string()));
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use invql_core::{host_registry, Record, Value};

    fn inventory() -> Inventory {
        Inventory::from_tables([(
            "hosts",
            vec![
                Record::new(1).with("fqdn", "a.test").with("efi", true),
                Record::new(2).with("fqdn", "b.test").with("efi", false),
            ],
        )])
    }

    #[test]
    fn test_run() {
        let inventory = inventory();
        let scope = Scope::all(&inventory, "hosts");
        let result = run("fqdn where !efi", host_registry(), &scope).unwrap();
        assert_eq!(result.rows, vec![vec![("fqdn".to_string(), Value::from("b.test"))]]);
    }

    #[test]
    fn test_error_with_source_context() {
        let inventory = inventory();
        let scope = Scope::all(&inventory, "hosts");
        let source = "fqdn where efi where efi";
        let err = run(source, host_registry(), &scope).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        let formatted = err.format_with_source(source);
        assert!(formatted.contains("line 1:16"));
    }

    #[test]
    fn test_completion_words() {
        let words = completion_words(host_registry());
        for word in ["fqdn", "arch", "ipv4", "=~", "<=", "where", "and", "or", "infinite"] {
            assert!(words.contains(word), "missing {}", word);
        }
    }
}
