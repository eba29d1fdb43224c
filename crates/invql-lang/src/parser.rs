//! Query string parser.
//!
//! A query is a comma-separated field list, optionally followed by `where`
//! and a flat list of conditions joined by `AND`/`OR`. Conditions are read
//! by a three-state machine (field, operator, value) with one token of
//! lookahead to tell a bare field from the start of a comparison.

use crate::ast::{ConditionExpr, Query};
use crate::error::ParseError;
use crate::lexer::{tokenize, SpannedToken, Token};
use crate::operator::OperatorSymbol;
use crate::span::{Span, Spanned};
use invql_core::Conjunction;

/// Keyword separating the field list from the conditions.
pub const WHERE: &str = "where";

/// Encoded space accepted inside unquoted values.
const ENCODED_SPACE: &str = "%20";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitField,
    AwaitOperator,
    AwaitValue,
}

/// Parser for one query string.
pub struct Parser<'source> {
    source: &'source str,
    tokens: Vec<SpannedToken>,
}

impl<'source> Parser<'source> {
    /// Tokenize `source` for parsing.
    pub fn new(source: &'source str) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
        })
    }

    /// Parse the whole query.
    pub fn parse_query(&self) -> Result<Query, ParseError> {
        let mut wheres = self
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, tok)| tok.token.is_keyword(WHERE));

        let first_where = wheres.next();
        if let Some((_, second)) = wheres.next() {
            return Err(
                ParseError::new("more than one 'where' in query", second.span)
                    .with_hint("combine conditions with AND or OR"),
            );
        }

        let (fields, conditions, conjunctions) = match first_where {
            None => (self.parse_field_list(self.source.len())?, Vec::new(), Vec::new()),
            Some((pos, where_tok)) => {
                let fields = self.parse_field_list(where_tok.span.start)?;
                let rest = &self.tokens[pos + 1..];
                if rest.is_empty() {
                    return Err(ParseError::new(
                        "'where' must be followed by at least one condition",
                        where_tok.span,
                    ));
                }
                let (conditions, conjunctions) = parse_conditions(rest, self.end())?;
                (fields, conditions, conjunctions)
            }
        };

        Ok(Query {
            fields,
            conditions,
            conjunctions,
            span: Span::new(0, self.source.len()),
        })
    }

    fn end(&self) -> Span {
        Span::new(self.source.len(), self.source.len())
    }

    /// Split `source[..end]` on commas into trimmed, non-empty field tokens.
    fn parse_field_list(&self, end: usize) -> Result<Vec<Spanned<String>>, ParseError> {
        let text = &self.source[..end];
        if text.trim().is_empty() {
            return Err(ParseError::new(
                "expected at least one field",
                Span::new(0, end),
            )
            .with_hint("start the query with a field list such as 'fqdn, arch'"));
        }

        let mut fields = Vec::new();
        let mut offset = 0;
        for piece in text.split(',') {
            let start = offset + (piece.len() - piece.trim_start().len());
            let name = piece.trim();
            let span = Span::new(start, start + name.len());
            offset += piece.len() + 1;

            if name.is_empty() {
                return Err(ParseError::new("empty field name in field list", span));
            }
            if name.contains(char::is_whitespace) {
                return Err(ParseError::new(
                    format!("expected ',' between fields in '{}'", name),
                    span,
                )
                .with_hint("separate requested fields with commas"));
            }
            fields.push(Spanned::new(name.to_string(), span));
        }
        Ok(fields)
    }
}

fn conjunction(tok: &SpannedToken) -> Option<Conjunction> {
    tok.token.word().and_then(Conjunction::from_keyword)
}

fn operator(tok: &SpannedToken) -> Option<OperatorSymbol> {
    tok.token.word().and_then(OperatorSymbol::parse)
}

/// Decode a value token: `%20` becomes a space, quoted or not.
pub fn decode_value(text: &str) -> String {
    text.replace(ENCODED_SPACE, " ")
}

/// Run the condition state machine over the tokens after `where`.
fn parse_conditions(
    tokens: &[SpannedToken],
    end: Span,
) -> Result<(Vec<ConditionExpr>, Vec<Spanned<Conjunction>>), ParseError> {
    let mut conditions = Vec::new();
    let mut conjunctions: Vec<Spanned<Conjunction>> = Vec::new();
    let mut state = State::AwaitField;
    let mut expect_conjunction = false;
    let mut field: Option<Spanned<String>> = None;
    let mut op: Option<Spanned<OperatorSymbol>> = None;

    for (i, tok) in tokens.iter().enumerate() {
        if let Some(conj) = conjunction(tok) {
            if state != State::AwaitField || !expect_conjunction {
                return Err(ParseError::new(
                    format!("unexpected '{}'", tok.token.text()),
                    tok.span,
                )
                .with_hint("AND and OR go between complete conditions"));
            }
            conjunctions.push(Spanned::new(conj, tok.span));
            expect_conjunction = false;
            continue;
        }

        match state {
            State::AwaitField => {
                if expect_conjunction {
                    return Err(ParseError::new(
                        format!("expected AND or OR, found '{}'", tok.token.text()),
                        tok.span,
                    ));
                }
                if operator(tok).is_some() {
                    return Err(ParseError::new(
                        format!("expected a field, found operator '{}'", tok.token.text()),
                        tok.span,
                    ));
                }

                let next = tokens.get(i + 1);
                if next.and_then(operator).is_some() {
                    field = Some(Spanned::new(tok.token.text().to_string(), tok.span));
                    state = State::AwaitOperator;
                } else if next.map_or(true, |n| conjunction(n).is_some()) {
                    conditions.push(unary(tok));
                    expect_conjunction = true;
                } else if let Some(next) = next {
                    return Err(ParseError::new(
                        format!(
                            "expected an operator after '{}', found '{}'",
                            tok.token.text(),
                            next.token.text()
                        ),
                        next.span,
                    )
                    .with_hint(operator_hint()));
                }
            }
            State::AwaitOperator => {
                op = operator(tok).map(|symbol| Spanned::new(symbol, tok.span));
                state = State::AwaitValue;
            }
            State::AwaitValue => {
                if let (Some(field), Some(op)) = (field.take(), op.take()) {
                    let value = Spanned::new(decode_value(tok.token.text()), tok.span);
                    conditions.push(ConditionExpr::Comparison { field, op, value });
                }
                state = State::AwaitField;
                expect_conjunction = true;
            }
        }
    }

    if state != State::AwaitField {
        let span = op.as_ref().map_or(end, |op| op.span);
        return Err(ParseError::new("incomplete condition: missing value", span)
            .with_hint("quote values containing spaces, or encode them as %20"));
    }
    if let Some(last) = conjunctions.last() {
        if conjunctions.len() == conditions.len() {
            return Err(ParseError::new(
                format!("dangling '{}' at end of query", last.value),
                last.span,
            ));
        }
    }

    Ok((conditions, conjunctions))
}

/// A bare field, with a leading `!` read as negation.
fn unary(tok: &SpannedToken) -> ConditionExpr {
    let text = tok.token.text();
    match (&tok.token, text.strip_prefix('!')) {
        (Token::Word(_), Some(name)) => ConditionExpr::Unary {
            field: Spanned::new(name.to_string(), Span::new(tok.span.start + 1, tok.span.end)),
            negated: true,
        },
        _ => ConditionExpr::Unary {
            field: Spanned::new(text.to_string(), tok.span),
            negated: false,
        },
    }
}

fn operator_hint() -> String {
    let symbols: Vec<_> = OperatorSymbol::ALL.iter().map(|op| op.as_str()).collect();
    format!("valid operators are {}", symbols.join(" "))
}

/// Parse a query string.
pub fn parse(source: &str) -> Result<Query, ParseError> {
    Parser::new(source)?.parse_query()
}
