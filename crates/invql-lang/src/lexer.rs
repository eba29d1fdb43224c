//! Lexer for query strings using logos.
//!
//! The lexer only separates words from quoted spans. Whether a word is a
//! field, an operator, a keyword or a value depends on where it appears, so
//! that is left to the parser.

use crate::error::ParseError;
use crate::span::Span;
use logos::Logos;

/// Token types for the query language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// A quoted span with the quotes stripped. Never a keyword or operator.
    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r#"'[^']*'"#, unquote)]
    Quoted(String),

    /// A run of non-blank, non-quote characters.
    #[regex(r#"[^ \t\r\n"']+"#, |lex| lex.slice().to_string())]
    Word(String),
}

fn unquote(lex: &mut logos::Lexer<Token>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

impl Token {
    /// The token text, without quotes.
    pub fn text(&self) -> &str {
        match self {
            Token::Quoted(s) | Token::Word(s) => s,
        }
    }

    /// The unquoted text, for keyword and operator matching.
    pub fn word(&self) -> Option<&str> {
        match self {
            Token::Word(s) => Some(s),
            Token::Quoted(_) => None,
        }
    }

    /// Whether this is an unquoted `keyword`, in any letter case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.word()
            .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
    }
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize a query string.
///
/// The only lexical error is a quote that is never closed.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span: Span = lexer.span().into();
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                return Err(ParseError::new(
                    "unterminated quoted value",
                    Span::new(span.start, source.len()),
                )
                .with_hint("close the quote or encode spaces as %20"))
            }
        }
    }
    Ok(tokens)
}
