//! Tab completion for the REPL.

use invql_core::Registry;
use invql_lang::completion_words;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// REPL helper completing field tokens, operators and keywords.
pub struct InvqlHelper {
    /// Completion vocabulary, sorted.
    pub words: Vec<String>,
}

impl InvqlHelper {
    /// Create a helper for the fields of `registry`.
    pub fn new(registry: &Registry) -> Self {
        Self {
            words: completion_words(registry).into_iter().collect(),
        }
    }

    /// Start offset of the word under the cursor and its candidates.
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let line_to_cursor = &line[..pos];

        if line_to_cursor.trim_start().starts_with('.') && !line_to_cursor.contains(' ') {
            let typed = line_to_cursor.trim();
            let commands = DOT_COMMANDS
                .iter()
                .filter(|cmd| cmd.starts_with(typed))
                .map(|cmd| cmd.to_string())
                .collect();
            return (0, commands);
        }

        let word_start = line_to_cursor
            .rfind(|c: char| c.is_whitespace() || c == ',' || c == '!')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = line_to_cursor[word_start..].to_lowercase();

        if word.is_empty() {
            return (word_start, Vec::new());
        }

        let matches = self
            .words
            .iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&word))
            .cloned()
            .collect();
        (word_start, matches)
    }
}

/// Dot-commands for completion.
const DOT_COMMANDS: &[&str] = &[
    ".fields",
    ".explain",
    ".format",
    ".reload",
    ".history",
    ".clear",
    ".help",
    ".exit",
    ".quit",
];

impl Completer for InvqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(line, pos);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for InvqlHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for InvqlHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }

    fn highlight_char(
        &self,
        _line: &str,
        _pos: usize,
        _kind: rustyline::highlight::CmdKind,
    ) -> bool {
        false
    }
}

impl Validator for InvqlHelper {}

impl Helper for InvqlHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use invql_core::host_registry;

    fn helper() -> InvqlHelper {
        InvqlHelper::new(host_registry())
    }

    #[test]
    fn test_vocabulary() {
        let helper = helper();
        assert!(helper.words.iter().any(|w| w == "fqdn"));
        assert!(helper.words.iter().any(|w| w == "where"));
        assert!(helper.words.iter().any(|w| w == "=~"));
    }

    #[test]
    fn test_dot_commands() {
        let (start, words) = helper().candidates(".ex", 3);
        assert_eq!(start, 0);
        assert_eq!(words, vec![".explain", ".exit"]);
    }

    #[test]
    fn test_field_after_comma() {
        let line = "fqdn,cpu_m";
        let (start, words) = helper().candidates(line, line.len());
        assert_eq!(start, 5);
        assert_eq!(words, vec!["cpu_model"]);
    }

    #[test]
    fn test_negated_field_is_case_insensitive() {
        let line = "fqdn where !EF";
        let (start, words) = helper().candidates(line, line.len());
        assert_eq!(start, 12);
        assert_eq!(words, vec!["efi"]);
    }

    #[test]
    fn test_nothing_after_space() {
        let (_, words) = helper().candidates("fqdn ", 5);
        assert!(words.is_empty());
    }
}
