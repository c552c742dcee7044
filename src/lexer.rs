//! A module implementing lexical analysis (tokenization) for command lines.
//!
//! A line is split into a command word followed by parameter tokens. Tokens are
//! separated by whitespace, except that a token opening with `'` or `"` runs up
//! to the matching closing quote. Every token remembers the byte span it was
//! read from so the completion front end can line tokens up with the cursor.

use crate::error::SyntaxError;
use std::ops::Range;
use thiserror::Error;

/// One whitespace- or quote-delimited unit read from an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    span: Range<usize>,
    quote: Option<char>,
    closed: bool,
}

impl Token {
    /// The token text with any surrounding quotes removed.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Byte range of the raw token (quotes included) in the original line.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Byte offset where the token starts, opening quote included.
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Byte offset just past the token, closing quote included.
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// The quote character that opened this token, if it was quoted.
    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    /// `false` for a quoted token whose closing quote was never found.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// A command line split into its command word and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    command: Token,
    params: Vec<Token>,
}

impl ParsedLine {
    /// Name of the command being invoked.
    pub fn command(&self) -> &str {
        self.command.value()
    }

    /// The command word with its position on the line.
    pub fn command_token(&self) -> &Token {
        &self.command
    }

    /// Parameter tokens in the order they were entered.
    pub fn params(&self) -> &[Token] {
        &self.params
    }

    /// Parameter values, ready to be handed to a command handler.
    pub fn param_values(&self) -> Vec<String> {
        self.params.iter().map(|t| t.value.clone()).collect()
    }
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// The line contains nothing but whitespace.
    #[error("empty line")]
    Empty,
    /// The command word is not a valid command name.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingQuoted(char),
}

struct LexingFSM<'a> {
    line: &'a str,
    state: LexingState,
    start: usize,
    buffer: String,
    tokens: Vec<Token>,
}

impl<'a> LexingFSM<'a> {
    fn new(line: &'a str) -> Self {
        LexingFSM {
            line,
            state: LexingState::Start,
            start: 0,
            buffer: String::new(),
            tokens: Vec::new(),
        }
    }

    fn make_tokens(mut self) -> Vec<Token> {
        for (offset, ch) in self.line.char_indices() {
            match self.state {
                LexingState::Start => self.handle_start(offset, ch),
                LexingState::ReadingWord => self.handle_word(offset, ch),
                LexingState::ReadingQuoted(quote) => self.handle_quoted(offset, ch, quote),
            }
        }

        // An open quote swallows the rest of the line.
        match self.state {
            LexingState::ReadingWord => self.finish_token(self.line.len(), None, true),
            LexingState::ReadingQuoted(quote) => {
                self.finish_token(self.line.len(), Some(quote), false)
            }
            LexingState::Start => {}
        }

        self.tokens
    }

    fn handle_start(&mut self, offset: usize, ch: char) {
        match ch {
            c if c.is_whitespace() => {}
            '\'' | '"' => {
                self.start = offset;
                self.state = LexingState::ReadingQuoted(ch);
            }
            c => {
                self.start = offset;
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, offset: usize, ch: char) {
        if ch.is_whitespace() {
            self.finish_token(offset, None, true);
        } else {
            self.buffer.push(ch);
        }
    }

    fn handle_quoted(&mut self, offset: usize, ch: char, quote: char) {
        if ch == quote {
            self.finish_token(offset + ch.len_utf8(), Some(quote), true);
        } else {
            self.buffer.push(ch);
        }
    }

    fn finish_token(&mut self, end: usize, quote: Option<char>, closed: bool) {
        self.tokens.push(Token {
            value: std::mem::take(&mut self.buffer),
            span: self.start..end,
            quote,
            closed,
        });
        self.state = LexingState::Start;
    }
}

/// Splits a line into raw tokens without checking the command word.
///
/// Used by completion, where the line is usually incomplete.
pub fn scan(line: &str) -> Vec<Token> {
    LexingFSM::new(line).make_tokens()
}

/// The main entry point function to perform lexical analysis.
///
/// # Arguments
/// * `line` - The command line to be tokenized.
///
/// # Returns
/// A [`ParsedLine`] on success. [`LexingError::Empty`] when the line holds only
/// whitespace, and [`LexingError::Syntax`] pointing at the first character that
/// cannot be part of a command name.
pub fn tokenize(line: &str) -> Result<ParsedLine, LexingError> {
    let mut tokens = scan(line).into_iter();
    let command = tokens.next().ok_or(LexingError::Empty)?;
    check_command_word(line, &command)?;
    Ok(ParsedLine {
        command,
        params: tokens.collect(),
    })
}

fn check_command_word(line: &str, command: &Token) -> Result<(), SyntaxError> {
    if command.quote.is_some() {
        return Err(SyntaxError::at(line, command.start()));
    }
    if command.value == "?" {
        return Ok(());
    }
    match command
        .value
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
    {
        Some((idx, _)) => Err(SyntaxError::at(line, command.start() + idx)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(parsed: &ParsedLine) -> Vec<&str> {
        parsed.params().iter().map(|t| t.value()).collect()
    }

    #[test]
    fn test_command_without_params() {
        let parsed = tokenize("MyCommand").unwrap();
        assert_eq!(parsed.command(), "MyCommand");
        assert!(parsed.params().is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let parsed = tokenize("     MyCommand    ").unwrap();
        assert_eq!(parsed.command(), "MyCommand");
        assert!(parsed.params().is_empty());
    }

    #[test]
    fn test_repeated_whitespace_collapses() {
        let parsed = tokenize("   MyCommand      param1 \t  param2").unwrap();
        assert_eq!(parsed.command(), "MyCommand");
        assert_eq!(values(&parsed), vec!["param1", "param2"]);
    }

    #[test]
    fn test_quotes_are_stripped_from_values() {
        let parsed = tokenize(r#"MyCommand "param1" 'param2'"#).unwrap();
        assert_eq!(values(&parsed), vec!["param1", "param2"]);
        assert_eq!(parsed.params()[0].quote(), Some('"'));
        assert_eq!(parsed.params()[1].quote(), Some('\''));
    }

    #[test]
    fn test_quoted_whitespace_and_opposite_quotes_survive() {
        let parsed = tokenize(r#"MyCommand "param with 'quotes'"  'and "double"  ones'"#).unwrap();
        assert_eq!(
            values(&parsed),
            vec!["param with 'quotes'", "and \"double\"  ones"]
        );
    }

    #[test]
    fn test_mixed_quoted_and_plain_params() {
        let parsed =
            tokenize("MyCommand first_param \"second param\" 'third param' fourth_param").unwrap();
        assert_eq!(
            values(&parsed),
            vec!["first_param", "second param", "third param", "fourth_param"]
        );
    }

    #[test]
    fn test_unterminated_quote_runs_to_end_of_line() {
        let line = "MyCommand one 'two three ";
        let parsed = tokenize(line).unwrap();
        assert_eq!(values(&parsed), vec!["one", "two three "]);
        let last = &parsed.params()[1];
        assert!(!last.is_closed());
        assert_eq!(last.span(), 14..line.len());
    }

    #[test]
    fn test_quote_inside_plain_word_is_literal() {
        let parsed = tokenize("cmd it's").unwrap();
        assert_eq!(values(&parsed), vec!["it's"]);
    }

    #[test]
    fn test_closing_quote_ends_token() {
        let parsed = tokenize("cmd 'a b'c").unwrap();
        assert_eq!(values(&parsed), vec!["a b", "c"]);
    }

    #[test]
    fn test_spans_cover_raw_text() {
        let line = "cmd  alpha \"be ta\"";
        let parsed = tokenize(line).unwrap();
        assert_eq!(parsed.command_token().span(), 0..3);
        assert_eq!(parsed.params()[0].span(), 5..10);
        assert_eq!(&line[parsed.params()[1].span()], "\"be ta\"");
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert_eq!(tokenize(""), Err(LexingError::Empty));
        assert_eq!(tokenize("   \t "), Err(LexingError::Empty));
    }

    #[test]
    fn test_invalid_command_character() {
        match tokenize("exit!") {
            Err(LexingError::Syntax(err)) => {
                assert_eq!(err.offset, 4);
                assert_eq!(err.column, 5);
                assert_eq!(err.line, "exit!");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_bang_is_not_a_command() {
        match tokenize("  !ls") {
            Err(LexingError::Syntax(err)) => assert_eq!(err.offset, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_command_is_rejected() {
        match tokenize("'cmd' arg") {
            Err(LexingError::Syntax(err)) => assert_eq!(err.offset, 0),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_question_mark_command() {
        let parsed = tokenize("? exit").unwrap();
        assert_eq!(parsed.command(), "?");
        assert_eq!(parsed.param_values(), vec!["exit".to_string()]);
    }

    #[test]
    fn test_scan_keeps_invalid_command_words() {
        let tokens = scan("!ls -la");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value(), "!ls");
    }
}
