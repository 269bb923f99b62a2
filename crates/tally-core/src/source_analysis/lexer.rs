// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for tally programs.
//!
//! This module converts source text into a stream of [`Token`]s. The lexer
//! is hand-written: the language mixes ordinary operators with stateful
//! lexemes (quoted strings, regex literals, capture references), and a
//! hand-rolled scanner gives full control over error recovery and positions.
//!
//! # Design Principles
//!
//! - **Error recovery**: never panic on malformed input; emit
//!   [`TokenKind::Invalid`] carrying the error message as the token text
//! - **Terminal sentinels**: after `Eof` or `Invalid` has been emitted,
//!   every further call returns the same token
//! - **Precise positions**: every token carries its line and inclusive
//!   column range
//!
//! # Example
//!
//! ```
//! use tally_core::source_analysis::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("demo", "counter foo");
//! assert_eq!(lexer.next_token().kind(), TokenKind::Counter);
//! assert_eq!(lexer.next_token().text(), "foo");
//! assert_eq!(lexer.next_token().kind(), TokenKind::Eof);
//! ```

use std::iter::Peekable;
use std::str::Chars;

use ecow::{EcoString, eco_format};

use super::{Position, Token, TokenKind};

/// Looks up the token kind for a reserved word, if the lexeme is one.
fn reserved_word(lexeme: &str) -> Option<TokenKind> {
    match lexeme {
        "counter" => Some(TokenKind::Counter),
        "gauge" => Some(TokenKind::Gauge),
        "as" => Some(TokenKind::As),
        "by" => Some(TokenKind::By),
        "hidden" => Some(TokenKind::Hidden),
        "def" => Some(TokenKind::Def),
        "next" => Some(TokenKind::Next),
        "const" => Some(TokenKind::Const),
        _ => None,
    }
}

/// The builtin function names recognised by the language.
const BUILTINS: [&str; 4] = ["strptime", "timestamp", "tolower", "len"];

/// A lexer that tokenizes a tally program.
///
/// The token stream is a finite lazy sequence ending in exactly one terminal
/// sentinel (`Eof` on success, `Invalid` on a lexical error). The lexer also
/// implements [`Iterator`], yielding every token including the sentinel and
/// then `None`.
pub struct Lexer<'src> {
    /// Program name, carried on every position.
    name: EcoString,
    /// Remaining input.
    chars: Peekable<Chars<'src>>,
    /// Zero-indexed current line.
    line: u32,
    /// Zero-indexed current column, in characters.
    col: u32,
    /// Line where the current token started.
    start_line: u32,
    /// Column where the current token started.
    start_col: u32,
    /// The terminal sentinel, once emitted.
    terminal: Option<Token>,
    /// Whether the iterator has yielded the sentinel.
    exhausted: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("name", &self.name)
            .field("line", &self.line)
            .field("col", &self.col)
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the named program source.
    #[must_use]
    pub fn new(name: impl Into<EcoString>, source: &'src str) -> Self {
        Self {
            name: name.into(),
            chars: source.chars().peekable(),
            line: 0,
            col: 0,
            start_line: 0,
            start_col: 0,
            terminal: None,
            exhausted: false,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consumes the next character, tracking line and column counters.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `#` line comments. Comments run up to, but not
    /// including, the next newline.
    fn skip_ignored(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('#') => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// The position of the token that started at `mark`, ending at the last
    /// consumed character.
    fn span(&self) -> Position {
        let end = if self.col > self.start_col {
            self.col - 1
        } else {
            self.start_col
        };
        Position::new(self.name.clone(), self.start_line, self.start_col, end)
    }

    /// Builds a token covering the current span.
    fn token(&self, kind: TokenKind, text: impl Into<EcoString>) -> Token {
        Token::new(kind, text, self.span())
    }

    /// Builds a terminal token and records it for replay on further calls.
    fn emit_terminal(&mut self, kind: TokenKind, text: impl Into<EcoString>) -> Token {
        let token = self.token(kind, text);
        self.terminal = Some(token.clone());
        token
    }

    /// Consumes one character and builds a single-character token.
    fn single(&mut self, kind: TokenKind, text: &str) -> Token {
        self.advance();
        self.token(kind, text)
    }

    /// Returns the next token. After the terminal sentinel (`Eof` or
    /// `Invalid`) has been returned once, every further call returns the
    /// same token.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = &self.terminal {
            return token.clone();
        }

        self.skip_ignored();
        self.start_line = self.line;
        self.start_col = self.col;

        let Some(c) = self.peek_char() else {
            return self.emit_terminal(TokenKind::Eof, "");
        };

        match c {
            '{' => self.single(TokenKind::LCurly, "{"),
            '}' => self.single(TokenKind::RCurly, "}"),
            '(' => self.single(TokenKind::LParen, "("),
            ')' => self.single(TokenKind::RParen, ")"),
            '[' => self.single(TokenKind::LSquare, "["),
            ']' => self.single(TokenKind::RSquare, "]"),
            ',' => self.single(TokenKind::Comma, ","),
            '-' => self.single(TokenKind::Minus, "-"),
            '+' => {
                self.advance();
                match self.peek_char() {
                    Some('+') => {
                        self.advance();
                        self.token(TokenKind::Inc, "++")
                    }
                    Some('=') => {
                        self.advance();
                        self.token(TokenKind::AddAssign, "+=")
                    }
                    _ => self.token(TokenKind::Plus, "+"),
                }
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.token(TokenKind::Eq, "==")
                } else {
                    self.token(TokenKind::Assign, "=")
                }
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.token(TokenKind::Ne, "!=")
                } else {
                    self.emit_terminal(TokenKind::Invalid, "Unexpected input: '!'")
                }
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.token(TokenKind::Le, "<=")
                } else {
                    self.token(TokenKind::Lt, "<")
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.token(TokenKind::Ge, ">=")
                } else {
                    self.token(TokenKind::Gt, ">")
                }
            }
            '"' => self.lex_quoted_string(),
            '/' => self.lex_regex(),
            '$' => self.lex_capref(),
            '@' => self.lex_decorator(),
            '0'..='9' => self.lex_numeric(),
            'A'..='Z' | 'a'..='z' | '_' => self.lex_word(),
            _ => {
                self.advance();
                self.emit_terminal(TokenKind::Invalid, eco_format!("Unexpected input: '{c}'"))
            }
        }
    }

    /// Lexes an identifier, reserved word, or builtin name. Identifiers may
    /// contain hyphens after the first character.
    fn lex_word(&mut self) -> Token {
        let mut text = EcoString::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = reserved_word(&text).unwrap_or_else(|| {
            if BUILTINS.contains(&text.as_str()) {
                TokenKind::Builtin
            } else {
                TokenKind::Id
            }
        });
        self.token(kind, text)
    }

    /// Lexes an integer literal. The token text is the digit string; the
    /// parser converts it to a value.
    fn lex_numeric(&mut self) -> Token {
        let mut text = EcoString::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.token(TokenKind::Numeric, text)
    }

    /// Lexes a quoted string. A backslash escapes the next character, which
    /// is included in the payload without the backslash (`\"` contributes
    /// `"`, `\\` contributes `\`). A newline before the closing quote is a
    /// lexical error.
    fn lex_quoted_string(&mut self) -> Token {
        let mut raw = EcoString::from("\"");
        let mut text = EcoString::new();
        self.advance(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return self.emit_terminal(
                        TokenKind::Invalid,
                        eco_format!("Unterminated quoted string: {raw:?}"),
                    );
                }
                Some('"') => {
                    self.advance();
                    return self.token(TokenKind::String, text);
                }
                Some('\\') => {
                    self.advance();
                    raw.push('\\');
                    match self.advance() {
                        Some(c) => {
                            raw.push(c);
                            text.push(c);
                        }
                        None => {
                            return self.emit_terminal(
                                TokenKind::Invalid,
                                eco_format!("Unterminated quoted string: {raw:?}"),
                            );
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    raw.push(c);
                    text.push(c);
                }
            }
        }
    }

    /// Lexes a regex literal. `\/` contributes `/` to the payload; every
    /// other escape is retained verbatim (backslash and character) so the
    /// regex engine can interpret it. A newline before the closing slash is
    /// a lexical error.
    fn lex_regex(&mut self) -> Token {
        let mut raw = EcoString::from("/");
        let mut text = EcoString::new();
        self.advance(); // opening slash
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return self.emit_terminal(
                        TokenKind::Invalid,
                        eco_format!("Unterminated regular expression: {raw:?}"),
                    );
                }
                Some('/') => {
                    self.advance();
                    return self.token(TokenKind::Regex, text);
                }
                Some('\\') => {
                    self.advance();
                    raw.push('\\');
                    match self.advance() {
                        Some('/') => {
                            raw.push('/');
                            text.push('/');
                        }
                        Some(c) => {
                            raw.push(c);
                            text.push('\\');
                            text.push(c);
                        }
                        None => {
                            return self.emit_terminal(
                                TokenKind::Invalid,
                                eco_format!("Unterminated regular expression: {raw:?}"),
                            );
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    raw.push(c);
                    text.push(c);
                }
            }
        }
    }

    /// Lexes a capture group reference: `$` followed by a group number or a
    /// group name. The token text omits the `$`.
    fn lex_capref(&mut self) -> Token {
        self.advance(); // $
        let mut text = EcoString::new();
        match self.peek_char() {
            Some(c) if c.is_ascii_digit() => {
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            _ => return self.emit_terminal(TokenKind::Invalid, "Unexpected input: '$'"),
        }
        self.token(TokenKind::Capref, text)
    }

    /// Lexes a decorator invocation: `@` followed by an identifier. The
    /// token text omits the `@`.
    fn lex_decorator(&mut self) -> Token {
        self.advance(); // @
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = EcoString::new();
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.token(TokenKind::Deco, text)
            }
            _ => self.emit_terminal(TokenKind::Invalid, "Unexpected input: '@'"),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let token = self.next_token();
        if token.kind().is_terminal() {
            self.exhausted = true;
        }
        Some(token)
    }
}

/// Lexes a whole program into a vector of tokens, terminated by exactly one
/// `Eof` or `Invalid` sentinel.
#[must_use]
pub fn lex(name: &str, source: &str) -> Vec<Token> {
    Lexer::new(name, source).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::TokenKind as K;
    use super::*;

    /// Flattens a token stream for table comparisons:
    /// `(kind, text, line, start_col, end_col)`.
    fn collect(name: &str, source: &str) -> Vec<(TokenKind, String, u32, u32, u32)> {
        lex(name, source)
            .into_iter()
            .map(|t| {
                (
                    t.kind(),
                    t.text().to_string(),
                    t.pos().line(),
                    t.pos().start_col(),
                    t.pos().end_col(),
                )
            })
            .collect()
    }

    #[test]
    fn empty_input() {
        assert_eq!(collect("empty", ""), vec![(K::Eof, String::new(), 0, 0, 0)]);
    }

    #[test]
    fn spaces_only() {
        assert_eq!(
            collect("spaces", " \t\n"),
            vec![(K::Eof, String::new(), 1, 0, 0)]
        );
    }

    #[test]
    fn comment_only() {
        assert_eq!(
            collect("comment", "# comment"),
            vec![(K::Eof, String::new(), 0, 9, 9)]
        );
    }

    #[test]
    fn comment_not_at_start_of_line() {
        assert_eq!(
            collect("comment2", "  # comment"),
            vec![(K::Eof, String::new(), 0, 11, 11)]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            collect("punct", "{}()[],"),
            vec![
                (K::LCurly, "{".into(), 0, 0, 0),
                (K::RCurly, "}".into(), 0, 1, 1),
                (K::LParen, "(".into(), 0, 2, 2),
                (K::RParen, ")".into(), 0, 3, 3),
                (K::LSquare, "[".into(), 0, 4, 4),
                (K::RSquare, "]".into(), 0, 5, 5),
                (K::Comma, ",".into(), 0, 6, 6),
                (K::Eof, String::new(), 0, 7, 7),
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            collect("ops", "- + = ++ += < > <= >= == !="),
            vec![
                (K::Minus, "-".into(), 0, 0, 0),
                (K::Plus, "+".into(), 0, 2, 2),
                (K::Assign, "=".into(), 0, 4, 4),
                (K::Inc, "++".into(), 0, 6, 7),
                (K::AddAssign, "+=".into(), 0, 9, 10),
                (K::Lt, "<".into(), 0, 12, 12),
                (K::Gt, ">".into(), 0, 14, 14),
                (K::Le, "<=".into(), 0, 16, 17),
                (K::Ge, ">=".into(), 0, 19, 20),
                (K::Eq, "==".into(), 0, 22, 23),
                (K::Ne, "!=".into(), 0, 25, 26),
                (K::Eof, String::new(), 0, 27, 27),
            ]
        );
    }

    #[test]
    fn reserved_words() {
        assert_eq!(
            collect("kw", "counter\ngauge\nas\nby\nhidden\ndef\nnext\nconst\n"),
            vec![
                (K::Counter, "counter".into(), 0, 0, 6),
                (K::Gauge, "gauge".into(), 1, 0, 4),
                (K::As, "as".into(), 2, 0, 1),
                (K::By, "by".into(), 3, 0, 1),
                (K::Hidden, "hidden".into(), 4, 0, 5),
                (K::Def, "def".into(), 5, 0, 2),
                (K::Next, "next".into(), 6, 0, 3),
                (K::Const, "const".into(), 7, 0, 4),
                (K::Eof, String::new(), 8, 0, 0),
            ]
        );
    }

    #[test]
    fn builtins() {
        assert_eq!(
            collect("builtins", "strptime\ntimestamp\ntolower\nlen\n"),
            vec![
                (K::Builtin, "strptime".into(), 0, 0, 7),
                (K::Builtin, "timestamp".into(), 1, 0, 8),
                (K::Builtin, "tolower".into(), 2, 0, 6),
                (K::Builtin, "len".into(), 3, 0, 2),
                (K::Eof, String::new(), 4, 0, 0),
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            collect("num", "1 23"),
            vec![
                (K::Numeric, "1".into(), 0, 0, 0),
                (K::Numeric, "23".into(), 0, 2, 3),
                (K::Eof, String::new(), 0, 4, 4),
            ]
        );
    }

    #[test]
    fn identifiers_including_hyphens() {
        assert_eq!(
            collect("id", "a be foo\nquux line-count"),
            vec![
                (K::Id, "a".into(), 0, 0, 0),
                (K::Id, "be".into(), 0, 2, 3),
                (K::Id, "foo".into(), 0, 5, 7),
                (K::Id, "quux".into(), 1, 0, 3),
                (K::Id, "line-count".into(), 1, 5, 14),
                (K::Eof, String::new(), 1, 15, 15),
            ]
        );
    }

    #[test]
    fn regex_literal() {
        assert_eq!(
            collect("re", "/asdf/"),
            vec![
                (K::Regex, "asdf".into(), 0, 0, 5),
                (K::Eof, String::new(), 0, 6, 6),
            ]
        );
    }

    #[test]
    fn regex_with_escaped_slash() {
        assert_eq!(
            collect("re", r"/asdf\//"),
            vec![
                (K::Regex, "asdf/".into(), 0, 0, 7),
                (K::Eof, String::new(), 0, 8, 8),
            ]
        );
    }

    #[test]
    fn regex_keeps_other_escapes_verbatim() {
        assert_eq!(
            collect("re", r"/foo\d\//"),
            vec![
                (K::Regex, r"foo\d/".into(), 0, 0, 8),
                (K::Eof, String::new(), 0, 9, 9),
            ]
        );
    }

    #[test]
    fn named_capref() {
        assert_eq!(
            collect("capref", "$foo"),
            vec![
                (K::Capref, "foo".into(), 0, 0, 3),
                (K::Eof, String::new(), 0, 4, 4),
            ]
        );
    }

    #[test]
    fn numeric_capref() {
        assert_eq!(
            collect("capref", "$1"),
            vec![
                (K::Capref, "1".into(), 0, 0, 1),
                (K::Eof, String::new(), 0, 2, 2),
            ]
        );
    }

    #[test]
    fn capref_with_trailing_punctuation() {
        assert_eq!(
            collect("capref", "$foo,"),
            vec![
                (K::Capref, "foo".into(), 0, 0, 3),
                (K::Comma, ",".into(), 0, 4, 4),
                (K::Eof, String::new(), 0, 5, 5),
            ]
        );
    }

    #[test]
    fn quoted_string() {
        assert_eq!(
            collect("str", r#""asdf""#),
            vec![
                (K::String, "asdf".into(), 0, 0, 5),
                (K::Eof, String::new(), 0, 6, 6),
            ]
        );
    }

    #[test]
    fn escaped_quote_in_string() {
        assert_eq!(
            collect("str", r#""\"""#),
            vec![
                (K::String, "\"".into(), 0, 0, 3),
                (K::Eof, String::new(), 0, 4, 4),
            ]
        );
    }

    #[test]
    fn decorator() {
        assert_eq!(
            collect("deco", "@foo"),
            vec![
                (K::Deco, "foo".into(), 0, 0, 3),
                (K::Eof, String::new(), 0, 4, 4),
            ]
        );
    }

    #[test]
    fn larger_program() {
        let source =
            "/(?P<date>[[:digit:]-\\/ ])/ {\n  strptime($date, \"%Y/%m/%d %H:%M:%S\")\n  foo++\n}";
        assert_eq!(
            collect("large", source),
            vec![
                (K::Regex, "(?P<date>[[:digit:]-/ ])".into(), 0, 0, 26),
                (K::LCurly, "{".into(), 0, 28, 28),
                (K::Builtin, "strptime".into(), 1, 2, 9),
                (K::LParen, "(".into(), 1, 10, 10),
                (K::Capref, "date".into(), 1, 11, 15),
                (K::Comma, ",".into(), 1, 16, 16),
                (K::String, "%Y/%m/%d %H:%M:%S".into(), 1, 18, 36),
                (K::RParen, ")".into(), 1, 37, 37),
                (K::Id, "foo".into(), 2, 2, 4),
                (K::Inc, "++".into(), 2, 5, 6),
                (K::RCurly, "}".into(), 3, 0, 0),
                (K::Eof, String::new(), 3, 1, 1),
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines_advance_the_line_counter() {
        assert_eq!(
            collect("linecount", "# comment\n# blank line\n\nfoo"),
            vec![
                (K::Id, "foo".into(), 3, 0, 2),
                (K::Eof, String::new(), 3, 3, 3),
            ]
        );
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(
            collect("bad", "?"),
            vec![(K::Invalid, "Unexpected input: '?'".into(), 0, 0, 0)]
        );
    }

    #[test]
    fn lone_bang_is_invalid() {
        assert_eq!(
            collect("bad", "!"),
            vec![(K::Invalid, "Unexpected input: '!'".into(), 0, 0, 0)]
        );
    }

    #[test]
    fn unterminated_regex() {
        assert_eq!(
            collect("bad", "/foo\n"),
            vec![(
                K::Invalid,
                "Unterminated regular expression: \"/foo\"".into(),
                0,
                0,
                3
            )]
        );
    }

    #[test]
    fn unterminated_quoted_string() {
        assert_eq!(
            collect("bad", "\"foo\n"),
            vec![(
                K::Invalid,
                "Unterminated quoted string: \"\\\"foo\"".into(),
                0,
                0,
                3
            )]
        );
    }

    #[test]
    fn terminal_token_repeats() {
        let mut lexer = Lexer::new("bad", "?");
        let first = lexer.next_token();
        assert_eq!(first.kind(), K::Invalid);
        assert_eq!(lexer.next_token(), first);
        assert_eq!(lexer.next_token(), first);

        let mut lexer = Lexer::new("ok", "");
        let first = lexer.next_token();
        assert_eq!(first.kind(), K::Eof);
        assert_eq!(lexer.next_token(), first);
    }

    #[test]
    fn iterator_yields_sentinel_once() {
        let tokens: Vec<_> = Lexer::new("it", "foo ?").collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind(), K::Id);
        assert_eq!(tokens[1].kind(), K::Invalid);
    }
}
