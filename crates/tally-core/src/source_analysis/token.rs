// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for tally lexical analysis.
//!
//! Each token is a [`TokenKind`] plus the token's `text` and its source
//! [`Position`]. The text is the source spelling for identifier-like tokens
//! and operators, the *decoded* payload for quoted strings and regex
//! literals (escape sequences resolved), the name without its sigil for
//! capture references and decorators, and the error message for
//! [`TokenKind::Invalid`].

use ecow::EcoString;

use super::Position;

/// The kind of a token, not including its text or source location.
///
/// `Eof` and `Invalid` are *terminal* kinds: once the lexer has emitted one
/// of them it emits the same token on every further call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Lexing failed; the token text carries the error message.
    Invalid,
    /// End of input.
    Eof,

    // === Reserved words ===
    /// `counter`
    Counter,
    /// `gauge`
    Gauge,
    /// `as`
    As,
    /// `by`
    By,
    /// `const`
    Const,
    /// `hidden`
    Hidden,
    /// `def`
    Def,
    /// `next`
    Next,

    // === Identifier-like ===
    /// A builtin function name: `strptime`, `timestamp`, `tolower`, `len`
    Builtin,
    /// A regex literal: `/foo\d+/` (text is the decoded payload)
    Regex,
    /// A quoted string: `"foo"` (text is the decoded payload)
    String,
    /// A capture group reference: `$1`, `$name` (text omits the `$`)
    Capref,
    /// An identifier: `foo`, `line-count`
    Id,
    /// A decorator invocation: `@name` (text omits the `@`)
    Deco,
    /// An integer literal: `42` (text is the digit string)
    Numeric,

    // === Operators ===
    /// `++`
    Inc,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `+=`
    AddAssign,
    /// `=`
    Assign,

    // === Punctuation ===
    /// `{`
    LCurly,
    /// `}`
    RCurly,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LSquare,
    /// `]`
    RSquare,
    /// `,`
    Comma,
}

impl TokenKind {
    /// Returns `true` if this is the end-of-input marker.
    #[must_use]
    pub const fn is_eof(self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns `true` if this is the invalid-input marker.
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Returns `true` if the lexer stops after emitting this kind.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Eof | Self::Invalid)
    }

    /// Returns `true` if this kind is a reserved word of the language.
    #[must_use]
    pub const fn is_reserved_word(self) -> bool {
        matches!(
            self,
            Self::Counter
                | Self::Gauge
                | Self::As
                | Self::By
                | Self::Const
                | Self::Hidden
                | Self::Def
                | Self::Next
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Invalid => "<invalid>",
            Self::Eof => "<eof>",
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::As => "as",
            Self::By => "by",
            Self::Const => "const",
            Self::Hidden => "hidden",
            Self::Def => "def",
            Self::Next => "next",
            Self::Builtin => "builtin",
            Self::Regex => "regular expression",
            Self::String => "quoted string",
            Self::Capref => "capture group reference",
            Self::Id => "identifier",
            Self::Deco => "decorator",
            Self::Numeric => "number",
            Self::Inc => "++",
            Self::Minus => "-",
            Self::Plus => "+",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::AddAssign => "+=",
            Self::Assign => "=",
            Self::LCurly => "{",
            Self::RCurly => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LSquare => "[",
            Self::RSquare => "]",
            Self::Comma => ",",
        };
        f.write_str(name)
    }
}

/// A token with its text and source position.
///
/// # Examples
///
/// ```
/// use tally_core::source_analysis::{Position, Token, TokenKind};
///
/// let token = Token::new(TokenKind::Id, "foo", Position::new("p", 0, 0, 2));
/// assert_eq!(token.kind(), TokenKind::Id);
/// assert_eq!(token.text(), "foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: EcoString,
    pos: Position,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<EcoString>, pos: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// The kind of this token.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The token text: spelling, decoded payload, or error message.
    #[must_use]
    pub const fn text(&self) -> &EcoString {
        &self.text
    }

    /// The source position of this token.
    #[must_use]
    pub const fn pos(&self) -> &Position {
        &self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_predicates() {
        assert!(TokenKind::Eof.is_eof());
        assert!(TokenKind::Eof.is_terminal());
        assert!(TokenKind::Invalid.is_invalid());
        assert!(TokenKind::Invalid.is_terminal());
        assert!(!TokenKind::Id.is_terminal());

        assert!(TokenKind::Counter.is_reserved_word());
        assert!(TokenKind::Next.is_reserved_word());
        assert!(!TokenKind::Builtin.is_reserved_word());
        assert!(!TokenKind::Id.is_reserved_word());
    }

    #[test]
    fn kind_display() {
        assert_eq!(TokenKind::Counter.to_string(), "counter");
        assert_eq!(TokenKind::Inc.to_string(), "++");
        assert_eq!(TokenKind::LCurly.to_string(), "{");
        assert_eq!(TokenKind::Eof.to_string(), "<eof>");
        assert_eq!(TokenKind::Regex.to_string(), "regular expression");
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(TokenKind::Numeric, "42", Position::new("t", 0, 4, 5));
        assert_eq!(token.kind(), TokenKind::Numeric);
        assert_eq!(token.text(), "42");
        assert_eq!(token.pos().start_col(), 4);
        assert_eq!(token.pos().end_col(), 5);
    }
}
