// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the lexer.
//!
//! These pin the stream-level invariants that the table tests in
//! `lexer.rs` cannot cover exhaustively: sentinel discipline, determinism,
//! and agreement between token positions and the source text.

use proptest::prelude::*;

use super::{TokenKind, lex};

/// Extracts the characters of `line` between `start` and `end` columns
/// (inclusive), counting in characters as the lexer does.
fn line_slice(source: &str, line: u32, start: u32, end: u32) -> String {
    let line = source.split('\n').nth(line as usize).unwrap_or("");
    line.chars()
        .skip(start as usize)
        .take((end - start + 1) as usize)
        .collect()
}

proptest! {
    /// Every token stream ends in exactly one terminal sentinel, and no
    /// sentinel appears earlier.
    #[test]
    fn exactly_one_terminal_sentinel(source in ".{0,200}") {
        let tokens = lex("prop", &source);
        prop_assert!(!tokens.is_empty());
        prop_assert!(tokens.last().unwrap().kind().is_terminal());
        let terminals = tokens.iter().filter(|t| t.kind().is_terminal()).count();
        prop_assert_eq!(terminals, 1);
    }

    /// Lexing the same input twice produces identical streams.
    #[test]
    fn lexing_is_deterministic(source in ".{0,200}") {
        prop_assert_eq!(lex("prop", &source), lex("prop", &source));
    }

    /// For tokens whose text is their raw spelling, the position points at
    /// exactly that spelling in the source.
    #[test]
    fn positions_agree_with_the_source(source in "[a-z0-9_ \n{}(),+=<>!-]{0,120}") {
        for token in lex("prop", &source) {
            let spelled = matches!(
                token.kind(),
                TokenKind::Id
                    | TokenKind::Numeric
                    | TokenKind::Builtin
                    | TokenKind::Inc
                    | TokenKind::Minus
                    | TokenKind::Plus
                    | TokenKind::Lt
                    | TokenKind::Gt
                    | TokenKind::Le
                    | TokenKind::Ge
                    | TokenKind::Eq
                    | TokenKind::Ne
                    | TokenKind::AddAssign
                    | TokenKind::Assign
                    | TokenKind::LCurly
                    | TokenKind::RCurly
                    | TokenKind::LParen
                    | TokenKind::RParen
                    | TokenKind::LSquare
                    | TokenKind::RSquare
                    | TokenKind::Comma
            ) || token.kind().is_reserved_word();
            if !spelled {
                continue;
            }
            let pos = token.pos();
            let slice = line_slice(&source, pos.line(), pos.start_col(), pos.end_col());
            prop_assert_eq!(
                &slice,
                token.text().as_str(),
                "token {:?} at {}",
                token.kind(),
                pos
            );
        }
    }

    /// Identifier-heavy input never produces an invalid token.
    #[test]
    fn word_soup_always_lexes(source in "[a-z_][a-z0-9_-]{0,20}( [a-z_][a-z0-9_-]{0,20}){0,10}") {
        let tokens = lex("prop", &source);
        prop_assert_eq!(tokens.last().unwrap().kind(), TokenKind::Eof);
    }
}
