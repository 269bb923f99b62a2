// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for tally programs.
//!
//! The parser consumes the token stream produced by the
//! [`Lexer`](super::Lexer) and builds the AST, resolving names and
//! constructing metrics as it goes. It is designed for batch diagnostics:
//!
//! - **Error recovery is mandatory** — a parse always produces a tree
//! - **Multiple errors** — every problem is reported, not just the first
//! - **Precise positions** — every diagnostic points at a source location
//! - **Synchronization points** — recovery resumes at statement boundaries
//!
//! Semantic actions run inline with parsing: block entry pushes a scope and
//! block exit seals it onto the block's AST node; patterns are compiled
//! eagerly so their capture groups become symbols visible to the rest of
//! the scope; metric declarations construct metric objects and register the
//! non-hidden ones with the [`MetricStore`] passed to [`parse`].
//!
//! # Usage
//!
//! ```
//! use tally_core::metrics::MetricStore;
//! use tally_core::source_analysis::parse;
//!
//! let mut store = MetricStore::new();
//! let (program, diagnostics) =
//!     parse("example", "counter lines\n/^ERROR/ { lines++ }", &mut store);
//!
//! assert!(diagnostics.is_empty());
//! assert_eq!(program.block.stmts.len(), 2);
//! assert_eq!(store.len(), 1);
//! ```

use std::collections::HashMap;

use ecow::EcoString;

use crate::ast::{Block, DefId, PatternId, Program};
use crate::metrics::MetricStore;
use crate::semantic_analysis::{Binding, ScopeId, Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::source_analysis::{Position, Token, TokenKind, lex};

use super::error::ParseErrors;

// Submodules with additional impl blocks for Parser
mod expressions;
mod statements;


/// A diagnostic message (error or warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The message text.
    pub message: EcoString,
    /// The source location.
    pub pos: Position,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, pos: Position) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            pos,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, pos: Position) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            pos,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.pos, self.severity, self.message)
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// An error that invalidates the parsed program.
    Error,
    /// A warning that should be addressed.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// Parses a named program source into an AST, registering declared metrics
/// with `store`.
///
/// Always returns a [`Program`]; if the diagnostic list contains any
/// [`Severity::Error`] entry the tree must be treated as invalid. The
/// parser is one-shot: each call builds its own lexer, scope stack and
/// symbol table.
#[must_use]
pub fn parse(name: &str, source: &str, store: &mut MetricStore) -> (Program, Vec<Diagnostic>) {
    let tokens = lex(name, source);
    let mut parser = Parser::new(name, tokens, store);
    let block = parser.parse_program();
    debug_assert_eq!(parser.scope, parser.symtab.root(), "unbalanced scope stack");
    let Parser {
        symtab,
        diagnostics,
        ..
    } = parser;
    (
        Program {
            name: name.into(),
            block,
            symbols: symtab,
        },
        diagnostics,
    )
}

/// Parses a named program source, returning the AST only when it is clean.
///
/// This is the strict form of [`parse`]: exactly one of the program or the
/// error list is produced.
///
/// # Errors
///
/// Returns [`ParseErrors`] carrying every diagnostic when the source does
/// not compile.
pub fn compile(name: &str, source: &str, store: &mut MetricStore) -> Result<Program, ParseErrors> {
    let (program, diagnostics) = parse(name, source, store);
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        Err(ParseErrors {
            program: name.into(),
            diagnostics,
        })
    } else {
        Ok(program)
    }
}

/// The parser state.
pub(super) struct Parser<'store> {
    /// The program name, carried into metrics and positions.
    pub(super) name: EcoString,
    /// The tokens being parsed, ending in a terminal sentinel.
    pub(super) tokens: Vec<Token>,
    /// Current token index.
    pub(super) current: usize,
    /// Accumulated diagnostics.
    pub(super) diagnostics: Vec<Diagnostic>,
    /// The scopes and symbols built so far.
    pub(super) symtab: SymbolTable,
    /// The scope statements are currently being parsed in.
    pub(super) scope: ScopeId,
    /// Pattern texts named by `const`, substituted during concatenation.
    pub(super) const_patterns: HashMap<EcoString, EcoString>,
    /// The store non-hidden metric declarations register with.
    pub(super) store: &'store mut MetricStore,
    /// Parse-order allocator for [`PatternId`]s.
    next_pattern: usize,
    /// Parse-order allocator for [`DefId`]s.
    next_def: usize,
}

impl<'store> Parser<'store> {
    /// Creates a new parser over a lexed token stream.
    fn new(name: &str, tokens: Vec<Token>, store: &'store mut MetricStore) -> Self {
        let symtab = SymbolTable::new();
        let scope = symtab.root();
        Self {
            name: name.into(),
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            symtab,
            scope,
            const_patterns: HashMap::new(),
            store,
            next_pattern: 0,
            next_def: 0,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token {
        if self.current < self.tokens.len() {
            &self.tokens[self.current]
        } else {
            // The stream always ends in a terminal sentinel; fall back to it
            // rather than panicking if we ever run past the end.
            self.tokens
                .last()
                .expect("token stream always contains a sentinel")
        }
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> TokenKind {
        self.current_token().kind()
    }

    /// Peeks at the kind of the token after the current one.
    pub(super) fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.current + 1).map(Token::kind)
    }

    /// Checks if we're at the end of input (EOF or a lexical error).
    pub(super) fn at_end(&self) -> bool {
        self.current_kind().is_terminal()
    }

    /// Advances to the next token and returns the consumed one. At the end
    /// of input this returns the sentinel without advancing.
    pub(super) fn advance(&mut self) -> Token {
        if self.at_end() {
            self.current_token().clone()
        } else {
            self.current += 1;
            self.tokens[self.current - 1].clone()
        }
    }

    /// Checks if the current token matches the given kind.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consumes the current token if it matches the given kind.
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to match the given kind, advancing if it
    /// does. Reports an error and returns `None` otherwise.
    pub(super) fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(message);
            None
        }
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Reports an error at the current token.
    pub(super) fn error(&mut self, message: impl Into<EcoString>) {
        let pos = self.current_token().pos().clone();
        self.diagnostics.push(Diagnostic::error(message, pos));
    }

    /// Reports an error at a specific position.
    pub(super) fn error_at(&mut self, pos: Position, message: impl Into<EcoString>) {
        self.diagnostics.push(Diagnostic::error(message, pos));
    }

    /// Synchronizes the parser to a statement boundary after an error:
    /// a block close, a statement-starting reserved word, a decorator, a
    /// pattern, or the start of the next source line.
    pub(super) fn synchronize(&mut self) {
        let line = self.current_token().pos().line();
        while !self.at_end() {
            if self.current_token().pos().line() > line {
                return;
            }
            if matches!(
                self.current_kind(),
                TokenKind::RCurly
                    | TokenKind::Counter
                    | TokenKind::Gauge
                    | TokenKind::Hidden
                    | TokenKind::Def
                    | TokenKind::Deco
                    | TokenKind::Next
                    | TokenKind::Const
                    | TokenKind::Regex
            ) {
                return;
            }
            self.advance();
        }
    }

    // ========================================================================
    // Scopes & Symbols
    // ========================================================================

    /// Enters a new scope and returns it.
    pub(super) fn push_scope(&mut self) -> ScopeId {
        self.scope = self.symtab.push_scope(self.scope);
        self.scope
    }

    /// Leaves the current scope. A no-op at the root.
    pub(super) fn pop_scope(&mut self) {
        if let Some(parent) = self.symtab.parent(self.scope) {
            self.scope = parent;
        }
    }

    /// Declares a symbol in the current scope.
    pub(super) fn define_symbol(
        &mut self,
        name: EcoString,
        kind: SymbolKind,
        binding: Option<Binding>,
        declared_at: Position,
        addr: usize,
    ) -> SymbolId {
        self.symtab.define(
            self.scope,
            Symbol {
                name,
                kind,
                binding,
                declared_at,
                addr,
            },
        )
    }

    /// Allocates the next pattern id.
    pub(super) fn alloc_pattern(&mut self) -> PatternId {
        let id = PatternId::new(self.next_pattern);
        self.next_pattern += 1;
        id
    }

    /// Allocates the next decorator definition id.
    pub(super) fn alloc_def(&mut self) -> DefId {
        let id = DefId::new(self.next_def);
        self.next_def += 1;
        id
    }

    // ========================================================================
    // Program Entry
    // ========================================================================

    /// Parses the whole program as the root block.
    fn parse_program(&mut self) -> Block {
        let scope = self.push_scope();
        let mut stmts = Vec::new();
        while !self.at_end() {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
        }
        if self.check(TokenKind::Invalid) {
            let token = self.current_token().clone();
            self.diagnostics
                .push(Diagnostic::error(token.text().clone(), token.pos().clone()));
        }
        self.pop_scope();
        Block { stmts, scope }
    }
}
