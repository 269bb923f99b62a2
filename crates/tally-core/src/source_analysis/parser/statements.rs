// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing and its semantic actions.
//!
//! This module handles the statement level of the grammar:
//!
//! - conditional blocks, both pattern conditions and relational conditions
//! - pattern concatenation with `const`-named fragments, eager regex
//!   compilation and capture-group symbol reservation
//! - metric declarations (`hidden`, `by`, `as`) including metric
//!   construction and store registration
//! - decorator definitions (`def`) and applications (`@name`)
//! - `next` and `const`

use std::sync::Arc;

use ecow::{EcoString, eco_format};
use regex::Regex;

use crate::ast::{
    Block, CondStmt, DeclStmt, DecoStmt, DefStmt, Expr, PatternId, RegexExpr, Stmt,
};
use crate::metrics::{Metric, MetricKind};
use crate::semantic_analysis::{Binding, SymbolKind};
use crate::source_analysis::{Position, TokenKind};

use super::{Diagnostic, Parser};

impl Parser<'_> {
    /// Parses one statement. Returns `None` for statements that contribute
    /// no AST node (`const`) and for unrecoverable declaration errors.
    pub(super) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current_kind() {
            TokenKind::Counter | TokenKind::Gauge | TokenKind::Hidden => self.parse_decl(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Deco => Some(self.parse_deco()),
            TokenKind::Next => {
                let token = self.advance();
                Some(Stmt::Next(token.pos().clone()))
            }
            TokenKind::Const => {
                self.parse_const();
                None
            }
            TokenKind::Regex => Some(self.parse_pattern_cond()),
            _ => {
                let expr = self.parse_expression();
                if expr.is_error() {
                    self.synchronize();
                    return Some(Stmt::Expr(expr));
                }
                if self.check(TokenKind::LCurly) {
                    let pos = expr.pos().clone();
                    let body = self.parse_block();
                    Some(Stmt::Cond(CondStmt {
                        cond: expr,
                        body,
                        pos,
                    }))
                } else {
                    Some(Stmt::Expr(expr))
                }
            }
        }
    }

    /// Parses a `{ ... }` block, giving its statements a fresh scope. The
    /// scope is sealed onto the returned block so name resolution against
    /// it stays possible after the parse.
    pub(super) fn parse_block(&mut self) -> Block {
        self.expect(TokenKind::LCurly, "Expected '{' to open block");
        let scope = self.push_scope();
        let mut stmts = Vec::new();
        while !self.at_end() && !self.check(TokenKind::RCurly) {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
        }
        self.expect(TokenKind::RCurly, "Expected '}' to close block");
        self.pop_scope();
        Block { stmts, scope }
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    /// Parses a pattern condition and its block.
    fn parse_pattern_cond(&mut self) -> Stmt {
        let (pattern, marked) = self.parse_pattern();
        let id = self.alloc_pattern();
        let regex = self.compile_pattern(&pattern, id, &marked);
        let cond = Expr::Regex(RegexExpr {
            id,
            pattern,
            regex,
            pos: marked.clone(),
        });
        let body = if self.check(TokenKind::LCurly) {
            self.parse_block()
        } else {
            self.error("Expected '{' after pattern");
            // placeholder body with its own sealed scope
            let scope = self.symtab.push_scope(self.scope);
            Block {
                stmts: Vec::new(),
                scope,
            }
        };
        Stmt::Cond(CondStmt {
            cond,
            body,
            pos: marked,
        })
    }

    /// Parses a pattern expression: a regex literal optionally concatenated
    /// with further literals or `const`-named fragments. Returns the
    /// assembled pattern text and the position of its first token, which is
    /// where compile errors are reported.
    pub(super) fn parse_pattern(&mut self) -> (EcoString, Position) {
        let first = self.advance(); // the caller checked this is a Regex token
        let marked = first.pos().clone();
        let mut pattern = first.text().clone();
        while self.check(TokenKind::Plus) {
            match self.peek_kind() {
                Some(TokenKind::Regex) => {
                    self.advance(); // +
                    let token = self.advance();
                    pattern.push_str(token.text());
                }
                Some(TokenKind::Id) => {
                    self.advance(); // +
                    let token = self.advance();
                    match self.const_patterns.get(token.text()) {
                        Some(fragment) => pattern.push_str(fragment.as_str()),
                        None => {
                            let message =
                                eco_format!("Constant '{}' not defined.", token.text());
                            self.error_at(token.pos().clone(), message);
                        }
                    }
                }
                _ => {
                    self.advance(); // +
                    self.error("Expected regular expression or pattern constant after '+'");
                    break;
                }
            }
        }
        (pattern, marked)
    }

    /// Compiles a pattern eagerly and reserves capture-group symbols in the
    /// current scope so statements in (and after) the conditional can refer
    /// to them.
    ///
    /// For a pattern with N subgroups this defines `$0` for the whole match
    /// (addr 0), the numbered aliases `$1`..`$N` (addr i-1, one less than
    /// the subgroup index), and every named group under its name (addr i).
    /// On compile failure an error is recorded at the start of the pattern
    /// and no symbols are reserved.
    fn compile_pattern(
        &mut self,
        pattern: &str,
        id: PatternId,
        marked: &Position,
    ) -> Option<Regex> {
        match Regex::new(pattern) {
            Ok(regex) => {
                let subgroups = regex.captures_len() - 1;
                self.define_capture("0", 0, id, marked);
                for i in 1..=subgroups {
                    self.define_capture(&format!("{i}"), i - 1, id, marked);
                }
                for (i, name) in regex.capture_names().enumerate() {
                    if let Some(name) = name {
                        self.define_capture(name, i, id, marked);
                    }
                }
                Some(regex)
            }
            Err(err) => {
                self.diagnostics
                    .push(Diagnostic::error(err.to_string(), marked.clone()));
                None
            }
        }
    }

    /// Reserves one capture-group symbol in the current scope.
    fn define_capture(&mut self, name: &str, addr: usize, pattern: PatternId, pos: &Position) {
        self.define_symbol(
            name.into(),
            SymbolKind::Capture,
            Some(Binding::Pattern(pattern)),
            pos.clone(),
            addr,
        );
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Parses a metric declaration:
    /// `hidden? (counter|gauge) name (by keys | as "export")*`.
    fn parse_decl(&mut self) -> Option<Stmt> {
        let hidden = self.match_token(TokenKind::Hidden);
        let kind = match self.current_kind() {
            TokenKind::Counter => MetricKind::Counter,
            TokenKind::Gauge => MetricKind::Gauge,
            _ => {
                self.error("Expected 'counter' or 'gauge' after 'hidden'");
                self.synchronize();
                return None;
            }
        };
        self.advance();

        let name_token = match self.current_kind() {
            TokenKind::Id | TokenKind::String => self.advance(),
            _ => {
                self.error("Expected metric name");
                self.synchronize();
                return None;
            }
        };
        let name = name_token.text().clone();
        let pos = name_token.pos().clone();

        let mut keys: Vec<EcoString> = Vec::new();
        let mut exported_name = None;
        loop {
            if self.match_token(TokenKind::By) {
                loop {
                    match self.current_kind() {
                        TokenKind::Id | TokenKind::String => {
                            keys.push(self.advance().text().clone());
                        }
                        _ => {
                            self.error("Expected dimension key after 'by'");
                            break;
                        }
                    }
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
            } else if self.match_token(TokenKind::As) {
                if self.check(TokenKind::String) {
                    exported_name = Some(self.advance().text().clone());
                } else {
                    self.error("Expected quoted string after 'as'");
                }
            } else {
                break;
            }
        }
        keys.sort();

        // the metric exports under its `as` name; the symbol keeps the
        // logical name the program uses
        let metric_name = exported_name.clone().unwrap_or_else(|| name.clone());
        let metric = Arc::new(Metric::new(
            metric_name,
            self.name.clone(),
            kind,
            keys.clone(),
        ));
        let symbol = self.define_symbol(
            name.clone(),
            SymbolKind::Metric,
            Some(Binding::Metric(Arc::clone(&metric))),
            pos.clone(),
            0,
        );
        if !hidden {
            self.store.add(Arc::clone(&metric));
        }

        Some(Stmt::Decl(DeclStmt {
            kind,
            name,
            exported_name,
            keys,
            hidden,
            symbol: Some(symbol),
            metric: Some(metric),
            pos,
        }))
    }

    // ========================================================================
    // Decorators
    // ========================================================================

    /// Parses a decorator definition: `def name { body }`. The decorator
    /// symbol lands in the scope *enclosing* the body.
    fn parse_def(&mut self) -> Option<Stmt> {
        self.advance(); // def
        let Some(name_token) = self.expect(TokenKind::Id, "Expected decorator name after 'def'")
        else {
            self.synchronize();
            return None;
        };
        let name = name_token.text().clone();
        let pos = name_token.pos().clone();
        let body = self.parse_block();
        let id = self.alloc_def();
        let symbol = self.define_symbol(
            name.clone(),
            SymbolKind::Decorator,
            Some(Binding::Decorator(id)),
            pos.clone(),
            0,
        );
        Some(Stmt::Def(DefStmt {
            name,
            body,
            id,
            symbol: Some(symbol),
            pos,
        }))
    }

    /// Parses a decorator application: `@name { body }`. The name must
    /// resolve to a prior `def`; otherwise the node keeps a `None` target
    /// alongside the reported error.
    fn parse_deco(&mut self) -> Stmt {
        let token = self.advance();
        let name = token.text().clone();
        let pos = token.pos().clone();
        let def = match self.symtab.lookup(self.scope, &name, SymbolKind::Decorator) {
            Some(symbol) => match &self.symtab.symbol(symbol).binding {
                Some(Binding::Decorator(id)) => Some(*id),
                _ => None,
            },
            None => {
                self.error_at(pos.clone(), eco_format!("Decorator {name} not defined"));
                None
            }
        };
        let body = self.parse_block();
        Stmt::Deco(DecoStmt {
            name,
            body,
            def,
            pos,
        })
    }

    // ========================================================================
    // Constants
    // ========================================================================

    /// Parses `const ID pattern`, storing the resolved pattern text for
    /// later concatenation. Contributes no statement.
    fn parse_const(&mut self) {
        self.advance(); // const
        let Some(name_token) = self.expect(TokenKind::Id, "Expected constant name after 'const'")
        else {
            self.synchronize();
            return;
        };
        if !self.check(TokenKind::Regex) {
            self.error("Expected regular expression after constant name");
            self.synchronize();
            return;
        }
        let (pattern, _) = self.parse_pattern();
        self.const_patterns
            .insert(name_token.text().clone(), pattern);
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Stmt};
    use crate::metrics::{MetricKind, MetricStore};
    use crate::source_analysis::parse;

    fn parse_stmts(source: &str) -> (Vec<Stmt>, usize, usize) {
        let mut store = MetricStore::new();
        let (program, diagnostics) = parse("test", source, &mut store);
        (program.block.stmts, diagnostics.len(), store.len())
    }

    #[test]
    fn string_named_metric() {
        let (stmts, errors, registered) = parse_stmts("counter \"line count\"\n");
        assert_eq!(errors, 0);
        assert_eq!(registered, 1);
        let Stmt::Decl(decl) = &stmts[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(decl.name, "line count");
    }

    #[test]
    fn gauge_with_as_and_by() {
        let (stmts, errors, _) = parse_stmts("gauge depth by queue as \"queue_depth\"\n");
        assert_eq!(errors, 0);
        let Stmt::Decl(decl) = &stmts[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(decl.kind, MetricKind::Gauge);
        assert_eq!(decl.keys, ["queue"]);
        assert_eq!(decl.exported_name.as_deref(), Some("queue_depth"));
    }

    #[test]
    fn hidden_without_type_is_an_error() {
        let (stmts, errors, registered) = parse_stmts("hidden foo\n");
        assert!(stmts.is_empty());
        assert_eq!(errors, 1);
        assert_eq!(registered, 0);
    }

    #[test]
    fn pattern_concatenation_of_literals() {
        let (stmts, errors, _) = parse_stmts("/a/ + /b/ { }");
        assert_eq!(errors, 0);
        let Stmt::Cond(cond) = &stmts[0] else {
            panic!("expected a conditional");
        };
        let Expr::Regex(regex) = &cond.cond else {
            panic!("expected a pattern");
        };
        assert_eq!(regex.pattern, "ab");
    }

    #[test]
    fn const_redefinition_last_writer_wins() {
        let (stmts, errors, _) =
            parse_stmts("const P /a/\nconst P /b/\n/x/ + P { }");
        assert_eq!(errors, 0);
        let Stmt::Cond(cond) = &stmts[0] else {
            panic!("expected a conditional");
        };
        let Expr::Regex(regex) = &cond.cond else {
            panic!("expected a pattern");
        };
        assert_eq!(regex.pattern, "xb");
    }

    #[test]
    fn pattern_without_block_is_an_error_with_placeholder_body() {
        let (stmts, errors, _) = parse_stmts("/a/\n");
        assert_eq!(errors, 1);
        let Stmt::Cond(cond) = &stmts[0] else {
            panic!("expected a conditional");
        };
        assert!(cond.body.stmts.is_empty());
    }

    #[test]
    fn nested_blocks_nest_scopes() {
        let source = "/(?P<a>.)/ {\n  /(?P<b>.)/ {\n    $a++\n    $b++\n  }\n}";
        let (_stmts, errors, _) = parse_stmts(source);
        assert_eq!(errors, 0);
    }

    #[test]
    fn decorator_body_may_use_next() {
        let (stmts, errors, _) = parse_stmts("def trace { next }\n@trace { counter c\nc++ }");
        assert_eq!(errors, 0);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn deco_before_def_is_not_defined() {
        let (_stmts, errors, _) = parse_stmts("@later { }\ndef later { next }");
        assert_eq!(errors, 1);
    }
}
