// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! The expression grammar is a short precedence chain:
//!
//! ```text
//! expr     := assign
//! assign   := rel ( ('=' | '+=') rel )?
//! rel      := additive ( relop additive )?
//! additive := unary ( ('+' | '-') unary )*
//! unary    := postfix | BUILTIN '(' arg_list? ')'
//! postfix  := primary ( '++' | '[' expr ']' )*
//! primary  := ID | CAPREF | STRING | NUMERIC | '(' expr ')'
//! ```
//!
//! Identifier and capture-reference primaries are bound against the symbol
//! table as they are read; an unresolved name yields a diagnostic and an
//! unbound node. Numeric conversion from the token's digit string happens
//! here, with overflow reported as a diagnostic and an error placeholder.

use ecow::eco_format;

use crate::ast::{
    AdditiveExpr, AdditiveOp, AssignExpr, CaprefExpr, Expr, ExprList, IdExpr, IncByExpr, RelExpr,
    RelOp,
};
use crate::semantic_analysis::SymbolKind;
use crate::source_analysis::TokenKind;

use super::Parser;

impl Parser<'_> {
    /// Parses any expression.
    pub(super) fn parse_expression(&mut self) -> Expr {
        self.parse_assignment()
    }

    /// Parses an assignment (`=`) or compound increment (`+=`), or the
    /// underlying relational expression if no assignment operator follows.
    fn parse_assignment(&mut self) -> Expr {
        let lhs = self.parse_relational();
        match self.current_kind() {
            TokenKind::Assign => {
                let pos = self.advance().pos().clone();
                let rvalue = self.parse_relational();
                Expr::Assign(Box::new(AssignExpr {
                    lvalue: lhs,
                    rvalue,
                    pos,
                }))
            }
            TokenKind::AddAssign => {
                let pos = self.advance().pos().clone();
                let rvalue = self.parse_relational();
                Expr::IncBy(Box::new(IncByExpr {
                    lvalue: lhs,
                    rvalue,
                    pos,
                }))
            }
            _ => lhs,
        }
    }

    /// Parses a relational comparison, or the underlying additive
    /// expression if no comparison operator follows.
    fn parse_relational(&mut self) -> Expr {
        let lhs = self.parse_additive();
        let op = match self.current_kind() {
            TokenKind::Lt => RelOp::Lt,
            TokenKind::Gt => RelOp::Gt,
            TokenKind::Le => RelOp::Le,
            TokenKind::Ge => RelOp::Ge,
            TokenKind::Eq => RelOp::Eq,
            TokenKind::Ne => RelOp::Ne,
            _ => return lhs,
        };
        let pos = self.advance().pos().clone();
        let rhs = self.parse_additive();
        Expr::Rel(Box::new(RelExpr { lhs, rhs, op, pos }))
    }

    /// Parses a left-associative additive chain.
    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => AdditiveOp::Plus,
                TokenKind::Minus => AdditiveOp::Minus,
                _ => break,
            };
            let pos = self.advance().pos().clone();
            let rhs = self.parse_unary();
            lhs = Expr::Additive(Box::new(AdditiveExpr { lhs, rhs, op, pos }));
        }
        lhs
    }

    /// Parses a builtin call or a postfix expression.
    fn parse_unary(&mut self) -> Expr {
        if !self.check(TokenKind::Builtin) {
            return self.parse_postfix();
        }
        let token = self.advance();
        let name = token.text().clone();
        let pos = token.pos().clone();
        self.expect(TokenKind::LParen, "Expected '(' after builtin name");
        let args = if self.check(TokenKind::RParen) || self.at_end() {
            None
        } else {
            Some(self.parse_argument_list())
        };
        self.expect(TokenKind::RParen, "Expected ')' to close builtin call");
        Expr::Builtin { name, args, pos }
    }

    /// Parses a comma-separated argument list.
    fn parse_argument_list(&mut self) -> ExprList {
        let pos = self.current_token().pos().clone();
        let mut exprs = vec![self.parse_expression()];
        while self.match_token(TokenKind::Comma) {
            exprs.push(self.parse_expression());
        }
        ExprList { exprs, pos }
    }

    /// Parses postfix operators: `++` and indexing.
    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.current_kind() {
                TokenKind::Inc => {
                    let pos = self.advance().pos().clone();
                    expr = Expr::Inc {
                        operand: Box::new(expr),
                        pos,
                    };
                }
                TokenKind::LSquare => {
                    let pos = self.advance().pos().clone();
                    let index = self.parse_expression();
                    self.expect(TokenKind::RSquare, "Expected ']' to close index expression");
                    expr = Expr::Indexed {
                        base: Box::new(expr),
                        index: Box::new(index),
                        pos,
                    };
                }
                _ => break,
            }
        }
        expr
    }

    /// Parses a primary expression, binding identifiers and capture
    /// references against the symbol table.
    fn parse_primary(&mut self) -> Expr {
        match self.current_kind() {
            TokenKind::Id => {
                let token = self.advance();
                let name = token.text().clone();
                let pos = token.pos().clone();
                let symbol = self.symtab.lookup(self.scope, &name, SymbolKind::Metric);
                if symbol.is_none() {
                    self.error_at(
                        pos.clone(),
                        eco_format!("Identifier '{name}' not declared."),
                    );
                }
                Expr::Id(IdExpr { name, symbol, pos })
            }
            TokenKind::Capref => {
                let token = self.advance();
                let name = token.text().clone();
                let pos = token.pos().clone();
                let symbol = self.symtab.lookup(self.scope, &name, SymbolKind::Capture);
                if symbol.is_none() {
                    self.error_at(
                        pos.clone(),
                        eco_format!(
                            "Capture group ${name} not defined by prior regular expression \
                             in this or an outer scope"
                        ),
                    );
                }
                Expr::Capref(CaprefExpr { name, symbol, pos })
            }
            TokenKind::String => {
                let token = self.advance();
                Expr::Str {
                    value: token.text().clone(),
                    pos: token.pos().clone(),
                }
            }
            TokenKind::Numeric => {
                let token = self.advance();
                match token.text().parse::<i64>() {
                    Ok(value) => Expr::Num {
                        value,
                        pos: token.pos().clone(),
                    },
                    Err(_) => {
                        self.error_at(token.pos().clone(), "Numeric literal out of range");
                        Expr::Error {
                            pos: token.pos().clone(),
                        }
                    }
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression();
                self.expect(TokenKind::RParen, "Expected ')' to close expression");
                expr
            }
            _ => {
                let token = self.advance();
                self.error_at(token.pos().clone(), "Expected expression");
                Expr::Error {
                    pos: token.pos().clone(),
                }
            }
        }
    }
}
