// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract syntax tree definitions for tally programs.
//!
//! The AST is what [`parse`](crate::source_analysis::parse) produces: a
//! single-ownership tree of statements and expressions, each carrying its
//! source [`Position`]. Cross-cutting references are expressed with ids
//! rather than shared pointers:
//!
//! - every block stores the [`ScopeId`] it was parsed in, so the symbol
//!   table attached to the [`Program`] can resolve names for it later;
//! - identifier and capture-reference nodes store the [`SymbolId`] they were
//!   bound to (or `None` alongside a reported diagnostic);
//! - capture-group symbols point back at their owning pattern through the
//!   [`PatternId`] carried on the [`RegexExpr`] node, and decorator symbols
//!   point at their definition through the [`DefId`] on the [`DefStmt`].
//!
//! Regex nodes carry their compiled [`regex::Regex`] so a back-end never
//! recompiles; a node whose `regex` is `None` is the placeholder for a
//! pattern that failed to compile (a corresponding error is on the
//! diagnostic list).

use std::sync::Arc;

use ecow::EcoString;
use regex::Regex;

use crate::metrics::{Metric, MetricKind};
use crate::semantic_analysis::{ScopeId, SymbolId, SymbolTable};
use crate::source_analysis::Position;

/// Identifies a compiled pattern within one program, in parse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(usize);

impl PatternId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The parse-order index of this pattern.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifies a decorator definition within one program, in parse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(usize);

impl DefId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The parse-order index of this definition.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A parsed program: the root statement list plus the symbol table built
/// while parsing it.
///
/// A program is only meaningful together with the diagnostics returned by
/// the same parse; callers must treat the tree as invalid if any error was
/// reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The program name (used for metric attribution and positions).
    pub name: EcoString,
    /// The top-level statements.
    pub block: Block,
    /// The scopes and symbols built during the parse.
    pub symbols: SymbolTable,
}

/// A statement list together with the scope it was parsed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The statements, in source order.
    pub stmts: Vec<Stmt>,
    /// The scope that was active inside this block.
    pub scope: ScopeId,
}

/// A statement.
///
/// `const` definitions contribute no statement: they only populate the
/// parser's pattern-constant table.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A conditional block: pattern or relational expression plus body.
    Cond(CondStmt),
    /// A bare expression statement.
    Expr(Expr),
    /// A metric declaration.
    Decl(DeclStmt),
    /// A decorator definition.
    Def(DefStmt),
    /// A decorator application.
    Deco(DecoStmt),
    /// The `next` statement: stop processing the current line.
    Next(Position),
}

impl Stmt {
    /// The source position of this statement.
    #[must_use]
    pub fn pos(&self) -> &Position {
        match self {
            Self::Cond(c) => &c.pos,
            Self::Expr(e) => e.pos(),
            Self::Decl(d) => &d.pos,
            Self::Def(d) => &d.pos,
            Self::Deco(d) => &d.pos,
            Self::Next(pos) => pos,
        }
    }
}

/// A conditional statement: `cond { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct CondStmt {
    /// The condition: a [`Expr::Regex`] pattern or a relational expression.
    pub cond: Expr,
    /// The statements executed when the condition matches.
    pub body: Block,
    /// Position of the condition.
    pub pos: Position,
}

/// A regex pattern, compiled at parse time.
#[derive(Debug, Clone)]
pub struct RegexExpr {
    /// Parse-order id linking capture symbols back to this pattern.
    pub id: PatternId,
    /// The concatenated pattern source text.
    pub pattern: EcoString,
    /// The compiled regex; `None` if compilation failed (an error was
    /// reported and this node is a placeholder).
    pub regex: Option<Regex>,
    /// Position of the start of the pattern.
    pub pos: Position,
}

impl PartialEq for RegexExpr {
    fn eq(&self, other: &Self) -> bool {
        // compiled regexes compare by presence; the pattern text is identity
        self.id == other.id
            && self.pattern == other.pattern
            && self.regex.is_some() == other.regex.is_some()
            && self.pos == other.pos
    }
}

/// A relational comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
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
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        };
        f.write_str(op)
    }
}

/// An additive operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdditiveOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
}

impl std::fmt::Display for AdditiveOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
        }
    }
}

/// A relational comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct RelExpr {
    pub lhs: Expr,
    pub rhs: Expr,
    pub op: RelOp,
    /// Position of the operator.
    pub pos: Position,
}

/// An additive expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveExpr {
    pub lhs: Expr,
    pub rhs: Expr,
    pub op: AdditiveOp,
    /// Position of the operator.
    pub pos: Position,
}

/// An assignment: `lvalue = rvalue`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub lvalue: Expr,
    pub rvalue: Expr,
    /// Position of the `=`.
    pub pos: Position,
}

/// A compound increment: `lvalue += rvalue`.
#[derive(Debug, Clone, PartialEq)]
pub struct IncByExpr {
    pub lvalue: Expr,
    pub rvalue: Expr,
    /// Position of the `+=`.
    pub pos: Position,
}

/// An identifier use, bound to a metric symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct IdExpr {
    pub name: EcoString,
    /// The bound symbol, or `None` if the identifier was undeclared (a
    /// diagnostic was reported).
    pub symbol: Option<SymbolId>,
    pub pos: Position,
}

/// A capture group reference (`$1`, `$name`), bound to a capture symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CaprefExpr {
    /// Group number or name, without the `$`.
    pub name: EcoString,
    /// The bound symbol, or `None` if no enclosing pattern defines the
    /// group (a diagnostic was reported).
    pub symbol: Option<SymbolId>,
    pub pos: Position,
}

/// A comma-separated expression list (builtin call arguments).
#[derive(Debug, Clone, PartialEq)]
pub struct ExprList {
    pub exprs: Vec<Expr>,
    /// Position of the first expression.
    pub pos: Position,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A regex pattern used as a condition.
    Regex(RegexExpr),
    /// A relational comparison.
    Rel(Box<RelExpr>),
    /// An additive expression.
    Additive(Box<AdditiveExpr>),
    /// An assignment.
    Assign(Box<AssignExpr>),
    /// A compound increment.
    IncBy(Box<IncByExpr>),
    /// A postfix increment: `operand++`.
    Inc {
        operand: Box<Expr>,
        /// Position of the `++`.
        pos: Position,
    },
    /// A dimensioned-metric index: `base[index]`.
    Indexed {
        base: Box<Expr>,
        index: Box<Expr>,
        /// Position of the `[`.
        pos: Position,
    },
    /// A builtin call: `name(args...)`.
    Builtin {
        name: EcoString,
        args: Option<ExprList>,
        /// Position of the builtin name.
        pos: Position,
    },
    /// An identifier use.
    Id(IdExpr),
    /// A capture group reference.
    Capref(CaprefExpr),
    /// A string literal (decoded).
    Str { value: EcoString, pos: Position },
    /// An integer literal.
    Num { value: i64, pos: Position },
    /// A placeholder for an expression that failed to parse; a diagnostic
    /// was reported at the same position.
    Error { pos: Position },
}

impl Expr {
    /// The source position of this expression.
    #[must_use]
    pub fn pos(&self) -> &Position {
        match self {
            Self::Regex(r) => &r.pos,
            Self::Rel(r) => &r.pos,
            Self::Additive(a) => &a.pos,
            Self::Assign(a) => &a.pos,
            Self::IncBy(i) => &i.pos,
            Self::Id(i) => &i.pos,
            Self::Capref(c) => &c.pos,
            Self::Inc { pos, .. }
            | Self::Indexed { pos, .. }
            | Self::Builtin { pos, .. }
            | Self::Str { pos, .. }
            | Self::Num { pos, .. }
            | Self::Error { pos } => pos,
        }
    }

    /// Returns `true` if this is a parse-error placeholder.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A metric declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclStmt {
    /// Counter or gauge.
    pub kind: MetricKind,
    /// The logical name the program refers to the metric by.
    pub name: EcoString,
    /// The export name given with `as`, if any.
    pub exported_name: Option<EcoString>,
    /// Dimension keys from `by`, sorted ascending.
    pub keys: Vec<EcoString>,
    /// Whether the metric is hidden from the exporter.
    pub hidden: bool,
    /// The metric symbol declared for `name`.
    pub symbol: Option<SymbolId>,
    /// The constructed metric object (shared with the store unless hidden).
    pub metric: Option<Arc<Metric>>,
    /// Position of the metric name.
    pub pos: Position,
}

/// A decorator definition: `def name { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefStmt {
    pub name: EcoString,
    pub body: Block,
    /// Parse-order id linking decorator symbols back to this definition.
    pub id: DefId,
    /// The decorator symbol declared in the enclosing scope.
    pub symbol: Option<SymbolId>,
    /// Position of the definition name.
    pub pos: Position,
}

/// A decorator application: `@name { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoStmt {
    pub name: EcoString,
    pub body: Block,
    /// The definition this application resolved to, or `None` if the
    /// decorator was not defined (a diagnostic was reported).
    pub def: Option<DefId>,
    /// Position of the `@name`.
    pub pos: Position,
}
