// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tally compiler front-end.
//!
//! This crate turns tally program text into an AST ready for lowering:
//! - Lexical analysis (tokenization with precise positions)
//! - Parsing (AST construction with error recovery)
//! - Scope and symbol resolution, performed during parsing
//! - Metric declaration semantics (construction and store registration)
//!
//! The front-end is single-threaded and one-shot: each call to
//! [`source_analysis::parse`] owns its lexer, scope stack and symbol table,
//! and the only shared collaborator is the caller's
//! [`metrics::MetricStore`]. It never panics on malformed input — all
//! failures accumulate as [`source_analysis::Diagnostic`]s.

#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod metrics;
pub mod semantic_analysis;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Block, Expr, Program, Stmt};
    pub use crate::metrics::{Metric, MetricKind, MetricStore};
    pub use crate::source_analysis::{Diagnostic, Position, Severity, compile, parse};
}
