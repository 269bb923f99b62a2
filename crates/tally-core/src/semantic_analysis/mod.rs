// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis support for the tally front-end.
//!
//! Name resolution happens *during* parsing: the parser pushes a scope per
//! block, declares metric, capture-group and decorator symbols as it goes,
//! and binds every identifier and capture reference it reads. This module
//! provides the [`SymbolTable`] arena those scopes and symbols live in.

mod scope;

pub use scope::{Binding, ScopeId, Symbol, SymbolId, SymbolKind, SymbolTable};
