// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Scope and symbol tracking for the tally front-end.
//!
//! Names are resolved against a stack of lexical scopes, one per `{ ... }`
//! block; a scope holds **two independent namespaces** keyed by
//! [`SymbolKind`], so a metric and a capture group may share a name without
//! colliding. Scopes and symbols live in a [`SymbolTable`] arena and are
//! addressed by copyable ids, which lets AST nodes reference symbols (and
//! symbols reference their owning patterns and decorator definitions)
//! without cycles in the owned tree.
//!
//! Symbols are never removed: redefining a `(name, kind)` pair in the same
//! scope silently replaces the scope entry (last writer wins), but the
//! superseded symbol stays in the arena so earlier references remain valid.

use std::collections::HashMap;
use std::sync::Arc;

use ecow::EcoString;

use crate::ast::{DefId, PatternId};
use crate::metrics::Metric;
use crate::source_analysis::Position;

/// Identifies a scope in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The arena index of this scope.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifies a symbol in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

impl SymbolId {
    /// The arena index of this symbol.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The namespace a symbol lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Names a metric declaration.
    Metric,
    /// Names a capture group of a pattern in this or an enclosing scope.
    Capture,
    /// Names a decorator template declared with `def`.
    Decorator,
}

/// What a symbol resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The metric object constructed for a declaration.
    Metric(Arc<Metric>),
    /// The pattern whose capture group this symbol names.
    Pattern(PatternId),
    /// The decorator definition this symbol names.
    Decorator(DefId),
}

/// A named binding within a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// The symbol's name.
    pub name: EcoString,
    /// The namespace this symbol lives in.
    pub kind: SymbolKind,
    /// What the symbol resolves to; `None` only for placeholder symbols.
    pub binding: Option<Binding>,
    /// Where the symbol was declared.
    pub declared_at: Position,
    /// For capture symbols, the subgroup index (0 is the whole match).
    pub addr: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    entries: HashMap<(EcoString, SymbolKind), SymbolId>,
}

/// The arena of scopes and symbols built during a parse.
///
/// The table starts with a root scope; [`SymbolTable::push_scope`] creates a
/// child. All scopes stay in the arena after the parser leaves them, so the
/// AST's blocks can keep referring to the scope they were parsed in.
///
/// # Examples
///
/// ```
/// use tally_core::semantic_analysis::{Symbol, SymbolKind, SymbolTable};
/// use tally_core::source_analysis::Position;
///
/// let mut table = SymbolTable::new();
/// let inner = table.push_scope(table.root());
/// table.define(
///     table.root(),
///     Symbol {
///         name: "lines".into(),
///         kind: SymbolKind::Metric,
///         binding: None,
///         declared_at: Position::new("p", 0, 0, 4),
///         addr: 0,
///     },
/// );
/// // lookup walks from the inner scope to the root
/// assert!(table.lookup(inner, "lines", SymbolKind::Metric).is_some());
/// assert!(table.lookup(inner, "lines", SymbolKind::Capture).is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    scopes: Vec<ScopeData>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Creates a table containing only the root scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeData::default()],
            symbols: Vec::new(),
        }
    }

    /// The root scope.
    #[must_use]
    pub const fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Creates a new empty scope with the given parent and returns its id.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            parent: Some(parent),
            entries: HashMap::new(),
        });
        id
    }

    /// The parent of a scope, or `None` for the root.
    #[must_use]
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    /// Inserts a symbol into a scope and returns its id.
    ///
    /// If the scope already holds a symbol of the same name and kind, the
    /// new symbol replaces it in the scope without a diagnostic.
    pub fn define(&mut self, scope: ScopeId, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        let key = (symbol.name.clone(), symbol.kind);
        self.symbols.push(symbol);
        self.scopes[scope.index()].entries.insert(key, id);
        id
    }

    /// Resolves a name in a namespace, walking from `from` up to the root.
    #[must_use]
    pub fn lookup(&self, from: ScopeId, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        let key = (EcoString::from(name), kind);
        let mut scope = Some(from);
        while let Some(id) = scope {
            let data = &self.scopes[id.index()];
            if let Some(&symbol) = data.entries.get(&key) {
                return Some(symbol);
            }
            scope = data.parent;
        }
        None
    }

    /// The symbol with the given id.
    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Iterates over the symbols currently visible in one scope (not its
    /// ancestors), in no particular order.
    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.scopes[scope.index()]
            .entries
            .values()
            .map(|id| &self.symbols[id.index()])
    }

    /// The number of scopes in the arena, including the root.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_symbol(name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            name: name.into(),
            kind,
            binding: None,
            declared_at: Position::new("test", 0, 0, 0),
            addr: 0,
        }
    }

    #[test]
    fn new_table_has_only_the_root() {
        let table = SymbolTable::new();
        assert_eq!(table.scope_count(), 1);
        assert_eq!(table.parent(table.root()), None);
    }

    #[test]
    fn push_scope_links_parent() {
        let mut table = SymbolTable::new();
        let a = table.push_scope(table.root());
        let b = table.push_scope(a);
        assert_eq!(table.parent(a), Some(table.root()));
        assert_eq!(table.parent(b), Some(a));
        assert_eq!(table.scope_count(), 3);
    }

    #[test]
    fn define_and_lookup_in_same_scope() {
        let mut table = SymbolTable::new();
        let id = table.define(table.root(), test_symbol("foo", SymbolKind::Metric));
        assert_eq!(
            table.lookup(table.root(), "foo", SymbolKind::Metric),
            Some(id)
        );
        assert_eq!(table.lookup(table.root(), "bar", SymbolKind::Metric), None);
    }

    #[test]
    fn lookup_walks_outer_scopes() {
        let mut table = SymbolTable::new();
        let id = table.define(table.root(), test_symbol("outer", SymbolKind::Metric));
        let inner = table.push_scope(table.root());
        assert_eq!(table.lookup(inner, "outer", SymbolKind::Metric), Some(id));
    }

    #[test]
    fn lookup_finds_innermost_shadowing_symbol() {
        let mut table = SymbolTable::new();
        table.define(table.root(), test_symbol("x", SymbolKind::Metric));
        let inner = table.push_scope(table.root());
        let shadow = table.define(inner, test_symbol("x", SymbolKind::Metric));
        assert_eq!(table.lookup(inner, "x", SymbolKind::Metric), Some(shadow));
    }

    #[test]
    fn namespaces_are_independent() {
        let mut table = SymbolTable::new();
        let metric = table.define(table.root(), test_symbol("x", SymbolKind::Metric));
        let capture = table.define(table.root(), test_symbol("x", SymbolKind::Capture));
        assert_ne!(metric, capture);
        assert_eq!(
            table.lookup(table.root(), "x", SymbolKind::Metric),
            Some(metric)
        );
        assert_eq!(
            table.lookup(table.root(), "x", SymbolKind::Capture),
            Some(capture)
        );
        assert_eq!(table.lookup(table.root(), "x", SymbolKind::Decorator), None);
    }

    #[test]
    fn redefinition_is_silent_last_writer_wins() {
        let mut table = SymbolTable::new();
        let first = table.define(table.root(), test_symbol("x", SymbolKind::Metric));
        let second = table.define(table.root(), test_symbol("x", SymbolKind::Metric));
        assert_eq!(
            table.lookup(table.root(), "x", SymbolKind::Metric),
            Some(second)
        );
        // the superseded symbol is still reachable through its id
        assert_eq!(table.symbol(first).name, "x");
    }

    #[test]
    fn symbols_in_lists_only_the_given_scope() {
        let mut table = SymbolTable::new();
        table.define(table.root(), test_symbol("outer", SymbolKind::Metric));
        let inner = table.push_scope(table.root());
        table.define(inner, test_symbol("a", SymbolKind::Capture));
        table.define(inner, test_symbol("b", SymbolKind::Capture));

        let mut names: Vec<_> = table.symbols_in(inner).map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b"]);
    }
}
