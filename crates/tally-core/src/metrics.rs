// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Metric objects and the metric store.
//!
//! Parsing a program *constructs* its metrics: every `counter`/`gauge`
//! declaration builds a [`Metric`] and, unless the declaration is `hidden`,
//! registers it with the [`MetricStore`] handed to the parser. The store is
//! the front-end's only shared collaborator; the exporter that serves the
//! registered metrics lives elsewhere and is not part of this crate.
//!
//! Metrics are shared via [`Arc`] so the declaring symbol in the symbol
//! table binds the same object the store registered.

use std::sync::Arc;

use ecow::EcoString;

/// The kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// A monotonically increasing value.
    Counter,
    /// A value that may go up and down.
    Gauge,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Gauge => f.write_str("gauge"),
        }
    }
}

/// A metric declared by a program.
///
/// `keys` are the metric's dimension labels, in sorted order; values for
/// them are filled in at update time by the runtime, which is out of scope
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    /// The exported name of the metric.
    pub name: EcoString,
    /// The program that declared it.
    pub program: EcoString,
    /// Counter or gauge.
    pub kind: MetricKind,
    /// Dimension keys, sorted ascending.
    pub keys: Vec<EcoString>,
}

impl Metric {
    /// Constructs a new metric.
    #[must_use]
    pub fn new(
        name: impl Into<EcoString>,
        program: impl Into<EcoString>,
        kind: MetricKind,
        keys: Vec<EcoString>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            kind,
            keys,
        }
    }
}

/// The registry of metrics a program exports.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tally_core::metrics::{Metric, MetricKind, MetricStore};
///
/// let mut store = MetricStore::new();
/// store.add(Arc::new(Metric::new("foo", "test", MetricKind::Counter, vec![])));
/// assert_eq!(store.len(), 1);
/// assert!(store.find("foo").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricStore {
    metrics: Vec<Arc<Metric>>,
}

impl MetricStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a metric for export.
    pub fn add(&mut self, metric: Arc<Metric>) {
        self.metrics.push(metric);
    }

    /// The number of registered metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns `true` if no metrics are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterates over the registered metrics in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Metric>> {
        self.metrics.iter()
    }

    /// Finds a registered metric by its exported name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<Metric>> {
        self.metrics.iter().find(|m| m.name == name)
    }
}
