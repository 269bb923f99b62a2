// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for the tally front-end.
//!
//! Individual problems are reported as
//! [`Diagnostic`](super::Diagnostic)s; [`ParseErrors`] bundles a failed
//! parse's whole diagnostic list into one error value for callers using the
//! strict [`compile`](super::compile) entry point.

use ecow::EcoString;
use thiserror::Error;

use super::Diagnostic;

/// A failed parse: the full ordered diagnostic list for one program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compilation of '{program}' failed with {} diagnostic(s)", .diagnostics.len())]
pub struct ParseErrors {
    /// The program that failed to compile.
    pub program: EcoString,
    /// Every diagnostic reported, in source order of discovery.
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::Position;

    #[test]
    fn parse_errors_display() {
        let errors = ParseErrors {
            program: "web.tly".into(),
            diagnostics: vec![
                Diagnostic::error("Expected expression", Position::new("web.tly", 0, 0, 0)),
                Diagnostic::error("Expected '}' to close block", Position::new("web.tly", 2, 4, 4)),
            ],
        };
        assert_eq!(
            errors.to_string(),
            "compilation of 'web.tly' failed with 2 diagnostic(s)"
        );
    }

    #[test]
    fn diagnostic_display_includes_position_and_severity() {
        let diag = Diagnostic::error("Identifier 'foo' not declared.", Position::new("p", 1, 2, 4));
        assert_eq!(diag.to_string(), "p:1:2-4: error: Identifier 'foo' not declared.");
    }
}
