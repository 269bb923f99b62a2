// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Rich error rendering using miette.
//!
//! Converts tally-core diagnostics into miette-formatted reports with
//! source context and an arrow pointing at the offending span. Core
//! positions are line/column based, so the byte offsets miette needs are
//! recovered here against the source text.

#![allow(unused)]

use miette::{Diagnostic, SourceSpan};
use tally_core::source_analysis::{Diagnostic as CoreDiagnostic, Position, Severity};

/// A compilation diagnostic with rich formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(tally::compile))]
pub struct CompileDiagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Source code for context.
    #[source_code]
    pub src: miette::NamedSource<String>,
    /// Location of the problem.
    #[label("{label}")]
    pub span: SourceSpan,
    /// Label shown at the span.
    pub label: String,
}

impl CompileDiagnostic {
    /// Creates a renderable diagnostic from a core diagnostic.
    pub fn from_core_diagnostic(
        diagnostic: &CoreDiagnostic,
        source_path: &str,
        source: &str,
    ) -> Self {
        let label = match diagnostic.severity {
            Severity::Error => "error here",
            Severity::Warning => "warning here",
        };

        let (start, end) = byte_range(source, &diagnostic.pos);
        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: (start, end - start).into(),
            label: label.to_string(),
        }
    }
}

/// Maps a line/column position onto byte offsets in `source`. Columns are
/// counted in characters with an inclusive end, matching the lexer.
fn byte_range(source: &str, pos: &Position) -> (usize, usize) {
    let line_offset: usize = source
        .split_inclusive('\n')
        .take(pos.line() as usize)
        .map(str::len)
        .sum();
    let line = source
        .split_inclusive('\n')
        .nth(pos.line() as usize)
        .unwrap_or("");

    let mut start = line.len();
    let mut end = line.len();
    for (col, (byte, c)) in line.char_indices().enumerate() {
        if col == pos.start_col() as usize {
            start = byte;
        }
        if col == pos.end_col() as usize {
            end = byte + c.len_utf8();
            break;
        }
    }
    let end = end.max(start);
    (line_offset + start, line_offset + end)
}
