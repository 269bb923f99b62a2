// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! CLI command implementations.

use camino::Utf8PathBuf;
use miette::{IntoDiagnostic, Result};
use tally_core::metrics::MetricStore;
use tally_core::source_analysis::parse;

use crate::diagnostic::CompileDiagnostic;

/// `tally check` — parse programs and report diagnostics.
///
/// Accepts a single `.tly` file or a directory of them. Exits non-zero if
/// any file fails to compile.
pub fn run_check(path: &str) -> Result<()> {
    let source_files = collect_source_files(path)?;
    let mut failed = 0usize;

    for file in &source_files {
        let (diagnostics, metrics) = check_file(file)?;
        if diagnostics == 0 {
            println!("{file}: ok ({metrics} metrics)");
        } else {
            failed += 1;
        }
    }

    if failed > 0 {
        let plural = if failed == 1 { "" } else { "s" };
        miette::bail!(
            "{failed} of {} program{plural} failed to compile",
            source_files.len()
        );
    }
    Ok(())
}

/// `tally ast` — parse a single program and dump its tree.
pub fn run_ast(path: &str) -> Result<()> {
    let file = Utf8PathBuf::from(path);
    if !file.is_file() {
        miette::bail!("File '{path}' does not exist");
    }
    let source = read_source(&file)?;
    let mut store = MetricStore::new();
    let (program, diagnostics) = parse(program_name(&file), &source, &mut store);

    for diagnostic in &diagnostics {
        let report =
            CompileDiagnostic::from_core_diagnostic(diagnostic, file.as_str(), &source);
        eprintln!("{:?}", miette::Report::new(report));
    }
    if !diagnostics.is_empty() {
        miette::bail!("'{file}' failed to compile; not dumping the AST");
    }

    println!("{program:#?}");
    Ok(())
}

/// Parses one file, printing its diagnostics. Returns the diagnostic count
/// and the number of metrics the program registered.
fn check_file(file: &Utf8PathBuf) -> Result<(usize, usize)> {
    let source = read_source(file)?;
    let mut store = MetricStore::new();
    let (program, diagnostics) = parse(program_name(file), &source, &mut store);
    tracing::debug!(
        program = %file,
        statements = program.block.stmts.len(),
        metrics = store.len(),
        diagnostics = diagnostics.len(),
        "parsed"
    );

    for diagnostic in &diagnostics {
        let report =
            CompileDiagnostic::from_core_diagnostic(diagnostic, file.as_str(), &source);
        eprintln!("{:?}", miette::Report::new(report));
    }
    Ok((diagnostics.len(), store.len()))
}

fn read_source(file: &Utf8PathBuf) -> Result<String> {
    std::fs::read_to_string(file)
        .into_diagnostic()
        .map_err(|e| miette::miette!("Failed to read '{file}': {e}"))
}

/// The program name used for metric attribution: the file stem.
fn program_name(file: &Utf8PathBuf) -> &str {
    file.file_stem().unwrap_or(file.as_str())
}

/// Collects the `.tly` files named by `path` (a file or a directory).
fn collect_source_files(path: &str) -> Result<Vec<Utf8PathBuf>> {
    let source_path = Utf8PathBuf::from(path);

    if source_path.is_file() {
        if source_path.extension() == Some("tly") {
            return Ok(vec![source_path]);
        }
        miette::bail!("File '{path}' is not a .tly source file");
    }
    if !source_path.is_dir() {
        miette::bail!("Path '{path}' does not exist");
    }

    let mut files = Vec::new();
    for entry in source_path.read_dir_utf8().into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let entry_path = entry.path();
        if entry_path.is_file() && entry_path.extension() == Some("tly") {
            files.push(entry_path.to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        miette::bail!("No .tly source files found in '{path}'");
    }
    Ok(files)
}
