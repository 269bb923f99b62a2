// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tally compiler command-line interface.
//!
//! This is the main entry point for the `tally` command.

use clap::{Parser, Subcommand};
use miette::Result;

mod commands;
mod diagnostic;

/// Tally: a log-telemetry metrics language
#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check tally programs for errors without lowering them
    Check {
        /// Source file or directory to check
        #[arg(default_value = ".")]
        path: String,
    },

    /// Parse a tally program and dump its AST
    Ast {
        /// Source file to parse
        path: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing only if RUST_LOG is explicitly set, keeping stderr
    // clean for diagnostic rendering otherwise
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    match cli.command {
        Command::Check { path } => commands::run_check(&path),
        Command::Ast { path } => commands::run_ast(&path),
    }
}
