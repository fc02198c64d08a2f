//! Command-line interface orchestration for clustree.
//!
//! Each command reads one input, file or stdin, runs a single assembler or
//! converter over it and hands back an [`ExecutionSummary`] whose triples the
//! binary writes to stdout.

mod commands;

pub use commands::{
    CanonicalizeArgs, Cli, CliError, CoarseningArgs, CoarseningDocument, Command,
    ExecutionSummary, PathTreeArgs, STDIN_PATH, TermEdgesArgs, render_triples, report_failure,
    run_cli,
};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
