//! CLI entry point for clustree.
//!
//! Parses arguments with clap, runs the selected command, writes the triple
//! stream to stdout and maps failures to exit statuses: `1` when no clusters
//! survived filtering and `2` for anything else.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use clustree_cli::{
    cli::{Cli, render_triples, report_failure, run_cli},
    logging::{self, LoggingError},
};

const FAILURE: u8 = 2;

/// Parse CLI arguments, execute the command, write the triples and flush the
/// output stream.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_triples(&summary, &mut writer).context("failed to write triples")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::from(FAILURE);
    }

    if let Err(err) = try_main() {
        return ExitCode::from(report_failure(&err));
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
