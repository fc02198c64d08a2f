//! Command implementations and argument parsing for the clustree CLI.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use clustree_core::{
    Assembly, AssemblyError, Cluster, CoarseningBuilder, CoarseningSequence,
    DEFAULT_MIN_CLUSTER_SIZE, Partition, PathTreeBuilder, TripleSet, Violation, ViolationPolicy,
    WireMode, parse_term_edges,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{Span, error, field, info, instrument};

/// Input path meaning "read standard input".
pub const STDIN_PATH: &str = "-";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "clustree",
    about = "Rebuild cluster hierarchies as containment triples."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Assemble a hierarchy from per-leaf `path flow label` lines.
    PathTree(PathTreeArgs),
    /// Assemble a hierarchy from a JSON sequence of coarsening partitions.
    Coarsening(CoarseningArgs),
    /// Deduplicate and reorder an existing triple stream.
    Canonicalize(CanonicalizeArgs),
    /// Convert `source target type` term edges into triples.
    TermEdges(TermEdgesArgs),
}

impl Command {
    /// Name of the command as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PathTree(_) => "path-tree",
            Self::Coarsening(_) => "coarsening",
            Self::Canonicalize(_) => "canonicalize",
            Self::TermEdges(_) => "term-edges",
        }
    }
}

/// Options accepted by the `path-tree` command.
#[derive(Debug, Args, Clone)]
pub struct PathTreeArgs {
    /// Path-tree file, or `-` for stdin.
    pub input: PathBuf,

    /// Fail on groups that are not contiguous instead of tolerating them.
    #[arg(long)]
    pub strict: bool,
}

/// Options accepted by the `coarsening` command.
#[derive(Debug, Args, Clone)]
pub struct CoarseningArgs {
    /// JSON document `{"levels": [[[1, 2], ...], ...], "max_node": 9}`, or
    /// `-` for stdin.
    pub input: PathBuf,

    /// Minimum number of distinct members per cluster.
    #[arg(
        long = "min-cluster-size",
        default_value_t = DEFAULT_MIN_CLUSTER_SIZE.get(),
        value_parser = clap::value_parser!(usize),
    )]
    pub min_cluster_size: usize,

    /// Largest node id of the clustered graph; synthetic ids start above it.
    #[arg(long = "max-node")]
    pub max_node: Option<u64>,

    /// Place a single apex cluster above the coarsest level.
    #[arg(long)]
    pub apex: bool,

    /// Fail on orphaned clusters instead of tolerating them.
    #[arg(long)]
    pub strict: bool,
}

/// Options accepted by the `canonicalize` command.
#[derive(Debug, Args, Clone)]
pub struct CanonicalizeArgs {
    /// Triple stream, or `-` for stdin.
    pub input: PathBuf,

    /// Skip malformed records with a warning instead of failing.
    #[arg(long)]
    pub lenient: bool,
}

/// Options accepted by the `term-edges` command.
#[derive(Debug, Args, Clone)]
pub struct TermEdgesArgs {
    /// Term-edge listing, or `-` for stdin.
    pub input: PathBuf,
}

/// JSON layout of coarsening input.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoarseningDocument {
    /// Partitions from finest to coarsest, each a list of member lists.
    pub levels: Vec<Vec<Vec<u64>>>,
    /// Largest node id of the clustered graph.
    #[serde(default)]
    pub max_node: Option<u64>,
}

impl CoarseningDocument {
    fn into_sequence(self, max_node: Option<u64>) -> CoarseningSequence {
        let sequence: CoarseningSequence = self
            .levels
            .into_iter()
            .map(|level| level.into_iter().map(Cluster::new).collect::<Partition>())
            .collect();
        match self.max_node.into_iter().chain(max_node).max() {
            Some(ceiling) => sequence.with_node_ceiling(ceiling),
            None => sequence,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the input failed.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Coarsening input was not a valid JSON document.
    #[error("`{path}` is not a valid coarsening document: {source}")]
    Json {
        /// Path that held the document.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// Hierarchy assembly failed.
    #[error(transparent)]
    Core(#[from] AssemblyError),
}

impl CliError {
    /// Process exit status for this error: `1` when no clusters survived
    /// filtering, `2` for every other failure.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Core(AssemblyError::EmptyResult) => 1,
            _ => 2,
        }
    }
}

/// Logs `err` as a single `ERROR` event carrying the full context chain, the
/// stable error code when the cause is an assembly failure, and the exit
/// status, then returns that status.
#[must_use]
pub fn report_failure(err: &anyhow::Error) -> u8 {
    let cli_error = err.downcast_ref::<CliError>();
    let code = cli_error.and_then(|cli_error| match cli_error {
        CliError::Core(core) => Some(core.code()),
        _ => None,
    });
    let status = cli_error.map_or(2, CliError::exit_status);
    let chain = format!("{err:#}");
    error!(
        error = %chain,
        code = code.map(|code| field::display(code.as_str())),
        status,
        "command execution failed"
    );
    status
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Command that produced the summary.
    pub command: &'static str,
    /// Canonical triples to emit.
    pub triples: TripleSet,
    /// Parentless synthetic clusters; empty for commands that allocate none.
    pub roots: Vec<u64>,
    /// Number of synthetic ids allocated.
    pub synthetic: u64,
    /// Tolerated precondition violations.
    pub violations: Vec<Violation>,
}

impl ExecutionSummary {
    fn from_assembly(command: &'static str, assembly: Assembly) -> Self {
        let roots = assembly.roots().to_vec();
        let synthetic = assembly.synthetic_count();
        let violations = assembly.violations().to_vec();
        Self {
            command,
            triples: assembly.into_triples(),
            roots,
            synthetic,
            violations,
        }
    }

    fn from_triples(command: &'static str, triples: TripleSet) -> Self {
        Self {
            command,
            triples,
            roots: Vec::new(),
            synthetic: 0,
            violations: Vec::new(),
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when reading the input or assembling fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clustree_cli::cli::{Cli, Command, TermEdgesArgs, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "7 8 default\n8 1 gene\n")?;
/// let cli = Cli {
///     command: Command::TermEdges(TermEdgesArgs {
///         input: file.path().to_path_buf(),
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.triples.to_string(), "7,8,c-c;8,1,c-m;");
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let command = cli.command;
    Span::current().record("command", field::display(command.name()));
    let summary = match command {
        Command::PathTree(args) => run_path_tree(args)?,
        Command::Coarsening(args) => run_coarsening(args)?,
        Command::Canonicalize(args) => run_canonicalize(args)?,
        Command::TermEdges(args) => run_term_edges(args)?,
    };
    info!(
        command = summary.command,
        triples = summary.triples.len(),
        roots = summary.roots.len(),
        synthetic = summary.synthetic,
        violations = summary.violations.len(),
        "command completed"
    );
    Ok(summary)
}

const fn policy(strict: bool) -> ViolationPolicy {
    if strict {
        ViolationPolicy::Reject
    } else {
        ViolationPolicy::Tolerate
    }
}

#[instrument(
    name = "cli.path_tree",
    skip(args),
    fields(input = field::Empty, strict = args.strict),
)]
pub(super) fn run_path_tree(args: PathTreeArgs) -> Result<ExecutionSummary, CliError> {
    let PathTreeArgs { input, strict } = args;
    Span::current().record("input", field::display(input.display()));
    let text = read_input(&input)?;
    let assembly = PathTreeBuilder::new()
        .with_violation_policy(policy(strict))
        .build()
        .assemble(&text)?;
    Ok(ExecutionSummary::from_assembly("path-tree", assembly))
}

#[instrument(
    name = "cli.coarsening",
    skip(args),
    fields(
        input = field::Empty,
        min_cluster_size = args.min_cluster_size,
        apex = args.apex,
        strict = args.strict,
    ),
)]
pub(super) fn run_coarsening(args: CoarseningArgs) -> Result<ExecutionSummary, CliError> {
    let CoarseningArgs {
        input,
        min_cluster_size,
        max_node,
        apex,
        strict,
    } = args;
    Span::current().record("input", field::display(input.display()));
    let assembler = CoarseningBuilder::new()
        .with_min_cluster_size(min_cluster_size)
        .with_violation_policy(policy(strict))
        .with_apex(apex)
        .build()?;
    let text = read_input(&input)?;
    let document: CoarseningDocument =
        serde_json::from_str(&text).map_err(|source| CliError::Json {
            path: input.clone(),
            source,
        })?;
    let assembly = assembler.assemble(&document.into_sequence(max_node))?;
    Ok(ExecutionSummary::from_assembly("coarsening", assembly))
}

#[instrument(
    name = "cli.canonicalize",
    skip(args),
    fields(input = field::Empty, lenient = args.lenient),
)]
pub(super) fn run_canonicalize(args: CanonicalizeArgs) -> Result<ExecutionSummary, CliError> {
    let CanonicalizeArgs { input, lenient } = args;
    Span::current().record("input", field::display(input.display()));
    let mode = if lenient {
        WireMode::Lenient
    } else {
        WireMode::Strict
    };
    let triples = TripleSet::parse_wire(&read_input(&input)?, mode)?;
    Ok(ExecutionSummary::from_triples("canonicalize", triples))
}

#[instrument(
    name = "cli.term_edges",
    skip(args),
    fields(input = field::Empty),
)]
pub(super) fn run_term_edges(args: TermEdgesArgs) -> Result<ExecutionSummary, CliError> {
    let TermEdgesArgs { input } = args;
    Span::current().record("input", field::display(input.display()));
    let triples = parse_term_edges(&read_input(&input)?)?;
    Ok(ExecutionSummary::from_triples("term-edges", triples))
}

/// Reads the whole of `path` as UTF-8, or stdin when `path` is `-`.
pub(super) fn read_input(path: &Path) -> Result<String, CliError> {
    let io_error = |source: io::Error| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        io::stdin().lock().read_to_string(&mut text).map_err(io_error)?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(io_error)
}

/// Writes the wire encoding of `summary` to `writer`.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clustree_cli::cli::{ExecutionSummary, render_triples};
/// # use clustree_core::{Triple, TripleSet};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     command: "canonicalize",
///     triples: [Triple::member(3, 1), Triple::cluster(4, 3)].into_iter().collect(),
///     roots: Vec::new(),
///     synthetic: 0,
///     violations: Vec::new(),
/// };
/// let mut buffer = Vec::new();
/// render_triples(&summary, &mut buffer)?;
/// assert_eq!(buffer, b"3,1,c-m;4,3,c-c;");
/// # Ok(())
/// # }
/// ```
pub fn render_triples(summary: &ExecutionSummary, writer: impl Write) -> io::Result<()> {
    summary.triples.write_wire(writer)
}
