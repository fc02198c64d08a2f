//! Unit tests for the CLI commands.

use super::test_helpers::{create_input_file, run_cli_expecting_error, temp_dir};
use super::{
    CanonicalizeArgs, Cli, CliError, CoarseningArgs, Command, PathTreeArgs, TermEdgesArgs,
    render_triples, report_failure, run_cli,
};

use std::path::PathBuf;

use clap::Parser;
use clustree_core::{AssemblyError, MalformedReason};
use clustree_test_support::fixtures;
use clustree_test_support::tracing::capture;
use rstest::rstest;
use tracing::Level;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn coarsening(input: PathBuf) -> CoarseningArgs {
    CoarseningArgs {
        input,
        min_cluster_size: 2,
        max_node: None,
        apex: false,
        strict: false,
    }
}

#[test]
fn path_tree_sample_matches_fixture() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "tree.txt", fixtures::SAMPLE_TREE)?;
    let summary = run_cli(Cli {
        command: Command::PathTree(PathTreeArgs {
            input,
            strict: false,
        }),
    })?;
    assert_eq!(summary.command, "path-tree");
    assert_eq!(summary.triples.to_string(), fixtures::SAMPLE_TREE_TRIPLES);
    assert_eq!(summary.roots, vec![11]);
    assert_eq!(summary.synthetic, 5);
    Ok(())
}

#[test]
fn strict_path_tree_rejects_scattered_groups() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "tree.txt", "1:1 0.1 \"1\"\n2:1 0.1 \"2\"\n1:2 0.1 \"3\"\n")?;
    let err = run_cli_expecting_error(
        Cli {
            command: Command::PathTree(PathTreeArgs {
                input,
                strict: true,
            }),
        },
        "scattered groups must fail under --strict",
    );
    assert!(matches!(
        err,
        CliError::Core(AssemblyError::PreconditionViolation { .. })
    ));
    assert_eq!(err.exit_status(), 2);
    Ok(())
}

#[test]
fn coarsening_sample_matches_fixture() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "levels.json", fixtures::SAMPLE_COARSENING)?;
    let summary = run_cli(Cli {
        command: Command::Coarsening(coarsening(input)),
    })?;
    assert_eq!(
        summary.triples.to_string(),
        fixtures::SAMPLE_COARSENING_TRIPLES
    );
    assert_eq!(summary.roots, vec![8]);
    Ok(())
}

#[test]
fn coarsening_apex_sits_above_the_coarsest_level() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "levels.json", fixtures::SAMPLE_COARSENING)?;
    let summary = run_cli(Cli {
        command: Command::Coarsening(CoarseningArgs {
            apex: true,
            ..coarsening(input)
        }),
    })?;
    assert_eq!(summary.roots, vec![9]);
    assert!(summary.triples.to_string().ends_with("9,8,c-c;"));
    Ok(())
}

#[rstest]
#[case::flag_only(r#"{"levels": [[[1, 2]]]}"#, Some(30), 31)]
#[case::document_only(r#"{"levels": [[[1, 2]]], "max_node": 20}"#, None, 21)]
#[case::larger_wins(r#"{"levels": [[[1, 2]]], "max_node": 20}"#, Some(10), 21)]
fn coarsening_node_ceiling_comes_from_document_or_flag(
    #[case] document: &str,
    #[case] max_node: Option<u64>,
    #[case] root: u64,
) -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "levels.json", document)?;
    let summary = run_cli(Cli {
        command: Command::Coarsening(CoarseningArgs {
            max_node,
            ..coarsening(input)
        }),
    })?;
    assert_eq!(summary.roots, vec![root]);
    Ok(())
}

#[test]
fn coarsening_rejects_zero_min_cluster_size() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "levels.json", fixtures::SAMPLE_COARSENING)?;
    let err = run_cli_expecting_error(
        Cli {
            command: Command::Coarsening(CoarseningArgs {
                min_cluster_size: 0,
                ..coarsening(input)
            }),
        },
        "zero min cluster size must fail",
    );
    assert!(matches!(
        err,
        CliError::Core(AssemblyError::InvalidMinClusterSize { got: 0 })
    ));
    Ok(())
}

#[rstest]
#[case::not_json("levels")]
#[case::missing_levels(r#"{"max_node": 4}"#)]
#[case::unknown_field(r#"{"levels": [], "weights": []}"#)]
#[case::negative_member(r#"{"levels": [[[-1, 2]]]}"#)]
fn coarsening_rejects_invalid_documents(#[case] document: &str) -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "levels.json", document)?;
    let err = run_cli_expecting_error(
        Cli {
            command: Command::Coarsening(coarsening(input)),
        },
        "invalid document must fail",
    );
    assert!(matches!(err, CliError::Json { .. }));
    assert_eq!(err.exit_status(), 2);
    Ok(())
}

#[test]
fn empty_results_exit_with_status_one() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "levels.json", r#"{"levels": [[[1], [2]]]}"#)?;
    let err = run_cli_expecting_error(
        Cli {
            command: Command::Coarsening(coarsening(input)),
        },
        "singleton-only input must fail",
    );
    assert!(matches!(err, CliError::Core(AssemblyError::EmptyResult)));
    assert_eq!(err.exit_status(), 1);
    Ok(())
}

#[test]
fn canonicalize_collapses_duplicates() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "wire.txt", "6,5,c-c;5,1,c-m;5,1,c-m;")?;
    let summary = run_cli(Cli {
        command: Command::Canonicalize(CanonicalizeArgs {
            input,
            lenient: false,
        }),
    })?;
    assert_eq!(summary.triples.to_string(), "5,1,c-m;6,5,c-c;");
    Ok(())
}

#[rstest]
#[case::strict(false)]
#[case::lenient(true)]
fn canonicalize_mode_decides_malformed_records(#[case] lenient: bool) -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "wire.txt", "5,1,c-m;5,2,x-y;6,5,c-c;")?;
    let result = run_cli(Cli {
        command: Command::Canonicalize(CanonicalizeArgs { input, lenient }),
    });
    if lenient {
        assert_eq!(result?.triples.to_string(), "5,1,c-m;6,5,c-c;");
    } else {
        let err = result.expect_err("strict mode must fail");
        assert!(matches!(
            err,
            CliError::Core(AssemblyError::MalformedRecord {
                record: 2,
                reason: MalformedReason::UnknownRelation { .. },
            })
        ));
    }
    Ok(())
}

#[test]
fn term_edges_sample_matches_fixture() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "edges.txt", fixtures::SAMPLE_TERM_EDGES)?;
    let summary = run_cli(Cli {
        command: Command::TermEdges(TermEdgesArgs { input }),
    })?;
    assert_eq!(
        summary.triples.to_string(),
        fixtures::SAMPLE_TERM_EDGES_TRIPLES
    );
    assert!(summary.roots.is_empty());
    Ok(())
}

#[test]
fn missing_input_reports_io_error() {
    let dir = temp_dir();
    let input = dir.path().join("absent.txt");
    let err = run_cli_expecting_error(
        Cli {
            command: Command::TermEdges(TermEdgesArgs {
                input: input.clone(),
            }),
        },
        "missing file must fail",
    );
    match err {
        CliError::Io { ref path, .. } => assert_eq!(path, &input),
        ref other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.exit_status(), 2);
}

#[test]
fn clap_parses_coarsening_flags() {
    let cli = Cli::try_parse_from([
        "clustree",
        "coarsening",
        "-",
        "--min-cluster-size",
        "3",
        "--max-node",
        "40",
        "--apex",
    ])
    .expect("arguments are valid");
    let Command::Coarsening(args) = cli.command else {
        panic!("expected the coarsening command");
    };
    assert_eq!(args.input, PathBuf::from("-"));
    assert_eq!(args.min_cluster_size, 3);
    assert_eq!(args.max_node, Some(40));
    assert!(args.apex);
    assert!(!args.strict);
}

#[rstest]
#[case::path_tree(&["clustree", "path-tree", "tree.txt", "--strict"], "path-tree")]
#[case::coarsening(&["clustree", "coarsening", "levels.json"], "coarsening")]
#[case::canonicalize(&["clustree", "canonicalize", "-", "--lenient"], "canonicalize")]
#[case::term_edges(&["clustree", "term-edges", "edges.txt"], "term-edges")]
fn clap_recognises_every_command(#[case] argv: &[&str], #[case] name: &str) {
    let cli = Cli::try_parse_from(argv.iter().copied()).expect("arguments are valid");
    assert_eq!(cli.command.name(), name);
}

#[test]
fn clap_defaults_min_cluster_size_to_two() {
    let cli = Cli::try_parse_from(["clustree", "coarsening", "levels.json"])
        .expect("arguments are valid");
    let Command::Coarsening(args) = cli.command else {
        panic!("expected the coarsening command");
    };
    assert_eq!(args.min_cluster_size, 2);
}

#[test]
fn run_cli_records_command_span_and_completion_event() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "tree.txt", fixtures::SAMPLE_TREE)?;
    let (result, layer) = capture(|| {
        run_cli(Cli {
            command: Command::PathTree(PathTreeArgs {
                input,
                strict: false,
            }),
        })
    });
    result?;

    let span = layer.span("cli.run").expect("cli.run span must close");
    assert_eq!(span.fields.get("command"), Some(&"path-tree".to_owned()));
    assert!(layer.span("path_tree.assemble").is_some());

    let completed = layer
        .events_at(Level::INFO)
        .into_iter()
        .find(|event| event.message() == Some("command completed"))
        .expect("completion event must be emitted");
    assert_eq!(completed.field("triples"), Some("10"));
    assert_eq!(completed.field("roots"), Some("1"));
    Ok(())
}

#[test]
fn render_triples_writes_the_wire_stream() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "edges.txt", fixtures::SAMPLE_TERM_EDGES)?;
    let summary = run_cli(Cli {
        command: Command::TermEdges(TermEdgesArgs { input }),
    })?;
    let mut buffer = Vec::new();
    render_triples(&summary, &mut buffer)?;
    assert_eq!(
        String::from_utf8(buffer)?,
        fixtures::SAMPLE_TERM_EDGES_TRIPLES
    );
    Ok(())
}

#[test]
fn failures_are_logged_once_with_the_full_chain() -> TestResult {
    let dir = temp_dir();
    let input = create_input_file(&dir, "tree.txt", "1:1 0.5 \"1\"\n1:1\n")?;
    let cli = Cli {
        command: Command::PathTree(PathTreeArgs {
            input,
            strict: false,
        }),
    };
    let (result, layer) = capture(|| run_cli(cli));
    let err = result.expect_err("a malformed line must fail");
    assert!(
        layer.events_at(Level::ERROR).is_empty(),
        "nested spans must not log the failure"
    );

    let cause = err.to_string();
    let err = anyhow::Error::new(err).context("failed to execute command");
    let (status, layer) = capture(|| report_failure(&err));
    assert_eq!(status, 2);

    let errors = layer.events_at(Level::ERROR);
    assert_eq!(errors.len(), 1);
    let reported = errors.first().expect("one error event");
    assert_eq!(
        reported.field("error"),
        Some(format!("failed to execute command: {cause}").as_str())
    );
    assert_eq!(reported.field("code"), Some("ASSEMBLY_MALFORMED_RECORD"));
    assert_eq!(reported.field("status"), Some("2"));
    Ok(())
}

#[test]
fn report_failure_maps_empty_results_to_status_one() {
    let err = anyhow::Error::new(CliError::Core(AssemblyError::EmptyResult));
    let (status, layer) = capture(|| report_failure(&err));
    assert_eq!(status, 1);
    let errors = layer.events_at(Level::ERROR);
    assert_eq!(
        errors.first().and_then(|event| event.field("code")),
        Some("ASSEMBLY_EMPTY_RESULT")
    );
}
