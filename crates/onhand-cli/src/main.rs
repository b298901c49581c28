//! On-hand CSV merge CLI
//!
//! Command-line tool for merging batches of Location and DC on-hand CSV exports.

use clap::{Parser, Subcommand, ValueEnum};
use onhand_core::{
    collect_uploads, classify, merge_batch, parse_csv, write_all_merged, CellKind, Error,
    GroupKind, GroupOutcome, HaltPolicy, MergedTable, RejectedPath, Row, SourceSummary, Table,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onhand-merge")]
#[command(about = "Merge Location and DC on-hand CSV exports", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify and merge a batch of CSV files
    Merge {
        /// CSV files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory the merged CSVs are written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Keep merging the other group after a group fails
        #[arg(long)]
        keep_going: bool,

        /// Number of rows shown in each preview
        #[arg(long, default_value_t = 5)]
        preview: usize,

        /// Merge and report without writing any files
        #[arg(long)]
        dry_run: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show which group each file would be merged into
    Classify {
        /// CSV files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Parse and display a single CSV file
    Parse {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> onhand_core::Result<ExitCode> {
    match cli.command {
        Commands::Merge {
            paths,
            output,
            keep_going,
            preview,
            dry_run,
            format,
        } => {
            let policy = if keep_going {
                HaltPolicy::Independent
            } else {
                HaltPolicy::StopOnFirstError
            };
            let success = cmd_merge(&paths, &output, policy, preview, dry_run, format)?;
            Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Classify { paths } => cmd_classify(&paths).map(|_| ExitCode::SUCCESS),
        Commands::Parse { file, limit } => cmd_parse(&file, limit).map(|_| ExitCode::SUCCESS),
    }
}

/// Returns whether every group merged; output is written only then, or with
/// `--keep-going`
fn cmd_merge(
    paths: &[PathBuf],
    output_dir: &Path,
    policy: HaltPolicy,
    preview: usize,
    dry_run: bool,
    format: Format,
) -> onhand_core::Result<bool> {
    let uploads = collect_uploads(paths)?;
    if uploads.files.is_empty() {
        println!("No CSV files found. Pass CSV files or directories to begin.");
        return Ok(true);
    }

    tracing::info!(files = uploads.files.len(), ?policy, "merging batch");
    let report = merge_batch(&uploads.files, policy);

    // Nothing is written after a failure unless --keep-going was given
    let mut written: Vec<(GroupKind, PathBuf)> = Vec::new();
    let write_allowed = !dry_run && (report.is_success() || policy == HaltPolicy::Independent);
    if write_allowed {
        let outputs: Vec<(GroupKind, &MergedTable)> = report
            .groups()
            .filter_map(|(kind, outcome)| outcome.merged().map(|m| (kind, m)))
            .collect();
        let targets: Vec<(&MergedTable, &str)> = outputs
            .iter()
            .map(|(kind, merged)| (*merged, kind.output_file_name()))
            .collect();

        let paths = write_all_merged(&targets, output_dir)?;
        written = outputs.iter().map(|(kind, _)| *kind).zip(paths).collect();
    }

    match format {
        Format::Json => {
            let summary = MergeSummary::new(&uploads.rejected, &report, &written);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Format::Text => {
            let halt = policy == HaltPolicy::StopOnFirstError;
            print_merge_report(&uploads.rejected, &report, &written, preview, halt)
        }
    }

    Ok(report.is_success())
}

fn print_merge_report(
    rejected: &[RejectedPath],
    report: &onhand_core::BatchReport,
    written: &[(GroupKind, PathBuf)],
    preview: usize,
    halt_on_error: bool,
) {
    for r in rejected {
        println!("Warning: skipped {} ({})", r.path.display(), r.reason);
    }

    if !report.ignored.is_empty() {
        println!(
            "Warning: the following files don't look like 'Location' or 'DC' and were ignored: {}",
            report.ignored.join(", ")
        );
    }

    if halt_on_error {
        if let Some((kind, err)) = report.first_error() {
            println!();
            print_error(kind, err);
            return;
        }
    }

    for (kind, outcome) in report.groups() {
        println!();
        println!("== {} ==", kind.label());

        match outcome {
            GroupOutcome::Merged(merged) => {
                print_merged(merged, preview);
                match written.iter().find(|(k, _)| *k == kind) {
                    Some((_, path)) => println!("Wrote {}", path.display()),
                    None => println!("(not written: {})", kind.output_file_name()),
                }
            }
            GroupOutcome::Failed(err) => print_error(kind, err),
            GroupOutcome::Empty => println!("No {} files detected.", short_name(kind)),
            GroupOutcome::Skipped => println!("Skipped after an earlier failure."),
        }
    }
}

fn print_merged(merged: &MergedTable, preview: usize) {
    println!(
        "Merged {} rows from {} file(s), {} columns",
        merged.row_count(),
        merged.sources.len(),
        merged.columns.len()
    );
    for source in &merged.sources {
        println!("  {} ({} rows, {})", source.name, source.rows, source.encoding);
    }

    if preview > 0 {
        println!();
        println!("Preview (first {} rows)", preview);
        print_rows(&merged.table, merged.table.head(preview));
    }
}

fn print_error(kind: GroupKind, err: &Error) {
    match err {
        Error::SchemaMismatch {
            file_name,
            expected_columns,
            actual_columns,
            ..
        } => {
            println!(
                "Stopped: {} has mismatched columns for {}.",
                file_name,
                kind.label()
            );
            println!("  Expected columns: [{}]", expected_columns.join(", "));
            println!("  Found columns:    [{}]", actual_columns.join(", "));
        }
        other => println!("Stopped: {} failed: {}", kind.label(), other),
    }
}

fn short_name(kind: GroupKind) -> &'static str {
    match kind {
        GroupKind::Location => "Location",
        GroupKind::Dc => "DC",
    }
}

/// Print rows as an aligned grid, numbers right-aligned
fn print_rows(table: &Table, rows: &[Row]) {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.name.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.as_str().chars().count());
            }
        }
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| format!("{:<w$}", c.name))
        .collect();
    println!("{}", header.join("  "));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

    for row in rows {
        let values: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| match cell.kind() {
                CellKind::Integer | CellKind::Float => format!("{:>w$}", cell.as_str()),
                CellKind::Text | CellKind::Empty => format!("{:<w$}", cell.as_str()),
            })
            .collect();
        println!("{}", values.join("  "));
    }

    if table.row_count() > rows.len() {
        println!("... ({} more rows)", table.row_count() - rows.len());
    }
}

fn cmd_classify(paths: &[PathBuf]) -> onhand_core::Result<()> {
    let uploads = collect_uploads(paths)?;
    let classification = classify(&uploads.files);

    for kind in GroupKind::ALL {
        let members = classification.group(kind);
        println!("{} ({} files):", kind.label(), members.len());
        for file in members {
            println!("  {}", file.name());
        }
        println!();
    }

    println!("Ignored ({} files):", classification.unmatched.len());
    for name in classification.unmatched_names() {
        println!("  {}", name);
    }

    for r in &uploads.rejected {
        println!("Skipped {} ({})", r.path.display(), r.reason);
    }

    Ok(())
}

fn cmd_parse(file: &Path, limit: usize) -> onhand_core::Result<()> {
    let table = parse_csv(file)?;

    println!("File: {}", file.display());
    println!("Encoding: {}", table.encoding);
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    print_rows(&table, table.head(limit));

    Ok(())
}

/// Machine-readable merge report
#[derive(Serialize)]
struct MergeSummary<'a> {
    success: bool,
    ignored: &'a [String],
    rejected: &'a [RejectedPath],
    groups: Vec<GroupSummary<'a>>,
}

#[derive(Serialize)]
struct GroupSummary<'a> {
    group: GroupKind,
    label: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<&'a [SourceSummary]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorSummary<'a>>,
}

#[derive(Serialize)]
struct ErrorSummary<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_columns: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_columns: Option<&'a [String]>,
}

impl<'a> MergeSummary<'a> {
    fn new(
        rejected: &'a [RejectedPath],
        report: &'a onhand_core::BatchReport,
        written: &'a [(GroupKind, PathBuf)],
    ) -> Self {
        let groups = report
            .groups()
            .map(|(kind, outcome)| {
                let merged = outcome.merged();
                GroupSummary {
                    group: kind,
                    label: kind.label(),
                    status: match outcome {
                        GroupOutcome::Empty => "empty",
                        GroupOutcome::Merged(_) => "merged",
                        GroupOutcome::Failed(_) => "failed",
                        GroupOutcome::Skipped => "skipped",
                    },
                    columns: merged.map(|m| m.columns.as_slice()),
                    rows: merged.map(|m| m.row_count()),
                    sources: merged.map(|m| m.sources.as_slice()),
                    output: written
                        .iter()
                        .find(|(k, _)| *k == kind)
                        .map(|(_, p)| p.as_path()),
                    error: outcome.error().map(ErrorSummary::from_error),
                }
            })
            .collect();

        Self {
            success: report.is_success(),
            ignored: &report.ignored,
            rejected,
            groups,
        }
    }
}

impl<'a> ErrorSummary<'a> {
    fn from_error(err: &'a Error) -> Self {
        let (expected_columns, actual_columns) = match err {
            Error::SchemaMismatch {
                expected_columns,
                actual_columns,
                ..
            } => (Some(expected_columns.as_slice()), Some(actual_columns.as_slice())),
            _ => (None, None),
        };

        Self {
            message: err.to_string(),
            file_name: err.file_name(),
            expected_columns,
            actual_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onhand_core::UploadedFile;

    fn upload(name: &str, content: &str) -> UploadedFile {
        UploadedFile::new(name, content.as_bytes().to_vec())
    }

    fn write_inputs(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                std::fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    fn outputs_in(dir: &Path) -> (bool, bool) {
        (
            dir.join("Location_On_Hand_Merged.csv").exists(),
            dir.join("DC_On_Hand_Merged.csv").exists(),
        )
    }

    #[test]
    fn test_merge_failure_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let paths = write_inputs(
            input.path(),
            &[
                ("location_1.csv", "id,qty\n1,2\n"),
                ("location_2.csv", "qty,id\n3,4\n"),
                ("dc_main.csv", "id,qty,dc_code\n1,5,D1\n"),
            ],
        );

        let success = cmd_merge(
            &paths,
            out.path(),
            HaltPolicy::StopOnFirstError,
            5,
            false,
            Format::Text,
        )
        .unwrap();

        assert!(!success);
        assert_eq!(outputs_in(out.path()), (false, false));
    }

    #[test]
    fn test_merge_keep_going_writes_other_group() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let paths = write_inputs(
            input.path(),
            &[
                ("location_1.csv", "id,qty\n1,2\n"),
                ("location_2.csv", "qty,id\n3,4\n"),
                ("dc_main.csv", "id,qty,dc_code\n1,5,D1\n"),
            ],
        );

        let success = cmd_merge(
            &paths,
            out.path(),
            HaltPolicy::Independent,
            5,
            false,
            Format::Json,
        )
        .unwrap();

        assert!(!success);
        assert_eq!(outputs_in(out.path()), (false, true));
        assert_eq!(
            std::fs::read_to_string(out.path().join("DC_On_Hand_Merged.csv")).unwrap(),
            "id,qty,dc_code\n1,5,D1\n"
        );
    }

    #[test]
    fn test_merge_dry_run_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let paths = write_inputs(
            input.path(),
            &[
                ("location_A.csv", "id,qty\n1,2\n"),
                ("dc_main.csv", "id,qty\n1,5\n"),
            ],
        );

        let success = cmd_merge(
            &paths,
            out.path(),
            HaltPolicy::StopOnFirstError,
            5,
            true,
            Format::Text,
        )
        .unwrap();

        assert!(success);
        assert_eq!(outputs_in(out.path()), (false, false));
    }

    #[test]
    fn test_merge_success_writes_both_groups() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let paths = write_inputs(
            input.path(),
            &[
                ("location_A.csv", "id,qty\n1,2\n"),
                ("LOCATION_B.csv", "id,qty\n3,4\n"),
                ("dc_main.csv", "id,qty\n1,5\n"),
            ],
        );

        let success = cmd_merge(
            &paths,
            out.path(),
            HaltPolicy::StopOnFirstError,
            5,
            false,
            Format::Text,
        )
        .unwrap();

        assert!(success);
        assert_eq!(
            std::fs::read_to_string(out.path().join("Location_On_Hand_Merged.csv")).unwrap(),
            "id,qty\n1,2\n3,4\n"
        );
        assert_eq!(outputs_in(out.path()), (true, true));
    }

    #[test]
    fn test_cli_parses_merge_flags() {
        let cli = Cli::try_parse_from([
            "onhand-merge",
            "-vv",
            "merge",
            "a.csv",
            "dir",
            "--output",
            "out",
            "--keep-going",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Merge {
                paths,
                output,
                keep_going,
                preview,
                dry_run,
                format,
            } => {
                assert_eq!(paths, vec![PathBuf::from("a.csv"), PathBuf::from("dir")]);
                assert_eq!(output, PathBuf::from("out"));
                assert!(keep_going);
                assert_eq!(preview, 5);
                assert!(!dry_run);
                assert!(format == Format::Json);
            }
            _ => panic!("expected merge command"),
        }
    }

    #[test]
    fn test_merge_requires_paths() {
        assert!(Cli::try_parse_from(["onhand-merge", "merge"]).is_err());
    }

    #[test]
    fn test_json_summary_for_mismatch() {
        let files = vec![
            upload("location_1.csv", "id,qty\n1,2\n"),
            upload("location_2.csv", "qty,id\n3,4\n"),
            upload("notes.csv", "x\n1\n"),
        ];
        let report = merge_batch(&files, HaltPolicy::StopOnFirstError);

        let summary = MergeSummary::new(&[], &report, &[]);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["ignored"][0], "notes.csv");
        assert_eq!(json["groups"][0]["group"], "location");
        assert_eq!(json["groups"][0]["status"], "failed");
        assert_eq!(json["groups"][0]["error"]["file_name"], "location_2.csv");
        assert_eq!(json["groups"][0]["error"]["actual_columns"][0], "qty");
        assert_eq!(json["groups"][1]["status"], "empty");
    }

    #[test]
    fn test_json_summary_for_success() {
        let files = vec![upload("dc_main.csv", "id,qty,dc_code\n1,5,D1\n")];
        let report = merge_batch(&files, HaltPolicy::StopOnFirstError);
        let written = vec![(GroupKind::Dc, PathBuf::from("out/DC_On_Hand_Merged.csv"))];

        let summary = MergeSummary::new(&[], &report, &written);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["groups"][1]["rows"], 1);
        assert_eq!(json["groups"][1]["sources"][0]["encoding"], "utf-8");
        assert_eq!(json["groups"][1]["output"], "out/DC_On_Hand_Merged.csv");
        assert!(json["groups"][1].get("error").is_none());
    }
}
