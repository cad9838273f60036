use crate::error::ReportError::UsageError;
use crate::error::ReportResult;
use crate::input::InputFormat;
use crate::utils::label_from_path;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "k6-report", version, about="k6 load-test report tool", long_about = None, arg_required_else_help(true), propagate_version(true))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(arg_required_else_help = true)]
    GenerateAutoComplete { shell: Shell },

    /// Compare two or three k6 runs
    #[command(arg_required_else_help = true)]
    Compare {
        #[arg(
            short,
            long,
            required = true,
            num_args = 2..=3,
            help = "k6 json logs (--out json) or end-of-test summaries"
        )]
        files: Vec<PathBuf>,
        #[arg(
            short,
            long,
            num_args = 2..=3,
            help = "short display name per file, in the same order; defaults to the file names"
        )]
        labels: Option<Vec<String>>,
        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Per-second table and charts of a single k6 json log
    #[command(arg_required_else_help = true)]
    Report {
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short, long, default_value = ".", help = "directory for csv and png files")]
    pub out_dir: PathBuf,
    #[arg(long, default_value_t = 1600)]
    pub width: u32,
    #[arg(long, default_value_t = 600)]
    pub height: u32,
    #[arg(long, help = "TrueType font for chart labels")]
    pub font: Option<PathBuf>,
}

/// One label per file, either as given or derived from the file names.
pub fn resolve_labels(
    files: &[PathBuf],
    labels: Option<Vec<String>>,
) -> ReportResult<Vec<String>> {
    match labels {
        Some(labels) if labels.len() != files.len() => Err(UsageError(format!(
            "got {} files but {} labels",
            files.len(),
            labels.len()
        ))),
        Some(labels) => Ok(labels),
        None => Ok(files.iter().map(|f| label_from_path(f)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compare_args() {
        let cli = Cli::try_parse_from([
            "k6-report", "compare", "--files", "a.json", "b.json", "c.json", "--labels", "json",
            "msgpack", "grpc",
        ])
        .unwrap();
        let Commands::Compare {
            files,
            labels,
            format,
            output,
        } = cli.command
        else {
            panic!("expected compare");
        };
        assert_eq!(files.len(), 3);
        assert_eq!(labels.unwrap(), vec!["json", "msgpack", "grpc"]);
        assert_eq!(format, InputFormat::Auto);
        assert_eq!(output.out_dir, PathBuf::from("."));
        assert_eq!((output.width, output.height), (1600, 600));
    }

    #[test]
    fn test_compare_file_arity() {
        assert!(Cli::try_parse_from(["k6-report", "compare", "--files", "a.json"]).is_err());
        assert!(Cli::try_parse_from([
            "k6-report", "compare", "--files", "a", "b", "c", "d"
        ])
        .is_err());
    }

    #[test]
    fn test_report_requires_file() {
        assert!(Cli::try_parse_from(["k6-report", "report"]).is_err());
        assert!(Cli::try_parse_from(["k6-report", "report", "run.ndjson"]).is_ok());
    }

    #[test]
    fn test_resolve_labels() {
        let files = vec![PathBuf::from("out/json.ndjson"), PathBuf::from("grpc.ndjson")];
        assert_eq!(resolve_labels(&files, None).unwrap(), vec!["json", "grpc"]);
        assert_eq!(
            resolve_labels(&files, Some(vec!["A".into(), "B".into()])).unwrap(),
            vec!["A", "B"]
        );
        let err = resolve_labels(&files, Some(vec!["A".into(), "B".into(), "C".into()]));
        assert!(matches!(err, Err(UsageError(_))));
    }
}
