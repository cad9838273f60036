use clap::error::ErrorKind;
use clap::{Command, CommandFactory, Parser};
use clap_complete::{generate, Generator};
use k6_report::cli::Commands::GenerateAutoComplete;
use k6_report::cli::{resolve_labels, Cli, Commands, OutputArgs};
use k6_report::error::ReportError::UsageError;
use k6_report::error::ReportResult;
use k6_report::input::{load_run, InputFormat};
use k6_report::report::charts::load_font;
use k6_report::report::{format_table, write_comparison, write_single, ReportOptions};
use k6_report::utils::label_from_path;
use std::io;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ReportResult<()> {
    let mut cmd = Cli::command();
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into());
    let subscriber = fmt()
        .pretty()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(filter);

    subscriber.init();

    match cli.command {
        GenerateAutoComplete { shell } => {
            eprintln!("Generating completion file for {shell}...");
            print_completions(shell, &mut cmd);
        }

        Commands::Compare {
            files,
            labels,
            format,
            output,
        } => {
            let labels = match resolve_labels(&files, labels) {
                Ok(labels) => labels,
                Err(UsageError(msg)) => cmd.error(ErrorKind::WrongNumberOfValues, msg).exit(),
                Err(e) => return Err(e),
            };
            compare(files, labels, format, output).await?;
        }

        Commands::Report { file, output } => {
            report(file, output).await?;
        }
    }
    Ok(())
}

#[instrument(skip(output))]
async fn compare(
    files: Vec<PathBuf>,
    labels: Vec<String>,
    format: InputFormat,
    output: OutputArgs,
) -> ReportResult<()> {
    let mut reports = Vec::with_capacity(files.len());
    for (file, label) in files.iter().zip(labels.iter()) {
        info!("Loading {} as {}", file.display(), label);
        match load_run(file, label, format).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("Failed loading {}: {}", file.display(), e);
                return Err(e);
            }
        }
    }

    let opts = report_options(&output);
    let written = write_comparison(&opts, &reports).await?;
    info!("---> Done, wrote {} files", written.len());
    Ok(())
}

#[instrument(skip(output))]
async fn report(
    file: PathBuf,
    output: OutputArgs,
) -> ReportResult<()> {
    let label = label_from_path(&file);
    let run = load_run(&file, &label, InputFormat::Stream).await?;
    let Some(series) = run.series.as_ref() else {
        return Ok(());
    };
    if series.rows.is_empty() {
        warn!(
            "No points parsed from {}, was it written with `k6 run --out json=...`?",
            file.display()
        );
    }

    println!("{}", format_table(series, &run.summary));

    let opts = report_options(&output);
    let written = write_single(&opts, series).await?;
    info!("---> Done, wrote {} files", written.len());
    Ok(())
}

fn report_options(output: &OutputArgs) -> ReportOptions {
    let charts = match load_font(output.font.as_deref()) {
        Ok(_) => true,
        Err(e) => {
            warn!("Charts disabled: {}", e);
            false
        }
    };
    ReportOptions {
        out_dir: output.out_dir.clone(),
        width: output.width,
        height: output.height,
        charts,
    }
}

fn print_completions<G: Generator>(
    gen: G,
    cmd: &mut Command,
) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
