use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docbench::backends;
use docbench::conf::Config;
use docbench::core::{BackendKind, BenchError, CliArgs, Command, OutputFormat, setup_logging};
use docbench::harness::{BenchReport, Harness};
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let args = CliArgs::parse();
    info!(args = args; "docbench started.");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

async fn run(args: CliArgs) -> Result<(), BenchError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(path) = args.dataset {
        config.dataset.path = PathBuf::from(path);
    }

    match args.command {
        Command::Run {
            operation,
            backend,
            count,
            format,
        } => {
            let mut harness = Harness::from_config(&config)?;
            harness.connect(backend, &config).await?;
            let report = harness.run(operation, backend, count).await?;
            print_reports(&[report], format, false)
        }
        Command::Compare {
            operation,
            count,
            format,
        } => {
            let mut harness = Harness::from_config(&config)?;
            for backend in BackendKind::ALL {
                harness.connect(backend, &config).await?;
            }
            let reports = harness.compare(operation, count).await?;
            print_reports(&reports, format, true)
        }
        Command::Count { backend } => {
            let mut store = backends::connect(backend, &config).await?;
            println!("{}", store.count().await?);
            Ok(())
        }
    }
}

fn print_reports(reports: &[BenchReport], format: OutputFormat, as_list: bool) -> Result<(), BenchError> {
    match format {
        OutputFormat::Text => {
            for report in reports {
                println!("{}", report.render_text());
            }
        }
        OutputFormat::Json => {
            let encoded = match reports {
                [report] if !as_list => serde_json::to_string_pretty(report),
                _ => serde_json::to_string_pretty(reports),
            }
            .map_err(|e| BenchError::BackendError(format!("encoding report: {e}")))?;
            println!("{encoded}");
        }
    }
    Ok(())
}
