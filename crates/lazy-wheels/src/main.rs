mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wheels_pipeline::CancellationToken;

use crate::commands::Commands;
use crate::error::CliError;

const LOG_ENV: &str = "LAZY_WHEELS_LOG";

#[derive(Parser)]
#[command(name = "lazy-wheels")]
#[command(bin_name = "lazy-wheels")]
#[command(version = env!("LAZY_WHEELS_VERSION"))]
#[command(about = "Release the packages of a uv workspace that changed since their last tag", long_about = None)]
struct Cli {
    /// Path to start workspace discovery from (default: current directory)
    #[arg(long = "path", short = 'C', global = true)]
    path: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let start_path = match resolve_start_path(cli.path) {
        Ok(path) => path,
        Err(e) => {
            print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    if let Err(e) = install_interrupt_handler(&cancel) {
        print_error(&e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = cli.command.execute(&start_path, &cancel) {
        print_error(&e);
        if let Some(progress) = output::format_progress(&e) {
            eprint!("{progress}");
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The running stage finishes; the pipeline stops before the next one.
fn install_interrupt_handler(cancel: &CancellationToken) -> Result<(), CliError> {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, stopping after the current stage");
        cancel.cancel();
    })?;
    Ok(())
}

fn resolve_start_path(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match path {
        Some(p) => Ok(p),
        None => std::env::current_dir().map_err(CliError::CurrentDir),
    }
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
