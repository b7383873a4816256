//! absa - aspect-based sentiment labeling CLI
//!
//! Set `RUST_LOG=absa=debug` for per-sentence detail.

use std::io;
use std::process::ExitCode;

use absa::cli::commands::{cmd_align, cmd_labels, cmd_metrics, cmd_summarize, cmd_validate};
use absa::cli::output::color;
use absa::cli::{Cli, Commands};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("absa=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), String> = match cli.command {
        Commands::Labels(args) => cmd_labels(args),
        Commands::Align(args) => cmd_align(args),
        Commands::Metrics(args) => cmd_metrics(args),
        Commands::Summarize(args) => cmd_summarize(args),
        Commands::Validate(args) => cmd_validate(args),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "absa", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
