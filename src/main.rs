use clap::Parser;
use colored::Colorize;
use desksort::cli::{OrganizeCommand, run_cli};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sort documents into category directories chosen by a text classifier.
#[derive(Debug, Parser)]
#[command(name = "desksort", version, about)]
struct Cli {
    /// Directory containing the files to organize
    base_dir: PathBuf,

    /// Reverse the last run instead of performing a new one
    #[arg(long)]
    rollback: bool,

    /// Classify files without moving them
    #[arg(long, conflicts_with = "rollback")]
    dry_run: bool,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is fine; the key may come from the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,desksort=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = if cli.rollback {
        OrganizeCommand::Rollback
    } else {
        OrganizeCommand::Organize {
            dry_run: cli.dry_run,
        }
    };

    match run_cli(command, &cli.base_dir, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
