//! projmon-cli: CLI for the project file change monitor

use std::path::PathBuf;

use clap::Parser;
use projmon_cli::commands::ack::AckTarget;
use projmon_cli::commands::review::ReviewQuery;
use projmon_cli::commands::{self, open_service};
use projmon_cli::logging::setup_logging;
use projmon_cli::types::GlobalOptions;
use projmon_cli::{Commands, OutputFormat};

#[derive(Parser)]
#[command(name = "projmon")]
#[command(author, version, about = "Project file change monitor", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file with [monitor] settings and [[projects]] entries
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Monitor database, overriding the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Also write the change log to daily files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Output format for listings
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = setup_logging(cli.verbose, cli.log_dir.as_deref())?;

    let options = GlobalOptions {
        config: cli.config,
        db: cli.db,
        format: cli.format,
    };
    let service = open_service(&options)?;

    match cli.command {
        Commands::Scan { job, all } => {
            commands::scan::run(service, job.as_deref(), all).await?;
        }
        Commands::Watch { job } => {
            commands::watch::run(service, &job).await?;
        }
        Commands::Changes { job, all } => {
            commands::review::run(&service, &ReviewQuery::Changes { job, all }, options.format)?;
        }
        Commands::Files { job } => {
            commands::review::run(&service, &ReviewQuery::Files { job }, options.format)?;
        }
        Commands::Projects => {
            commands::review::run(&service, &ReviewQuery::Projects, options.format)?;
        }
        Commands::History { job, limit } => {
            commands::review::run(&service, &ReviewQuery::History { job, limit }, options.format)?;
        }
        Commands::Stats => {
            commands::review::run(&service, &ReviewQuery::Stats, options.format)?;
        }
        Commands::Ack {
            job,
            path,
            change_type,
            everything,
        } => {
            let target = AckTarget::from_args(job, path, change_type, everything)?;
            commands::ack::run(&service, &target)?;
        }
        Commands::Maintain { reset } => {
            commands::maintain::run(&service, reset)?;
        }
    }

    Ok(())
}
