use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod pipeline;
mod report;

use commands::{ConfigCommands, ImportArgs, RuleCommands};

#[derive(Parser)]
#[command(
    name = "budgetsplit",
    version,
    about = "Categorize bank CSV exports and check spending against a needs/wants/savings split"
)]
struct Cli {
    /// Directory holding settings.toml and rules.toml
    #[arg(long, global = true, env = "BUDGETSPLIT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over one or more bank exports
    Import(ImportArgs),

    /// Show which bank export format a file looks like
    Detect {
        /// Path to a CSV export
        file: PathBuf,
    },

    /// Manage categorization rules
    #[command(subcommand)]
    Rules(RuleCommands),

    /// Show or create the settings file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = cli.data_dir.as_deref();
    match cli.command {
        Commands::Import(args) => commands::import(data_dir, args).await,
        Commands::Detect { file } => commands::detect(&file),
        Commands::Rules(cmd) => commands::rules(data_dir, cmd),
        Commands::Config(cmd) => commands::config(data_dir, cmd),
    }
}
