//! sqlframe CLI
//!
//! Runs the application's migrations against the database in `config.yaml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod migrations;

#[derive(Debug, Parser)]
#[command(name = "sqlframe")]
#[command(about = "sqlframe - database migrations", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run all pending migrations
    #[command(name = "migrate")]
    Migrate,
    /// Roll back migration batches
    #[command(name = "migrate:rollback")]
    Rollback(commands::RollbackArgs),
    /// Roll back every migration
    #[command(name = "migrate:reset")]
    Reset,
    /// Roll back every migration and run them again
    #[command(name = "migrate:refresh")]
    Refresh,
    /// Show which migrations have run
    #[command(name = "migrate:status")]
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate(&cli.config).await,
        Commands::Rollback(args) => commands::rollback(&cli.config, args).await,
        Commands::Reset => commands::reset(&cli.config).await,
        Commands::Refresh => commands::refresh(&cli.config).await,
        Commands::Status => commands::status(&cli.config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
