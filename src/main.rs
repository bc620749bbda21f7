use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;

use commands::{
    ConfigCommand, CostCommand, DayCommand, LodgingCommand, StopCommand, TripCommand,
};
use config::Config;
use db::{init_db, SqliteDocumentStore};
use trip_journal_core::{Repositories, TripDeletionError};

#[derive(Parser)]
#[command(name = "tripjournal")]
#[command(version)]
#[command(about = "Plan trips and keep a journal of days, stops, lodging and costs", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage trips
    Trip(TripCommand),

    /// Manage the days of a trip
    Day(DayCommand),

    /// Manage stops along the way
    Stop(StopCommand),

    /// Manage lodging
    Lodging(LodgingCommand),

    /// Track planned and actual costs
    Cost(CostCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripjournal=info,trip_journal_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        // exit code 2: a trip may be left partially deleted
        let critical = e
            .downcast_ref::<TripDeletionError>()
            .is_some_and(TripDeletionError::is_critical);
        if critical {
            eprintln!("CRITICAL: {}", e);
            eprintln!("Some records could not be restored. Check the log above before retrying.");
            std::process::exit(2);
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config, cli_config_path),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let pool = init_db(&config.database_path.value).await?;
    let repos = Repositories::new(Arc::new(SqliteDocumentStore::new(pool)));

    match command {
        Commands::Trip(cmd) => cmd.run(&repos, &config).await,
        Commands::Day(cmd) => cmd.run(&repos, &config).await,
        Commands::Stop(cmd) => cmd.run(&repos, &config).await,
        Commands::Lodging(cmd) => cmd.run(&repos, &config).await,
        Commands::Cost(cmd) => cmd.run(&repos, &config).await,
        Commands::Config(cmd) => cmd.run(&config, cli_config_path),
    }
}
