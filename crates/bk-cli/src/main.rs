use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bk_cli::commands::{allocate, events, report, resources, status};
use bk_cli::{Cli, Commands, Config, EventsAction, ResourcesAction};
use bk_core::AllocationService;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(bk_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = bk_db::Database::open_with_busy_timeout(&config.database_path, config.busy_timeout())
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut out, &db, &config.database_path)?;
        }
        Some(Commands::Events(action)) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                EventsAction::List { json } => events::list(&mut out, &db, *json)?,
                EventsAction::Add(args) => events::add(&mut out, &db, args)?,
            }
        }
        Some(Commands::Resources(action)) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                ResourcesAction::List => resources::list(&mut out, &db)?,
                ResourcesAction::Add(args) => resources::add(&mut out, &db, args)?,
            }
        }
        Some(Commands::Allocate(args)) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let service = AllocationService::new(db);
            allocate::run(&mut out, &service, args)?;
        }
        Some(Commands::Allocations) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            allocate::list(&mut out, &db)?;
        }
        Some(Commands::Report(args)) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            report::run(&mut out, &db, args)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
