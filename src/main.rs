// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

mod apply;
mod artifact;
mod cache;
mod config;
mod logging;
mod platform;
mod reconcile;
mod state;
#[cfg(test)]
mod test_utils;

use crate::apply::{Applier, ApplyError};
use crate::cache::CollectionCache;
use crate::platform::CloudControllerClient;
use crate::state::SqliteStateStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.toml",
        global = true
    )]
    config: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Converge every declared buildpack
    Apply,
    /// Show what apply would change without changing anything
    Plan,
    /// Refresh and print one managed buildpack
    Read {
        /// Buildpack name
        name: String,
    },
    /// Check whether a buildpack with this name exists remotely
    Exists {
        /// Buildpack name
        name: String,
    },
    /// Delete one managed buildpack
    Delete {
        /// Buildpack name
        name: String,
    },
    /// List the stored buildpack identities
    Status,
    /// Forget every stored buildpack identity
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {:#}", cli.config, e);
            process::exit(1);
        }
    };

    let _log_guard = logging::init_logging(config.logging.as_ref(), cli.verbose)?;
    info!("Buildpack reconciler v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli.command, config).await {
        error!("{:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, config: config::Config) -> Result<()> {
    let applier = initialize_applier(&config)?;

    match command {
        Commands::Apply => {
            let report = applier.apply(&config.buildpacks).await;
            for (name, outcome) in &report.outcomes {
                println!("{name}: {outcome:?}");
            }
            let failed = report.failed();
            if failed > 0 {
                return Err(ApplyError::Incomplete {
                    failed,
                    total: report.outcomes.len(),
                }
                .into());
            }
        }
        Commands::Plan => {
            for (name, plan) in applier.plan(&config.buildpacks).await? {
                println!("{name}: {plan}");
            }
        }
        Commands::Read { name } => {
            let declared = config.buildpacks.iter().find(|b| b.name == name);
            let state = applier.read(&name, declared).await?;
            if state.has_id() {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{name}: no longer exists, removed from state");
            }
        }
        Commands::Exists { name } => match applier.exists(&name).await? {
            Some(guid) => println!("{name}: exists ({guid})"),
            None => println!("{name}: not found"),
        },
        Commands::Delete { name } => {
            applier.delete(&name).await?;
            println!("{name}: deleted");
        }
        Commands::Status => {
            for stored in applier.managed().await? {
                println!(
                    "{}: {} {} (updated {})",
                    stored.name,
                    stored.guid,
                    stored.filename,
                    stored.updated_at.to_rfc3339()
                );
            }
        }
        Commands::Reset => {
            info!("Resetting buildpack state...");
            applier.reset().await?;
            info!("Buildpack state has been reset successfully");
        }
    }

    Ok(())
}

fn initialize_applier(
    config: &config::Config,
) -> Result<Applier<CloudControllerClient, SqliteStateStore>> {
    let client = CloudControllerClient::new(&config.platform)
        .context("Failed to initialize buildpack client")?;
    let store = SqliteStateStore::new(&config.state.db_path)
        .context("Failed to initialize state store")?;
    let cache = Arc::new(CollectionCache::from_config(&config.cache));

    Ok(Applier::new(client, store, cache, &config.apply))
}
