mod cli;
mod command;
mod config;
mod repl;

use anyhow::{Context, Result};
use attendance_core::{
    adapters::outbound::{FileCache, InMemoryRemoteStore, SystemClock},
    domain::{models::Actor, ports::outbound::Clock},
};
use clap::Parser;
use cli::{Cli, Commands};
use repl::Repl;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = config::read_config()?;
    let cache_directory = settings.cache.resolve_directory()?;

    match cli.command {
        Commands::ConfigPath => {
            println!("config: {}", config::config_directory()?.display());
            println!("cache:  {}", cache_directory.display());
        }
        Commands::Run { offline } => {
            std::fs::create_dir_all(&cache_directory).with_context(|| {
                format!("Failed to create cache directory {}", cache_directory.display())
            })?;

            let actor = if cli.reviewer {
                Actor::reviewer(cli.employee)
            } else {
                Actor::employee(cli.employee)
            };
            let business_date = cli.date.unwrap_or_else(|| SystemClock::local().today());

            let store = InMemoryRemoteStore::new()
                .with_annual_allowance(settings.engine.annual_leave_allowance);
            store.set_offline(offline);

            tracing::info!(
                employee_id = %actor.employee_id,
                role = %actor.role,
                %business_date,
                cache = %cache_directory.display(),
                "Starting attendance session"
            );

            Repl::new(
                store,
                FileCache::new(cache_directory),
                actor,
                business_date,
                settings.engine.tick_interval(),
            )
            .run()
            .await?;
        }
    }

    Ok(())
}
