mod cli;
mod commands;
mod completions;
mod error;

use anyhow::Result;
use authflow_core::AppCore;
use authflow_core::config::Config;
use authflow_core::paths;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let Commands::Completions { shell } = &cli.command {
        completions::generate_completions(*shell);
        return;
    }

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let db_path = match &cli.db_path {
        Some(path) => path.clone(),
        None => paths::ensure_database_path_string()?,
    };
    let config = Config::load_or_default(&paths::config_path()?)?;
    let core = AppCore::new(&db_path, config)?;

    match cli.command {
        Commands::Completions { .. } => unreachable!("handled before core setup"),
        Commands::Group { command } => commands::group::run(&core, command),
        Commands::Identity { command } => commands::identity::run(&core, command),
        Commands::Run(args) => commands::run::run(&core, args).await,
        Commands::Capture(args) => commands::run::capture(&core, args).await,
        Commands::Task { command } => commands::task::run(&core, command),
        Commands::Status => commands::status::run(&core),
    }
}
