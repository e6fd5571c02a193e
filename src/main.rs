//! Diagchat - vehicle diagnostic chat client
//!
#![doc = "Diagchat - vehicle diagnostic chat client"]
#![doc = "Main entry point for the Diagchat terminal client."]

use anyhow::Result;

use diagchat::cli::{Cli, Commands, ProviderCommand};
use diagchat::commands;
use diagchat::config::Config;
use diagchat::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_logging(cli.verbose, cli.json_logs)?;

    // Load and validate configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Vehicles { query, limit, json } => {
            tracing::info!("Starting vehicle lookup");
            commands::lookup::search_vehicles(&config, &query, limit, json).await?;
            Ok(())
        }
        Commands::Providers { command } => {
            tracing::info!("Starting provider management command");
            match command {
                ProviderCommand::List { json } => {
                    commands::lookup::list_providers(&config, json).await?;
                    Ok(())
                }
                ProviderCommand::Use { name } => {
                    commands::lookup::use_provider(&config, &name).await?;
                    Ok(())
                }
            }
        }
    }
}
