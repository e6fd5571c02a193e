//! Command-line interface definition for Diagchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive diagnostic chat and a few lookup commands.

use clap::{Parser, Subcommand};

/// Diagchat - vehicle diagnostic chat client
///
/// Walks an operator through a multi-step diagnostic conversation with a
/// remote diagnosis service.
#[derive(Parser, Debug, Clone)]
#[command(name = "diagchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the diagnosis service base url
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Diagchat
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start an interactive diagnostic conversation
    Chat,

    /// Look up vehicles in the service catalogue
    Vehicles {
        /// Free text query (make, model, year)
        query: String,

        /// Maximum number of results (defaults to chat.vehicle_search_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the service's reasoning provider
    Providers {
        /// Provider management subcommand
        #[command(subcommand)]
        command: ProviderCommand,
    },
}

/// Reasoning provider subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    /// List providers known to the service
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Make a provider the active one
    Use {
        /// Provider name as listed by `providers list`
        name: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
