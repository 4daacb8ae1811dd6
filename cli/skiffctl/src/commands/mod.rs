//! CLI commands.

mod config;
mod containers;
mod deployments;
mod services;
mod stats;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::ApiClient;
use crate::output::OutputFormat;

/// skiff CLI - Manage containers, deployments, and services on a single
/// node.
#[derive(Debug, Parser)]
#[command(name = "skiff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Orchestrator base URL.
    #[arg(long, global = true, env = "SKIFF_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage individual containers.
    Containers(containers::ContainersCommand),

    /// Manage deployments (replicated containers).
    Deployments(deployments::DeploymentsCommand),

    /// Manage services (port mappings over deployments).
    Services(services::ServicesCommand),

    /// Show orchestrator statistics.
    Stats,

    /// Show or update saved CLI configuration.
    Config(config::ConfigCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let config = crate::config::Config::load()?;
        let server = self.server.unwrap_or_else(|| config.server.clone());

        let ctx = CommandContext {
            config,
            server,
            format,
        };

        match self.command {
            Commands::Containers(cmd) => cmd.run(ctx).await,
            Commands::Deployments(cmd) => cmd.run(ctx).await,
            Commands::Services(cmd) => cmd.run(ctx).await,
            Commands::Stats => stats::show_stats(ctx).await,
            Commands::Config(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("skiff {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: crate::config::Config,
    pub server: String,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Get an API client for the resolved server.
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.server)
    }
}
