//! Saved CLI configuration.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::output::print_success;

use super::CommandContext;

/// Configuration commands.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    /// Show the effective configuration.
    Show,

    /// Save a default orchestrator URL.
    SetServer(SetServerArgs),
}

#[derive(Debug, Args)]
struct SetServerArgs {
    /// Orchestrator base URL, e.g. http://127.0.0.1:8080.
    url: String,
}

impl ConfigCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ConfigSubcommand::Show => {
                println!("server: {}", ctx.server);
                Ok(())
            }
            ConfigSubcommand::SetServer(args) => {
                let mut config = ctx.config;
                config.server = args.url;
                config.save()?;
                print_success(&format!("Default server set to {}", config.server));
                Ok(())
            }
        }
    }
}
