//! Orchestrator statistics.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::output::{print_single, OutputFormat};

use super::CommandContext;

#[derive(Debug, Serialize, Deserialize)]
struct StatsResponse {
    containers: usize,
    deployments: usize,
    services: usize,
    uptime_secs: u64,
}

/// Fetch and print orchestrator statistics.
pub async fn show_stats(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let stats: StatsResponse = client.get("/stats").await?;

    match ctx.format {
        OutputFormat::Json => print_single(&stats, ctx.format),
        OutputFormat::Table => {
            println!("Containers:  {}", stats.containers);
            println!("Deployments: {}", stats.deployments);
            println!("Services:    {}", stats.services);
            println!("Uptime:      {}s", stats.uptime_secs);
        }
    }
    Ok(())
}
