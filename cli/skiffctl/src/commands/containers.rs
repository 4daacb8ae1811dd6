//! Container commands.

use std::collections::HashMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::output::{display_time, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Container commands.
#[derive(Debug, Args)]
pub struct ContainersCommand {
    #[command(subcommand)]
    command: ContainersSubcommand,
}

#[derive(Debug, Subcommand)]
enum ContainersSubcommand {
    /// List all containers.
    List,

    /// Create a container (created, not started).
    Create(CreateContainerArgs),

    /// Start a container.
    Start(ContainerRefArgs),

    /// Stop a container.
    Stop(ContainerRefArgs),

    /// Remove a container.
    Rm(ContainerRefArgs),

    /// Show container details.
    Inspect(ContainerRefArgs),

    /// Fetch container logs.
    Logs(LogsArgs),
}

#[derive(Debug, Args)]
struct CreateContainerArgs {
    /// Container name.
    name: String,

    /// Container image.
    #[arg(long)]
    image: String,

    /// Port mapping as container=host, repeatable (e.g. --port 80/tcp=8080).
    #[arg(long = "port", value_name = "CONTAINER=HOST")]
    ports: Vec<String>,

    /// Environment variable as KEY=VALUE, repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    environment: Vec<String>,

    /// Label as KEY=VALUE, repeatable.
    #[arg(long = "label", value_name = "KEY=VALUE")]
    labels: Vec<String>,
}

#[derive(Debug, Args)]
struct ContainerRefArgs {
    /// Container name, ID, or ID prefix.
    container: String,
}

#[derive(Debug, Args)]
struct LogsArgs {
    /// Container name, ID, or ID prefix.
    container: String,

    /// Number of trailing lines to fetch.
    #[arg(long)]
    tail: Option<u32>,
}

impl ContainersCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ContainersSubcommand::List => list_containers(ctx).await,
            ContainersSubcommand::Create(args) => create_container(ctx, args).await,
            ContainersSubcommand::Start(args) => start_container(ctx, args).await,
            ContainersSubcommand::Stop(args) => stop_container(ctx, args).await,
            ContainersSubcommand::Rm(args) => remove_container(ctx, args).await,
            ContainersSubcommand::Inspect(args) => inspect_container(ctx, args).await,
            ContainersSubcommand::Logs(args) => container_logs(ctx, args).await,
        }
    }
}

/// Container response from API.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct ContainerResponse {
    #[tabled(rename = "ID", display = "short_id")]
    id: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Image")]
    image: String,

    #[tabled(rename = "Status")]
    status: String,

    #[tabled(rename = "Ports", display = "display_ports")]
    #[serde(default)]
    ports: HashMap<String, String>,

    #[tabled(rename = "Created", display = "display_time")]
    created_at: String,
}

fn short_id(id: &str) -> String {
    id.chars().take(12).collect()
}

fn display_ports(ports: &HashMap<String, String>) -> String {
    if ports.is_empty() {
        return "-".to_string();
    }
    let mut pairs: Vec<_> = ports
        .iter()
        .map(|(container, host)| format!("{host}->{container}"))
        .collect();
    pairs.sort();
    pairs.join(", ")
}

/// Create container request.
#[derive(Debug, Serialize)]
struct CreateContainerRequest {
    name: String,
    image: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    ports: HashMap<String, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    environment: HashMap<String, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// Split repeated KEY=VALUE flags into a map.
pub(super) fn parse_pairs(pairs: &[String], flag: &str) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow::anyhow!("Invalid --{flag} value '{pair}': expected KEY=VALUE"))
        })
        .collect()
}

async fn list_containers(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let containers: Vec<ContainerResponse> = client.get("/containers").await?;
    print_output(&containers, ctx.format);
    Ok(())
}

async fn create_container(ctx: CommandContext, args: CreateContainerArgs) -> Result<()> {
    let client = ctx.client()?;

    let request = CreateContainerRequest {
        name: args.name,
        image: args.image,
        ports: parse_pairs(&args.ports, "port")?,
        environment: parse_pairs(&args.environment, "env")?,
        labels: parse_pairs(&args.labels, "label")?,
    };

    let container: ContainerResponse = client.post("/containers", &request).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&container, ctx.format),
        OutputFormat::Table => {
            print_success(&format!(
                "Created container '{}' ({})",
                container.name,
                short_id(&container.id)
            ));
        }
    }
    Ok(())
}

async fn start_container(ctx: CommandContext, args: ContainerRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let response: StatusResponse = client
        .post_empty(&format!("/containers/{}/start", args.container))
        .await?;
    print_success(&format!("Container '{}' {}", args.container, response.status));
    Ok(())
}

async fn stop_container(ctx: CommandContext, args: ContainerRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let response: StatusResponse = client
        .post_empty(&format!("/containers/{}/stop", args.container))
        .await?;
    print_success(&format!("Container '{}' {}", args.container, response.status));
    Ok(())
}

async fn remove_container(ctx: CommandContext, args: ContainerRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let response: StatusResponse = client
        .delete(&format!("/containers/{}/remove", args.container))
        .await?;
    print_success(&format!("Container '{}' {}", args.container, response.status));
    Ok(())
}

async fn inspect_container(ctx: CommandContext, args: ContainerRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let container: serde_json::Value = client
        .get(&format!("/containers/{}", args.container))
        .await?;
    print_single(&container, ctx.format);
    Ok(())
}

async fn container_logs(ctx: CommandContext, args: LogsArgs) -> Result<()> {
    let client = ctx.client()?;

    let mut path = format!("/containers/{}/logs", args.container);
    if let Some(tail) = args.tail {
        path.push_str(&format!("?tail={tail}"));
    }

    let logs = client.get_text(&path).await?;
    print!("{logs}");
    Ok(())
}
