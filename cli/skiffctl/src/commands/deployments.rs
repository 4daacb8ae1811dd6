//! Deployment commands.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::output::{display_time, print_output, print_single, print_success, OutputFormat};

use super::containers::parse_pairs;
use super::CommandContext;

/// Deployment commands.
#[derive(Debug, Args)]
pub struct DeploymentsCommand {
    #[command(subcommand)]
    command: DeploymentsSubcommand,
}

#[derive(Debug, Subcommand)]
enum DeploymentsSubcommand {
    /// List deployments.
    List,

    /// Create a deployment.
    Create(CreateDeploymentArgs),

    /// Show deployment details.
    Get(DeploymentRefArgs),

    /// Delete a deployment and its replicas.
    Delete(DeploymentRefArgs),
}

#[derive(Debug, Args)]
struct CreateDeploymentArgs {
    /// Deployment name. Required unless --file is given.
    #[arg(required_unless_present = "file")]
    name: Option<String>,

    /// Container image.
    #[arg(long, required_unless_present = "file")]
    image: Option<String>,

    /// Replica count.
    #[arg(long, default_value = "1")]
    replicas: usize,

    /// Port mapping as container=base-host-port, repeatable. Replica `i`
    /// binds base + i.
    #[arg(long = "port", value_name = "CONTAINER=HOST")]
    ports: Vec<String>,

    /// Environment variable as KEY=VALUE, repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    environment: Vec<String>,

    /// Read the full deployment spec from a JSON file instead of flags.
    #[arg(long, short = 'f', conflicts_with_all = ["name", "image", "ports", "environment"])]
    file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DeploymentRefArgs {
    /// Deployment name.
    name: String,
}

impl DeploymentsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            DeploymentsSubcommand::List => list_deployments(ctx).await,
            DeploymentsSubcommand::Create(args) => create_deployment(ctx, args).await,
            DeploymentsSubcommand::Get(args) => get_deployment(ctx, args).await,
            DeploymentsSubcommand::Delete(args) => delete_deployment(ctx, args).await,
        }
    }
}

/// Deployment response from API.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct DeploymentResponse {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Status")]
    status: String,

    #[tabled(rename = "Replicas", display = "display_replicas")]
    #[serde(default)]
    replicas: Vec<Value>,

    #[tabled(rename = "Created", display = "display_time")]
    created_at: String,
}

fn display_replicas(replicas: &[Value]) -> String {
    replicas.len().to_string()
}

#[derive(Debug, Serialize)]
struct ContainerTemplate {
    name: String,
    image: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    ports: HashMap<String, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    environment: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct CreateDeploymentRequest {
    name: String,
    replicas: usize,
    container: ContainerTemplate,
}

fn request_from_args(args: CreateDeploymentArgs) -> Result<Value> {
    if let Some(path) = args.file {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read spec from {path:?}"))?;
        return serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse spec from {path:?}"));
    }

    // clap enforces presence when --file is absent.
    let name = args.name.unwrap_or_default();
    let request = CreateDeploymentRequest {
        name: name.clone(),
        replicas: args.replicas,
        container: ContainerTemplate {
            name,
            image: args.image.unwrap_or_default(),
            ports: parse_pairs(&args.ports, "port")?,
            environment: parse_pairs(&args.environment, "env")?,
        },
    };
    Ok(serde_json::to_value(request)?)
}

async fn list_deployments(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let deployments: Vec<DeploymentResponse> = client.get("/deployments").await?;
    print_output(&deployments, ctx.format);
    Ok(())
}

async fn create_deployment(ctx: CommandContext, args: CreateDeploymentArgs) -> Result<()> {
    let client = ctx.client()?;

    let request = request_from_args(args)?;
    let deployment: DeploymentResponse = client.post("/deployments", &request).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&deployment, ctx.format),
        OutputFormat::Table => {
            print_success(&format!(
                "Created deployment '{}' with {} replica(s)",
                deployment.name,
                deployment.replicas.len()
            ));
        }
    }
    Ok(())
}

async fn get_deployment(ctx: CommandContext, args: DeploymentRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let deployment: Value = client.get(&format!("/deployments/{}", args.name)).await?;
    print_single(&deployment, ctx.format);
    Ok(())
}

async fn delete_deployment(ctx: CommandContext, args: DeploymentRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let _: Value = client.delete(&format!("/deployments/{}", args.name)).await?;
    print_success(&format!("Deleted deployment '{}'", args.name));
    Ok(())
}
