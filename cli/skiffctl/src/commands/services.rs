//! Service commands.

use std::collections::HashMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::output::{display_time, print_output, print_single, print_success, OutputFormat};

use super::containers::parse_pairs;
use super::CommandContext;

/// Service commands.
#[derive(Debug, Args)]
pub struct ServicesCommand {
    #[command(subcommand)]
    command: ServicesSubcommand,
}

#[derive(Debug, Subcommand)]
enum ServicesSubcommand {
    /// List services.
    List,

    /// Create a service.
    Create(CreateServiceArgs),

    /// Show service details.
    Get(ServiceRefArgs),

    /// Delete a service.
    Delete(ServiceRefArgs),
}

#[derive(Debug, Args)]
struct CreateServiceArgs {
    /// Service name.
    name: String,

    /// Service type (ClusterIP, NodePort, or LoadBalancer).
    #[arg(long = "type", default_value = "ClusterIP")]
    service_type: String,

    /// Port mapping as port:target, repeatable (e.g. --port 8080:80).
    #[arg(long = "port", value_name = "PORT:TARGET", required = true)]
    ports: Vec<String>,

    /// Selector label as KEY=VALUE, repeatable.
    #[arg(long = "selector", value_name = "KEY=VALUE")]
    selector: Vec<String>,
}

#[derive(Debug, Args)]
struct ServiceRefArgs {
    /// Service name.
    name: String,
}

impl ServicesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ServicesSubcommand::List => list_services(ctx).await,
            ServicesSubcommand::Create(args) => create_service(ctx, args).await,
            ServicesSubcommand::Get(args) => get_service(ctx, args).await,
            ServicesSubcommand::Delete(args) => delete_service(ctx, args).await,
        }
    }
}

/// Service response from API.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct ServiceResponse {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Type", display = "display_type")]
    #[serde(default)]
    spec: Value,

    #[tabled(rename = "Status")]
    status: String,

    #[tabled(rename = "Created", display = "display_time")]
    created_at: String,
}

fn display_type(spec: &Value) -> String {
    spec["type"].as_str().unwrap_or("-").to_string()
}

#[derive(Debug, Serialize)]
struct ServicePortRequest {
    port: i64,
    target_port: i64,
}

#[derive(Debug, Serialize)]
struct CreateServiceRequest {
    name: String,
    #[serde(rename = "type")]
    service_type: String,
    selector: HashMap<String, String>,
    ports: Vec<ServicePortRequest>,
}

/// Parse a repeated `port:target` flag.
fn parse_ports(pairs: &[String]) -> Result<Vec<ServicePortRequest>> {
    pairs
        .iter()
        .map(|pair| {
            let (port, target) = pair
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("Invalid --port value '{pair}': expected PORT:TARGET"))?;
            Ok(ServicePortRequest {
                port: port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid port '{port}'"))?,
                target_port: target
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid target port '{target}'"))?,
            })
        })
        .collect()
}

async fn list_services(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let services: Vec<ServiceResponse> = client.get("/services").await?;
    print_output(&services, ctx.format);
    Ok(())
}

async fn create_service(ctx: CommandContext, args: CreateServiceArgs) -> Result<()> {
    let client = ctx.client()?;

    let request = CreateServiceRequest {
        name: args.name,
        service_type: args.service_type,
        selector: parse_pairs(&args.selector, "selector")?,
        ports: parse_ports(&args.ports)?,
    };

    let service: ServiceResponse = client.post("/services", &request).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&service, ctx.format),
        OutputFormat::Table => {
            print_success(&format!(
                "Created service '{}' ({})",
                service.name,
                display_type(&service.spec)
            ));
        }
    }
    Ok(())
}

async fn get_service(ctx: CommandContext, args: ServiceRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let service: Value = client.get(&format!("/services/{}", args.name)).await?;
    print_single(&service, ctx.format);
    Ok(())
}

async fn delete_service(ctx: CommandContext, args: ServiceRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let _: Value = client.delete(&format!("/services/{}", args.name)).await?;
    print_success(&format!("Deleted service '{}'", args.name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ports_splits_on_colon() {
        let ports = parse_ports(&["8080:80".to_string(), "8443:443".to_string()]).unwrap();
        assert_eq!(ports[0].port, 8080);
        assert_eq!(ports[0].target_port, 80);
        assert_eq!(ports[1].port, 8443);
    }

    #[test]
    fn parse_ports_rejects_non_numeric() {
        assert!(parse_ports(&["http:80".to_string()]).is_err());
    }
}
