//! Floating IP commands.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::api::{FloatingIp, Server};
use crate::order::OrderAccepted;
use crate::output::{print_success, OutputFormat};

use super::{print_accepted, provisioned_id, resolve, wait_for_order, CommandContext};

/// Floating IP commands.
#[derive(Debug, Args)]
pub struct IpsCommand {
    #[command(subcommand)]
    command: IpsSubcommand,
}

#[derive(Debug, Subcommand)]
enum IpsSubcommand {
    /// List floating IPs.
    List,

    /// Order a new floating IP.
    Create(CreateIpArgs),

    /// Route a floating IP to a server.
    Attach(AttachIpArgs),

    /// Detach a floating IP from its server.
    Detach(IpRefArgs),

    /// Release a floating IP.
    Delete(IpRefArgs),
}

#[derive(Debug, Args)]
struct CreateIpArgs {
    /// Region slug (e.g. fra1).
    #[arg(long)]
    region: String,

    /// Return as soon as the order is accepted.
    #[arg(long)]
    no_wait: bool,

    /// Give up waiting after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Debug, Args)]
struct AttachIpArgs {
    /// IP ID or address.
    ip: String,

    /// Server ID, name or IP address.
    server: String,
}

#[derive(Debug, Args)]
struct IpRefArgs {
    /// IP ID or address.
    ip: String,
}

#[derive(Debug, Serialize)]
struct CreateIpRequest {
    region: String,
}

#[derive(Debug, Serialize)]
struct AttachIpRequest {
    server_id: u64,
}

impl IpsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            IpsSubcommand::List => list_ips(ctx).await,
            IpsSubcommand::Create(args) => create_ip(ctx, args).await,
            IpsSubcommand::Attach(args) => attach_ip(ctx, args).await,
            IpsSubcommand::Detach(args) => detach_ip(ctx, args).await,
            IpsSubcommand::Delete(args) => delete_ip(ctx, args).await,
        }
    }
}

async fn list_ips(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let ips: Vec<FloatingIp> = client.list("/v1/ips").await?;

    ctx.presenter().print_all(&ips)?;
    Ok(())
}

async fn create_ip(ctx: CommandContext, args: CreateIpArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = CreateIpRequest {
        region: args.region.clone(),
    };
    let key = ctx.idempotency_key("ips.create", "/v1/ips", &request)?;
    let accepted: OrderAccepted = client
        .post_with_idempotency_key("/v1/ips", &request, Some(key.as_str()))
        .await?;

    if args.no_wait {
        return print_accepted(&ctx, accepted.ordering);
    }

    let order = wait_for_order(
        &client,
        accepted.ordering,
        format!("Creating floating IP in {}", args.region),
        args.timeout.map(Duration::from_secs),
    )
    .await?;
    let ip_id = provisioned_id(&order)?;
    let ip: FloatingIp = client.get(&format!("/v1/ips/{ip_id}")).await?;

    ctx.presenter().print_one(&ip)?;
    Ok(())
}

async fn attach_ip(ctx: CommandContext, args: AttachIpArgs) -> Result<()> {
    let client = ctx.client()?;
    let ips: Vec<FloatingIp> = client.list("/v1/ips").await?;
    let ip = resolve(&ips, &args.ip)?;
    let servers: Vec<Server> = client.list("/v1/servers").await?;
    let server = resolve(&servers, &args.server)?;

    let path = format!("/v1/ips/{}/attach", ip.id);
    let request = AttachIpRequest {
        server_id: server.id,
    };
    let key = ctx.idempotency_key("ips.attach", &path, &request)?;
    let attached: FloatingIp = client
        .post_with_idempotency_key(&path, &request, Some(key.as_str()))
        .await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!("Attached {} to server {}", ip, server)),
        _ => ctx.presenter().print_one(&attached)?,
    }
    Ok(())
}

async fn detach_ip(ctx: CommandContext, args: IpRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let ips: Vec<FloatingIp> = client.list("/v1/ips").await?;
    let ip = resolve(&ips, &args.ip)?;

    let path = format!("/v1/ips/{}/detach", ip.id);
    let body = serde_json::json!({});
    let key = ctx.idempotency_key("ips.detach", &path, &body)?;
    let detached: FloatingIp = client
        .post_with_idempotency_key(&path, &body, Some(key.as_str()))
        .await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!("Detached {}", ip)),
        _ => ctx.presenter().print_one(&detached)?,
    }
    Ok(())
}

async fn delete_ip(ctx: CommandContext, args: IpRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let ips: Vec<FloatingIp> = client.list("/v1/ips").await?;
    let ip = resolve(&ips, &args.ip)?;

    let path = format!("/v1/ips/{}", ip.id);
    let key = ctx.idempotency_key_no_body("ips.delete", &path);
    client.delete_with_idempotency_key(&path, Some(key.as_str())).await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!("Released {}", ip)),
        _ => ctx
            .presenter()
            .print_value(&serde_json::json!({ "deleted": ip.id }))?,
    }
    Ok(())
}
