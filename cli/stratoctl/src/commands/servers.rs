//! Server commands.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::api::{Server, SshKey};
use crate::order::OrderAccepted;
use crate::output::{print_success, OutputFormat};

use super::{print_accepted, provisioned_id, resolve, wait_for_order, CommandContext};

/// Server commands.
#[derive(Debug, Args)]
pub struct ServersCommand {
    #[command(subcommand)]
    command: ServersSubcommand,
}

#[derive(Debug, Subcommand)]
enum ServersSubcommand {
    /// List servers.
    List,

    /// Show one server.
    Get(ServerRefArgs),

    /// Order a new server and wait until it is provisioned.
    Create(CreateServerArgs),

    /// Rename a server.
    Rename(RenameServerArgs),

    /// Delete a server.
    Delete(ServerRefArgs),
}

#[derive(Debug, Args)]
struct ServerRefArgs {
    /// Server ID, name or IP address (or a unique part of one).
    server: String,
}

#[derive(Debug, Args)]
struct CreateServerArgs {
    /// Server name.
    #[arg(long)]
    name: String,

    /// Plan slug (e.g. s-1).
    #[arg(long)]
    plan: String,

    /// Region slug (e.g. fra1).
    #[arg(long)]
    region: String,

    /// Image slug.
    #[arg(long, default_value = "debian-12")]
    image: String,

    /// SSH key to install (ID, name or fingerprint). Repeatable.
    #[arg(long = "ssh-key")]
    ssh_keys: Vec<String>,

    /// Tag to attach. Repeatable.
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Return as soon as the order is accepted.
    #[arg(long)]
    no_wait: bool,

    /// Give up waiting after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Debug, Args)]
struct RenameServerArgs {
    /// Server ID, name or IP address.
    server: String,

    /// New name.
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateServerRequest {
    name: String,
    plan: String,
    region: String,
    image: String,
    ssh_key_ids: Vec<u64>,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RenameServerRequest {
    name: String,
}

impl ServersCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ServersSubcommand::List => list_servers(ctx).await,
            ServersSubcommand::Get(args) => get_server(ctx, args).await,
            ServersSubcommand::Create(args) => create_server(ctx, args).await,
            ServersSubcommand::Rename(args) => rename_server(ctx, args).await,
            ServersSubcommand::Delete(args) => delete_server(ctx, args).await,
        }
    }
}

async fn list_servers(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let servers: Vec<Server> = client.list("/v1/servers").await?;

    ctx.presenter().print_all(&servers)?;
    Ok(())
}

async fn get_server(ctx: CommandContext, args: ServerRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let servers: Vec<Server> = client.list("/v1/servers").await?;
    let server = resolve(&servers, &args.server)?;

    ctx.presenter().print_one(server)?;
    Ok(())
}

async fn create_server(ctx: CommandContext, args: CreateServerArgs) -> Result<()> {
    let client = ctx.client()?;

    let mut ssh_key_ids = Vec::with_capacity(args.ssh_keys.len());
    if !args.ssh_keys.is_empty() {
        let keys: Vec<SshKey> = client.list("/v1/ssh_keys").await?;
        for term in &args.ssh_keys {
            ssh_key_ids.push(resolve(&keys, term)?.id);
        }
    }

    let request = CreateServerRequest {
        name: args.name.clone(),
        plan: args.plan,
        region: args.region,
        image: args.image,
        ssh_key_ids,
        tags: args.tags,
    };
    let key = ctx.idempotency_key("servers.create", "/v1/servers", &request)?;
    let accepted: OrderAccepted = client
        .post_with_idempotency_key("/v1/servers", &request, Some(key.as_str()))
        .await?;

    if args.no_wait {
        return print_accepted(&ctx, accepted.ordering);
    }

    let order = wait_for_order(
        &client,
        accepted.ordering,
        format!("Creating server {}", args.name),
        args.timeout.map(Duration::from_secs),
    )
    .await?;
    let server_id = provisioned_id(&order)?;
    let server: Server = client.get(&format!("/v1/servers/{server_id}")).await?;

    ctx.presenter().print_one(&server)?;
    Ok(())
}

async fn rename_server(ctx: CommandContext, args: RenameServerArgs) -> Result<()> {
    let client = ctx.client()?;
    let servers: Vec<Server> = client.list("/v1/servers").await?;
    let server = resolve(&servers, &args.server)?;

    let path = format!("/v1/servers/{}", server.id);
    let request = RenameServerRequest { name: args.name };
    let key = ctx.idempotency_key("servers.rename", &path, &request)?;
    let renamed: Server = client
        .patch_with_idempotency_key(&path, &request, Some(key.as_str()))
        .await?;

    match ctx.format {
        OutputFormat::Table => {
            print_success(&format!("Renamed server {} to {}", server, renamed.name))
        }
        _ => ctx.presenter().print_one(&renamed)?,
    }
    Ok(())
}

async fn delete_server(ctx: CommandContext, args: ServerRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let servers: Vec<Server> = client.list("/v1/servers").await?;
    let server = resolve(&servers, &args.server)?;

    let path = format!("/v1/servers/{}", server.id);
    let key = ctx.idempotency_key_no_body("servers.delete", &path);
    client.delete_with_idempotency_key(&path, Some(key.as_str())).await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!("Deleted server {}", server)),
        _ => ctx
            .presenter()
            .print_value(&serde_json::json!({ "deleted": server.id }))?,
    }
    Ok(())
}
