//! SSH key commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::api::SshKey;
use crate::output::{print_success, OutputFormat};

use super::{resolve, CommandContext};

/// SSH key commands.
#[derive(Debug, Args)]
pub struct SshKeysCommand {
    #[command(subcommand)]
    command: SshKeysSubcommand,
}

#[derive(Debug, Subcommand)]
enum SshKeysSubcommand {
    /// List SSH keys.
    List,

    /// Upload a public key.
    Create(CreateSshKeyArgs),

    /// Delete an SSH key.
    Delete(SshKeyRefArgs),
}

#[derive(Debug, Args)]
struct CreateSshKeyArgs {
    /// Key name.
    #[arg(long)]
    name: String,

    /// Public key in OpenSSH format.
    #[arg(long)]
    public_key: String,
}

#[derive(Debug, Args)]
struct SshKeyRefArgs {
    /// Key ID, name or fingerprint.
    key: String,
}

#[derive(Debug, Serialize)]
struct CreateSshKeyRequest {
    name: String,
    public_key: String,
}

impl SshKeysCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            SshKeysSubcommand::List => list_keys(ctx).await,
            SshKeysSubcommand::Create(args) => create_key(ctx, args).await,
            SshKeysSubcommand::Delete(args) => delete_key(ctx, args).await,
        }
    }
}

async fn list_keys(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let keys: Vec<SshKey> = client.list("/v1/ssh_keys").await?;

    ctx.presenter().print_all(&keys)?;
    Ok(())
}

async fn create_key(ctx: CommandContext, args: CreateSshKeyArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = CreateSshKeyRequest {
        name: args.name,
        public_key: args.public_key.trim().to_string(),
    };
    let key = ctx.idempotency_key("ssh_keys.create", "/v1/ssh_keys", &request)?;
    let created: SshKey = client
        .post_with_idempotency_key("/v1/ssh_keys", &request, Some(key.as_str()))
        .await?;

    ctx.presenter().print_one(&created)?;
    Ok(())
}

async fn delete_key(ctx: CommandContext, args: SshKeyRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let keys: Vec<SshKey> = client.list("/v1/ssh_keys").await?;
    let key = resolve(&keys, &args.key)?;

    let path = format!("/v1/ssh_keys/{}", key.id);
    let idempotency_key = ctx.idempotency_key_no_body("ssh_keys.delete", &path);
    client
        .delete_with_idempotency_key(&path, Some(idempotency_key.as_str()))
        .await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!("Deleted SSH key {}", key)),
        _ => ctx
            .presenter()
            .print_value(&serde_json::json!({ "deleted": key.id }))?,
    }
    Ok(())
}
