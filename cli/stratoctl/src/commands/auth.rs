//! Authentication commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::output::{print_info, print_success, OutputFormat};

use super::CommandContext;

/// Authentication commands.
#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Log in with an API token.
    Login(LoginArgs),

    /// Log out from the platform.
    Logout,

    /// Show current authentication status.
    Status,
}

#[derive(Debug, Args)]
struct LoginArgs {
    /// API token.
    #[arg(long, env = "STRATO_TOKEN")]
    token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct AccountResponse {
    email: String,
    #[serde(default)]
    token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AuthCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AuthSubcommand::Login(args) => login(ctx, args).await,
            AuthSubcommand::Logout => logout(ctx).await,
            AuthSubcommand::Status => status(ctx).await,
        }
    }
}

/// Log in to the platform.
async fn login(ctx: CommandContext, args: LoginArgs) -> Result<()> {
    let Some(token) = args.token else {
        print_info("Create a token in the web console, then run:");
        print_info("strato auth login --token <TOKEN> (or set STRATO_TOKEN)");
        return Ok(());
    };

    let mut creds = Credentials::new(token);

    // Validate token and fetch the account it belongs to.
    let client = crate::client::ApiClient::new(&ctx.config, Some(&creds))?;
    let account: AccountResponse = client.get("/v1/account").await?;
    creds.email = Some(account.email);
    creds.expires_at = account.token_expires_at;

    creds.save()?;

    print_success("Logged in successfully.");
    Ok(())
}

/// Log out from the platform.
async fn logout(_ctx: CommandContext) -> Result<()> {
    Credentials::delete()?;
    print_success("Logged out successfully.");
    Ok(())
}

/// Show authentication status.
async fn status(ctx: CommandContext) -> Result<()> {
    if ctx.format != OutputFormat::Table {
        let view = serde_json::json!({
            "authenticated": ctx.credentials.is_some(),
            "email": ctx.credentials.as_ref().and_then(|c| c.email.clone()),
            "expired": ctx.credentials.as_ref().map(Credentials::is_expired),
        });
        ctx.presenter().print_value(&view)?;
        return Ok(());
    }

    match ctx.credentials {
        Some(creds) => {
            println!("{} Authenticated", "Status:".green().bold());

            if let Some(email) = &creds.email {
                println!("  Email: {}", email);
            }

            if creds.is_expired() {
                println!(
                    "  {} Token has expired. Run `strato auth login`.",
                    "Warning:".yellow()
                );
            } else if let Some(expires_at) = creds.expires_at {
                println!("  Expires: {}", expires_at);
            }
        }
        None => {
            println!("{} Not authenticated", "Status:".red().bold());
            println!("\nRun {} to log in.", "strato auth login".cyan());
        }
    }

    Ok(())
}
