//! CLI commands.

mod auth;
mod ips;
mod orders;
mod servers;
mod ssh_keys;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::client::ApiClient;
use crate::config::{Config, Credentials};
use crate::error::CliError;
use crate::idempotency::IdempotencyKey;
use crate::order::{Order, OrderWaiter, Ordering};
use crate::output::{OutputFormat, Presenter};
use crate::progress::Progress;
use crate::resolve::{find_one, Keyed};

/// Separator for CSV output when neither flag nor config sets one.
const DEFAULT_SEPARATOR: char = ',';

/// Exit status for an interrupt that nothing is waiting to handle.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// strato - manage servers, SSH keys and IPs on the Strato cloud.
#[derive(Debug, Parser)]
#[command(name = "strato")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Field separator for CSV output.
    #[arg(long, global = true)]
    separator: Option<char>,

    /// Show debug logs on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Idempotency key to use for write operations.
    ///
    /// If omitted, the CLI generates a deterministic key per request body.
    #[arg(long, global = true)]
    idempotency_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Authenticate with the platform.
    Auth(auth::AuthCommand),

    /// Manage servers.
    Servers(servers::ServersCommand),

    /// Manage SSH keys.
    #[command(name = "ssh-keys")]
    SshKeys(ssh_keys::SshKeysCommand),

    /// Manage floating IPs.
    Ips(ips::IpsCommand),

    /// Inspect and wait for provisioning orders.
    Orders(orders::OrdersCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let credentials = Credentials::load()?;

        let format = self.format.or(config.default_format).unwrap_or_default();
        let separator = self
            .separator
            .or(config.csv_separator)
            .unwrap_or(DEFAULT_SEPARATOR);
        let separator = u8::try_from(separator)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| anyhow::anyhow!("CSV separator must be an ASCII character"))?;

        let ctx = CommandContext {
            config,
            credentials,
            format,
            separator,
            idempotency_key: self.idempotency_key,
        };

        match self.command {
            Commands::Auth(cmd) => cmd.run(ctx).await,
            Commands::Servers(cmd) => cmd.run(ctx).await,
            Commands::SshKeys(cmd) => cmd.run(ctx).await,
            Commands::Ips(cmd) => cmd.run(ctx).await,
            Commands::Orders(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("strato {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// State for one command invocation.
pub struct CommandContext {
    pub config: Config,
    pub credentials: Option<Credentials>,
    pub format: OutputFormat,
    pub separator: u8,
    pub idempotency_key: Option<String>,
}

impl CommandContext {
    /// Get an authenticated API client.
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.config, self.credentials.as_ref())
    }

    /// Presenter writing to stdout in the selected format.
    pub fn presenter(&self) -> Presenter<std::io::Stdout> {
        Presenter::stdout(self.format, self.separator)
    }

    /// The `--idempotency-key` flag, or a key derived from the request.
    pub fn idempotency_key(
        &self,
        operation: &str,
        path: &str,
        body: &impl Serialize,
    ) -> Result<IdempotencyKey, CliError> {
        match &self.idempotency_key {
            Some(key) => Ok(IdempotencyKey::explicit(key.as_str())),
            None => IdempotencyKey::for_body(operation, path, body),
        }
    }

    /// Same as [`idempotency_key`](Self::idempotency_key), for bodyless requests.
    pub fn idempotency_key_no_body(&self, operation: &str, path: &str) -> IdempotencyKey {
        match &self.idempotency_key {
            Some(key) => IdempotencyKey::explicit(key.as_str()),
            None => IdempotencyKey::for_path(operation, path),
        }
    }
}

/// Resolve a user-typed term against a freshly fetched list.
fn resolve<'a, T: Keyed>(items: &'a [T], term: &str) -> Result<&'a T> {
    let term = term.trim();
    if term.is_empty() {
        anyhow::bail!("Empty {} reference", T::KIND);
    }
    Ok(find_one(items, term)?)
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// A running wait picked up the flag.
    Cancel,
    /// Second interrupt, or nothing left to cancel.
    Exit,
}

fn interrupt(flag: &watch::Sender<bool>) -> Interrupt {
    let already_raised = flag.send_replace(true);
    if already_raised || flag.receiver_count() == 0 {
        Interrupt::Exit
    } else {
        Interrupt::Cancel
    }
}

/// Cancellation flag raised by Ctrl+C or after `timeout`.
///
/// The first Ctrl+C lets the wait stop cleanly. Any later one, including one
/// after the wait has returned, exits with status 130.
fn cancel_signal(timeout: Option<Duration>) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);

    let tx_signal = Arc::clone(&tx);
    if let Err(e) = ctrlc::set_handler(move || {
        if interrupt(&tx_signal) == Interrupt::Exit {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }) {
        debug!(error = %e, "Could not install Ctrl+C handler");
    }

    if let Some(timeout) = timeout {
        spawn_timeout(tx, timeout);
    }

    rx
}

fn spawn_timeout(flag: Arc<watch::Sender<bool>>, timeout: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        debug!(timeout_secs = timeout.as_secs(), "Wait timed out");
        let _ = flag.send(true);
    });
}

/// Wait for an order with a progress line on stderr.
async fn wait_for_order(
    client: &ApiClient,
    ordering: Ordering,
    message: String,
    timeout: Option<Duration>,
) -> Result<Order, CliError> {
    OrderWaiter::new(client)
        .wait(ordering, Progress::stderr(message), cancel_signal(timeout))
        .await
}

/// ID of the resource a completed order provisioned.
fn provisioned_id(order: &Order) -> Result<u64> {
    order
        .resource_id
        .with_context(|| format!("Order {} completed without a resource", order.id))
}

/// Report an order accepted with `--no-wait`.
fn print_accepted(ctx: &CommandContext, ordering: Ordering) -> Result<()> {
    let order_id = ordering.order_id();
    match ctx.format {
        OutputFormat::Table => crate::output::print_info(&format!(
            "Order {order_id} accepted. Run `strato orders wait {order_id}` to follow it."
        )),
        _ => ctx
            .presenter()
            .print_value(&serde_json::json!({ "order_id": order_id }))?,
    }
    Ok(())
}
