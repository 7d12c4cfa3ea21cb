//! Order commands.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::ApiClient;
use crate::error::CliError;
use crate::order::{Order, Ordering};

use super::{wait_for_order, CommandContext};

/// Order commands.
#[derive(Debug, Args)]
pub struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Show the current state of an order.
    Get(OrderRefArgs),

    /// Wait until an order completes or fails.
    Wait(WaitOrderArgs),
}

#[derive(Debug, Args)]
struct OrderRefArgs {
    /// Order ID or `/v1/orders/<id>` reference.
    order: Ordering,
}

#[derive(Debug, Args)]
struct WaitOrderArgs {
    /// Order ID or `/v1/orders/<id>` reference.
    order: Ordering,

    /// Give up waiting after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

impl OrdersCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            OrdersSubcommand::Get(args) => get_order(ctx, args).await,
            OrdersSubcommand::Wait(args) => wait_order(ctx, args).await,
        }
    }
}

async fn fetch_order(client: &ApiClient, ordering: Ordering) -> Result<Order, CliError> {
    let order_id = ordering.order_id();
    client
        .get(&format!("/v1/orders/{order_id}"))
        .await
        .map_err(|e| match e {
            CliError::Api { status: 404, .. } => {
                CliError::NotFound(format!("Order {order_id} not found"))
            }
            other => other,
        })
}

async fn get_order(ctx: CommandContext, args: OrderRefArgs) -> Result<()> {
    let client = ctx.client()?;
    let order = fetch_order(&client, args.order).await?;

    ctx.presenter().print_one(&order)?;
    Ok(())
}

async fn wait_order(ctx: CommandContext, args: WaitOrderArgs) -> Result<()> {
    let client = ctx.client()?;
    // Surface a clean not-found before starting the progress line.
    fetch_order(&client, args.order).await?;

    let order = wait_for_order(
        &client,
        args.order,
        format!("Waiting for order {}", args.order.order_id()),
        args.timeout.map(Duration::from_secs),
    )
    .await?;

    ctx.presenter().print_one(&order)?;
    Ok(())
}
