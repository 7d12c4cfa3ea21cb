//! Waiting on asynchronous provisioning orders.
//!
//! Create calls for servers and IPs answer with an ordering reference instead
//! of the resource. The order moves `created → processing → completed|failed`;
//! once completed it names the provisioned resource, which the caller then
//! fetches itself.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::error::CliError;
use crate::progress::{Outcome, Progress, DEFAULT_TICK};
use crate::resolve::Keyed;
use crate::table::Tabular;

/// Time between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reference to a pending order, as returned by a create call.
///
/// Accepts a bare order ID, an API path such as `/v1/orders/42`, or an absolute
/// URL ending in `/orders/42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Ordering {
    order_id: u64,
}

impl Ordering {
    pub fn new(order_id: u64) -> Self {
        Self { order_id }
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }
}

impl FromStr for Ordering {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('/');
        let id = match s.rsplit_once('/') {
            None => s,
            Some((prefix, id)) if prefix.ends_with("/orders") || prefix == "orders" => id,
            Some(_) => "",
        };
        id.parse::<u64>()
            .map(Self::new)
            .map_err(|_| CliError::Other(anyhow::anyhow!("Invalid order reference '{}'", s)))
    }
}

impl TryFrom<String> for Ordering {
    type Error = CliError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Body of a `202 Accepted` answer to a create call.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAccepted {
    pub ordering: Ordering,
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Processing,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// Order as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub status: OrderStatus,
    /// ID of the provisioned resource, set once the order completes.
    #[serde(default)]
    pub resource_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order {} ({})", self.id, self.status)
    }
}

impl Keyed for Order {
    const KIND: &'static str = "order";

    fn keys(&self) -> Vec<String> {
        vec![self.id.to_string()]
    }
}

impl Tabular for Order {
    fn columns(&self) -> &'static [&'static str] {
        &["id", "status", "resource", "created"]
    }

    fn value(&self, column: &str) -> Option<String> {
        Some(match column {
            "id" => self.id.to_string(),
            "status" => self.status.to_string(),
            "resource" => self.resource_id.map(|id| id.to_string()).unwrap_or_default(),
            "created" => self.created_at.clone().unwrap_or_default(),
            _ => return None,
        })
    }
}

/// Read access to order state.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn order(&self, order_id: u64) -> Result<Order, CliError>;
}

/// Polls an order until it completes or fails, with a progress indicator.
pub struct OrderWaiter<'a, S: ?Sized> {
    source: &'a S,
    interval: Duration,
    tick: Duration,
}

impl<'a, S: OrderSource + ?Sized> OrderWaiter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            interval: POLL_INTERVAL,
            tick: DEFAULT_TICK,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Animation tick of the progress indicator.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Wait for `ordering` to reach a terminal state.
    ///
    /// Returns the completed order, [`CliError::OrderFailed`] when the platform
    /// gave up on it, [`CliError::Canceled`] once `cancel` turns true, or the
    /// first API error unchanged. The progress line is final before this
    /// returns.
    pub async fn wait(
        &self,
        ordering: Ordering,
        progress: Progress,
        cancel: watch::Receiver<bool>,
    ) -> Result<Order, CliError> {
        let handle = progress.with_tick(self.tick).start();
        let result = self.poll(ordering.order_id(), cancel).await;
        let outcome = match &result {
            Ok(_) => Outcome::Completed,
            Err(CliError::OrderFailed { .. }) => Outcome::Failed,
            Err(_) => Outcome::Aborted,
        };
        handle.finish(outcome).await;
        result
    }

    async fn poll(
        &self,
        order_id: u64,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Order, CliError> {
        let mut polls = 0u32;
        loop {
            if *cancel.borrow_and_update() {
                return Err(CliError::Canceled);
            }

            let order = self.source.order(order_id).await?;
            polls += 1;
            debug!(order_id, status = %order.status, polls, "Polled order");

            if order.status.is_terminal() {
                return match order.status {
                    OrderStatus::Failed => Err(CliError::OrderFailed { order_id }),
                    _ => Ok(order),
                };
            }

            tokio::select! {
                _ = canceled(&mut cancel) => return Err(CliError::Canceled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Resolves once the flag is set. Never resolves if the sender is gone.
async fn canceled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
