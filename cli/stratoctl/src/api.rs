//! Resources returned by the platform API.
//!
//! Each resource lists the strings a user may type to address it ([`Keyed`])
//! and its table projection ([`Tabular`]). JSON output serializes the structs
//! as they are.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolve::Keyed;
use crate::table::Tabular;

/// Virtual server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub plan: String,
    pub region: String,
    #[serde(default)]
    pub public_ipv4: Option<String>,
    #[serde(default)]
    pub public_ipv6: Option<String>,
    pub vcpus: u32,
    pub memory_mb: u64,
    pub disk_gb: u64,
    #[serde(default)]
    pub disk_used_gb: Option<u64>,
    /// Monthly price in cents.
    #[serde(default)]
    pub price_monthly_cents: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

impl Keyed for Server {
    const KIND: &'static str = "server";

    fn keys(&self) -> Vec<String> {
        let mut keys = vec![self.id.to_string(), self.name.clone()];
        keys.extend(self.public_ipv4.iter().cloned());
        keys.extend(self.public_ipv6.iter().cloned());
        keys
    }
}

impl Tabular for Server {
    fn columns(&self) -> &'static [&'static str] {
        &[
            "id", "name", "status", "ipv4", "plan", "region", "disk", "price", "tags", "created",
        ]
    }

    fn value(&self, column: &str) -> Option<String> {
        Some(match column {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "status" => self.status.clone(),
            "ipv4" => self.public_ipv4.clone().unwrap_or_else(|| "-".to_string()),
            "plan" => self.plan.clone(),
            "region" => self.region.clone(),
            "disk" => match self.disk_used_gb {
                Some(used) => format!("{}/{} GB", used, self.disk_gb),
                None => format!("{} GB", self.disk_gb),
            },
            "price" => self
                .price_monthly_cents
                .map(format_price)
                .unwrap_or_else(|| "-".to_string()),
            "tags" => self.tags.join(","),
            "created" => self.created_at.clone(),
            _ => return None,
        })
    }
}

/// SSH public key stored on the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: u64,
    pub name: String,
    pub fingerprint: String,
    pub public_key: String,
    pub created_at: String,
}

impl fmt::Display for SshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.fingerprint)
    }
}

impl Keyed for SshKey {
    const KIND: &'static str = "SSH key";

    fn keys(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.fingerprint.clone(),
        ]
    }
}

impl Tabular for SshKey {
    fn columns(&self) -> &'static [&'static str] {
        &["id", "name", "fingerprint", "created"]
    }

    fn value(&self, column: &str) -> Option<String> {
        Some(match column {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "fingerprint" => self.fingerprint.clone(),
            "created" => self.created_at.clone(),
            _ => return None,
        })
    }
}

/// Floating IP address that can move between servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: u64,
    pub address: String,
    pub region: String,
    #[serde(default)]
    pub server_id: Option<u64>,
    #[serde(default)]
    pub reverse_dns: Option<String>,
    pub created_at: String,
}

impl fmt::Display for FloatingIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl Keyed for FloatingIp {
    const KIND: &'static str = "floating IP";

    fn keys(&self) -> Vec<String> {
        let mut keys = vec![self.id.to_string(), self.address.clone()];
        keys.extend(self.reverse_dns.iter().cloned());
        keys
    }
}

impl Tabular for FloatingIp {
    fn columns(&self) -> &'static [&'static str] {
        &["id", "address", "region", "server", "reverse_dns", "created"]
    }

    fn value(&self, column: &str) -> Option<String> {
        Some(match column {
            "id" => self.id.to_string(),
            "address" => self.address.clone(),
            "region" => self.region.clone(),
            "server" => self
                .server_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            "reverse_dns" => self.reverse_dns.clone().unwrap_or_default(),
            "created" => self.created_at.clone(),
            _ => return None,
        })
    }
}

fn format_price(cents: u64) -> String {
    format!("${}.{:02}/mo", cents / 100, cents % 100)
}
