//! `Idempotency-Key` values for write requests.
//!
//! Unless the operator passes `--idempotency-key`, a key is a digest of the
//! operation name, the target path and the JSON body. Paths of updates and
//! deletes carry the resolved resource ID, so retrying an interrupted call
//! reuses its key and the platform does not place a second order.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CliError;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const KEY_PREFIX: &str = "strato_";

/// Value of the `Idempotency-Key` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// The operator's own key, sent as-is.
    pub fn explicit(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for a write that sends `body` to `path`.
    pub fn for_body(operation: &str, path: &str, body: &impl Serialize) -> Result<Self, CliError> {
        let body = serde_json::to_vec(body).map_err(|e| {
            CliError::Other(anyhow::anyhow!("Failed to serialize request body: {}", e))
        })?;
        Ok(Self::digest(operation, path, &body))
    }

    /// Key for a bodyless write such as a delete.
    pub fn for_path(operation: &str, path: &str) -> Self {
        Self::digest(operation, path, &[])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(operation: &str, path: &str, body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_bytes());
        hasher.update(b"\n");
        hasher.update(path.as_bytes());
        hasher.update(b"\n");
        hasher.update(body);
        Self(format!("{}{:x}", KEY_PREFIX, hasher.finalize()))
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
