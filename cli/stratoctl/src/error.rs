//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not authenticated. Run `strato auth login` to authenticate.")]
    NotAuthenticated,

    #[error("API error: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// No entity of the listed kind matched the term.
    #[error("No {kind} found matching '{term}'")]
    NoMatch { kind: &'static str, term: String },

    /// Several entities matched and none of them exactly.
    #[error("'{term}' matches more than one {kind}: {sample}")]
    Ambiguous {
        kind: &'static str,
        term: String,
        sample: String,
    },

    /// A value handed to the presenter has no tabular shape.
    #[error("Cannot render value of type {0} as a table")]
    UnsupportedType(String),

    /// The platform reported that provisioning failed.
    #[error("Order {order_id} failed")]
    OrderFailed { order_id: u64 },

    #[error("Wait for order canceled")]
    Canceled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an API error from response details.
    pub fn api(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
            request_id,
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        if let Some(hint) = hint(cli_err) {
            eprintln!("\n{}", hint.yellow());
        }
        if let CliError::Api {
            request_id: Some(request_id),
            ..
        } = cli_err
        {
            eprintln!("\nRequest ID: {}", request_id);
        }
    }
}

fn hint(err: &CliError) -> Option<&'static str> {
    match err {
        CliError::NotAuthenticated => Some("Hint: Run `strato auth login` to authenticate."),
        CliError::Api { status: 401, .. } => {
            Some("Hint: Your session may have expired. Run `strato auth login`.")
        }
        CliError::Api { status: 403, .. } => {
            Some("Hint: You may not have permission for this operation.")
        }
        CliError::Network(_) => Some("Hint: Check your network connection and API endpoint."),
        CliError::NoMatch { .. } => Some("Hint: Use the `list` command to see what exists."),
        CliError::Ambiguous { .. } => {
            Some("Hint: Use a longer name, the full IP address or the numeric ID.")
        }
        CliError::OrderFailed { .. } => {
            Some("Hint: The platform could not provision the resource. Check `strato orders get`.")
        }
        CliError::Canceled => Some(
            "Hint: Could not determine the order status. It may still complete; check `strato orders get`.",
        ),
        _ => None,
    }
}
