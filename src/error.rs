//! Error types for costguard
//!
//! There are two error types: `CostGuardError` (main error enum) and
//! `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `CostGuardError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling. The conversion
//! happens at the CLI boundary, where `exit_codes` maps the concrete variant to a
//! process exit code.
//!
//! The estimation engine itself has no error path: unknown resource types,
//! missing attributes and unpriced classes all degrade to fallback prices and an
//! "unsupported" marker on the result. Errors only come from the edges, i.e.
//! reading and decoding plans, running `terraform`, loading config and reading
//! the confirmation answer.
//!
//! ## When to Use Which Error
//!
//! - `ConfigError`: Configuration parsing and validation issues
//!   - Automatically converted to `CostGuardError::Config` via `#[from]`
//!
//! - `Parse`: A plan document could not be decoded
//!   - Carries the underlying `serde_json` error as its source
//!
//! - `Terraform`: The `terraform` binary is missing or exited non-zero
//!
//! - `Validation`: Input validation failures (threshold, paths, override rates)
//!
//! - `Prompt`: The confirmation answer could not be read (stdin closed)

use thiserror::Error;

/// Main error type for costguard
#[derive(Error, Debug)]
pub enum CostGuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to parse plan JSON: {context}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terraform error: `{command}` - {message}")]
    Terraform { command: String, message: String },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Failed to read response: {0}")]
    Prompt(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CostGuardError>;

impl CostGuardError {
    /// Wrap a JSON decoding failure with a short description of what was being parsed
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        CostGuardError::Parse {
            context: context.into(),
            source,
        }
    }
}
