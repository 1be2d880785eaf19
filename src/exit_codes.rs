//! Exit code standardization for costguard
//!
//! Provides consistent exit codes so CI pipelines and wrapper scripts can
//! tell a declined apply apart from a broken plan or a missing binary.
//!
//! ## Exit Code Convention
//!
//! - `0` = Success (estimate printed, or apply approved)
//! - `1` = User error (invalid input, unparseable plan)
//! - `2` = System error (I/O failure, terraform failure, unreadable prompt)
//! - `3` = Configuration error (config parse error, invalid config value)
//! - `4` = Apply declined at the confirmation prompt

use crate::error::CostGuardError;

/// Standard exit codes for costguard
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid input, validation failure)
    pub const USER_ERROR: i32 = 1;
    /// System error (I/O, terraform)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error
    pub const CONFIG_ERROR: i32 = 3;
    /// The user answered no at the confirmation prompt
    pub const DECLINED: i32 = 4;
}

/// Map a CostGuardError to an appropriate exit code
pub fn exit_code_for_error(error: &CostGuardError) -> i32 {
    use CostGuardError::*;
    match error {
        // Configuration errors
        Config(_) => codes::CONFIG_ERROR,

        // User errors (invalid input, broken plan documents)
        Validation { .. } => codes::USER_ERROR,
        Parse { .. } => codes::USER_ERROR,

        // System errors
        Io(_) => codes::SYSTEM_ERROR,
        Terraform { .. } => codes::SYSTEM_ERROR,
        Prompt(_) => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error surfaced at the CLI boundary
///
/// Falls back to `SYSTEM_ERROR` when the chain holds no `CostGuardError`.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<CostGuardError>())
        .map(exit_code_for_error)
        .unwrap_or(codes::SYSTEM_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for_error(&CostGuardError::Config(ConfigError::MissingField(
                "terraform.binary".to_string()
            ))),
            codes::CONFIG_ERROR
        );
        assert_eq!(
            exit_code_for_error(&CostGuardError::Validation {
                field: "threshold".to_string(),
                reason: "negative".to_string(),
            }),
            codes::USER_ERROR
        );
        assert_eq!(
            exit_code_for_error(&CostGuardError::Terraform {
                command: "terraform plan".to_string(),
                message: "exited with code Some(1)".to_string(),
            }),
            codes::SYSTEM_ERROR
        );
        assert_ne!(codes::DECLINED, codes::SUCCESS);
    }

    #[test]
    fn test_exit_code_through_anyhow_context() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let result: std::result::Result<(), CostGuardError> =
            Err(CostGuardError::parse("plan.json", parse_err));
        let err = result.context("Failed to load plan").unwrap_err();
        assert_eq!(exit_code_for_anyhow(&err), codes::USER_ERROR);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for_anyhow(&plain), codes::SYSTEM_ERROR);
    }
}
