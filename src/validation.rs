//! Input validation utilities
//!
//! Provides validation functions for user inputs to prevent
//! invalid data from causing runtime errors.

use crate::error::{CostGuardError, Result};
use std::path::Path;

/// Validate a cost threshold in USD/month
///
/// Thresholds must be finite and non-negative.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() {
        return Err(CostGuardError::Validation {
            field: "threshold".to_string(),
            reason: format!("Threshold must be a finite number, got: {}", threshold),
        });
    }

    if threshold < 0.0 {
        return Err(CostGuardError::Validation {
            field: "threshold".to_string(),
            reason: format!(
                "Threshold must be >= 0 (USD/month), got: {:.2}",
                threshold
            ),
        });
    }

    Ok(())
}

/// Validate a unit price supplied by the user
pub fn validate_rate(field: &str, rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(CostGuardError::Validation {
            field: field.to_string(),
            reason: format!("Rate must be a finite, non-negative number, got: {}", rate),
        });
    }
    Ok(())
}

/// Validate that a plan path points to an existing file
pub fn validate_plan_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CostGuardError::Validation {
            field: "plan".to_string(),
            reason: format!("Plan file does not exist: {}", path.display()),
        });
    }

    if !path.is_file() {
        return Err(CostGuardError::Validation {
            field: "plan".to_string(),
            reason: format!("Plan path is not a file: {}", path.display()),
        });
    }

    Ok(())
}
