//! costguard library
//!
//! Estimates the monthly cost impact of a Terraform plan. The estimation
//! engine lives in [`estimator`] and [`pricing`]; the other modules load
//! plans, run terraform, and render the result.

pub mod attributes;
pub mod commands;
pub mod config;
pub mod error;
pub mod estimator;
pub mod exit_codes;
pub mod plan;
pub mod pricing;
pub mod report;
pub mod terraform;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use estimator::{CostEstimate, EstimationResult, Estimator};
pub use plan::{Plan, ResourceChange};
pub use pricing::{PriceCatalog, PriceFamily};
