//! Cost summary rendering and apply confirmation

use crate::error::{CostGuardError, Result};
use crate::estimator::EstimationResult;
use crate::plan::Plan;
use crate::pricing::{PriceCatalog, PriceFamily, RateUnit};
use crate::utils::{format_cost, format_signed_cost, hourly_to_monthly, is_significant};
use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, Table};
use console::style;
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::debug;

/// Outcome of the confirmation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Change is at or below the configured threshold, no prompt shown
    WithinThreshold,
    Approved,
    Declined,
}

impl Decision {
    pub fn proceed(&self) -> bool {
        !matches!(self, Decision::Declined)
    }
}

/// JSON document printed with `--output json`
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub format_version: &'a str,
    pub terraform_version: &'a str,
    #[serde(flatten)]
    pub result: &'a EstimationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

impl<'a> JsonReport<'a> {
    pub fn new(plan: &'a Plan, result: &'a EstimationResult) -> Self {
        Self {
            generated_at: Utc::now(),
            format_version: &plan.format_version,
            terraform_version: &plan.terraform_version,
            result,
            decision: None,
        }
    }

    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Summary block: counts, signed total, unsupported types
pub fn render_summary(result: &EstimationResult) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push('\n');
    out.push_str(&rule);
    out.push_str("\n                    COST ESTIMATE SUMMARY\n");
    out.push_str(&rule);
    out.push_str("\n\n");

    out.push_str(&format!(
        "  Resources to be created:   {}\n",
        result.created_resources
    ));
    out.push_str(&format!(
        "  Resources to be destroyed: {}\n",
        result.destroyed_resources
    ));
    out.push_str(&format!(
        "  Resources to be updated:   {}\n",
        result.updated_resources
    ));

    out.push('\n');
    out.push_str(&"-".repeat(60));
    out.push_str("\n\n");

    let change = result.total_monthly_change;
    let line = if !is_significant(change) {
        style("No significant cost change".to_string()).blue().bold()
    } else if change > 0.0 {
        style(format!(
            "Estimated Monthly Cost Increase: {}",
            format_signed_cost(change)
        ))
        .yellow()
        .bold()
    } else {
        style(format!(
            "Estimated Monthly Cost Savings: {}",
            format_signed_cost(change)
        ))
        .green()
        .bold()
    };
    out.push_str(&format!("  {}\n", line));

    if !result.unsupported_types.is_empty() {
        out.push_str("\n  Note: The following resource types are not yet supported\n");
        out.push_str("  for cost estimation (estimated as $0):\n");
        for t in &result.unsupported_types {
            out.push_str(&format!("    - {}\n", t));
        }
    }

    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    out
}

/// Per-resource breakdown table
pub fn render_breakdown(result: &EstimationResult) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Resource", "Type", "Action", "Monthly", "Details"]);

    for est in &result.estimates {
        let amount = Cell::new(format_signed_cost(est.monthly_cost))
            .set_alignment(CellAlignment::Right);
        let amount = if !is_significant(est.monthly_cost) {
            amount
        } else if est.monthly_cost > 0.0 {
            amount.fg(Color::Yellow)
        } else {
            amount.fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&est.resource_address),
            Cell::new(&est.resource_type),
            Cell::new(&est.action),
            amount,
            Cell::new(&est.details),
        ]);
    }

    table.to_string()
}

/// Price table for one family, or all of them
pub fn render_prices(catalog: &PriceCatalog, family: Option<PriceFamily>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Family", "Class", "Rate", "Monthly (730h)"]);

    for (fam, rates) in catalog.families() {
        if family.is_some_and(|f| f != fam) {
            continue;
        }
        for (class, rate) in rates.iter() {
            let (rate_cell, monthly_cell) = match fam.unit() {
                RateUnit::Hour => (
                    format!("${:.4}/h", rate),
                    format_cost(hourly_to_monthly(rate)),
                ),
                RateUnit::GbMonth => (format!("${:.4}/GB-mo", rate), "-".to_string()),
            };
            let class_cell = if class == fam.fallback_class() {
                format!("{} (default)", class)
            } else {
                class.to_string()
            };
            table.add_row(vec![
                Cell::new(fam.as_str()),
                Cell::new(class_cell),
                Cell::new(rate_cell).set_alignment(CellAlignment::Right),
                Cell::new(monthly_cell).set_alignment(CellAlignment::Right),
            ]);
        }
    }

    table.to_string()
}

pub fn confirm_message(monthly_change: f64) -> String {
    let message = if !is_significant(monthly_change) {
        style("No significant cost change detected. Proceed? [y/N]".to_string())
            .blue()
            .bold()
    } else if monthly_change > 0.0 {
        style(format!(
            "Hey, these changes will cost an additional {}/month. Proceed? [y/N]",
            format_cost(monthly_change)
        ))
        .yellow()
        .bold()
    } else {
        style(format!(
            "These changes will save {}/month. Proceed? [y/N]",
            format_cost(monthly_change)
        ))
        .green()
        .bold()
    };
    format!("\n{} ", message)
}

/// Ask whether to proceed; only `y` or `yes` (any case) approves
pub fn confirm_apply<R: BufRead, W: Write>(
    monthly_change: f64,
    input: &mut R,
    output: &mut W,
) -> Result<Decision> {
    write!(output, "{}", confirm_message(monthly_change))?;
    output.flush()?;

    let mut response = String::new();
    let read = input
        .read_line(&mut response)
        .map_err(|e| CostGuardError::Prompt(e.to_string()))?;
    if read == 0 {
        return Err(CostGuardError::Prompt(
            "no input (stdin closed); pass --yes to approve non-interactively".to_string(),
        ));
    }

    let response = response.trim().to_lowercase();
    debug!("Confirmation response: {:?}", response);
    if response == "y" || response == "yes" {
        Ok(Decision::Approved)
    } else {
        Ok(Decision::Declined)
    }
}

/// Skip the prompt when the change doesn't exceed `threshold`
pub fn confirm_with_threshold<R: BufRead, W: Write>(
    monthly_change: f64,
    threshold: f64,
    input: &mut R,
    output: &mut W,
) -> Result<Decision> {
    if monthly_change <= threshold {
        writeln!(
            output,
            "{}",
            style(format!(
                "Cost change ({}/month) is within threshold ({}/month). Proceeding...",
                format_signed_cost(monthly_change),
                format_cost(threshold)
            ))
            .green()
            .bold()
        )?;
        return Ok(Decision::WithinThreshold);
    }

    confirm_apply(monthly_change, input, output)
}
