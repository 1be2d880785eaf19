//! Terraform plan JSON model
//!
//! Mirrors the parts of `terraform show -json <planfile>` that costguard
//! reads. Unknown fields are ignored so newer plan formats still decode.

use crate::attributes::Attributes;
use crate::error::{CostGuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub terraform_version: String,
    #[serde(default)]
    pub planned_values: PlannedValues,
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_state: Option<State>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedValues {
    #[serde(default)]
    pub root_module: Module,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_modules: Vec<Module>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub address: String,
    #[serde(default)]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub values: Option<Attributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(default)]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub change: Change,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub before: Option<Attributes>,
    #[serde(default)]
    pub after: Option<Attributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub values: StateValues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    #[serde(default)]
    pub root_module: Module,
}

impl Change {
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Actions joined with `+`, e.g. `delete+create` for a replacement
    pub fn action_label(&self) -> String {
        self.actions.join("+")
    }
}

impl ResourceChange {
    pub fn is_replace(&self) -> bool {
        self.change.has_action("create") && self.change.has_action("delete")
    }
}

impl Module {
    /// All resources in this module and its descendants, depth first
    pub fn all_resources(&self) -> Vec<&Resource> {
        let mut out: Vec<&Resource> = self.resources.iter().collect();
        for child in &self.child_modules {
            out.extend(child.all_resources());
        }
        out
    }
}

impl Plan {
    pub fn resource_changes(&self) -> &[ResourceChange] {
        &self.resource_changes
    }

    /// Resources with a `create` action (including replacements)
    pub fn created_resources(&self) -> Vec<&ResourceChange> {
        self.with_action("create")
    }

    /// Resources with a `delete` action (including replacements)
    pub fn destroyed_resources(&self) -> Vec<&ResourceChange> {
        self.with_action("delete")
    }

    /// Resources updated in place
    pub fn updated_resources(&self) -> Vec<&ResourceChange> {
        self.with_action("update")
    }

    /// Resources destroyed and re-created
    pub fn replaced_resources(&self) -> Vec<&ResourceChange> {
        self.resource_changes
            .iter()
            .filter(|rc| rc.is_replace())
            .collect()
    }

    fn with_action(&self, action: &str) -> Vec<&ResourceChange> {
        self.resource_changes
            .iter()
            .filter(|rc| rc.change.has_action(action))
            .collect()
    }
}

/// Parse plan JSON from bytes
pub fn parse_plan_json(data: &[u8]) -> Result<Plan> {
    let plan: Plan = serde_json::from_slice(data)
        .map_err(|e| CostGuardError::parse("invalid plan document", e))?;
    debug!(
        "Parsed plan (format {}, terraform {}): {} resource changes",
        plan.format_version,
        plan.terraform_version,
        plan.resource_changes.len()
    );
    Ok(plan)
}

/// Read and parse a plan JSON file
pub fn parse_plan_file(path: &Path) -> Result<Plan> {
    let data = std::fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| CostGuardError::parse(path.display().to_string(), e))
}

/// Whether `data` looks like a JSON document rather than a binary plan file
pub fn looks_like_json(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'{')
        .unwrap_or(false)
}
