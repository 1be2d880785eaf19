use crate::error::{ConfigError, Result};
use crate::pricing::{PriceCatalog, PriceOverrides};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCAL_CONFIG_FILE: &str = ".costguard.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub estimate: EstimateConfig,
    #[serde(default)]
    pub terraform: TerraformConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// Monthly increase (USD) below which changes are approved without asking
    pub threshold: Option<f64>,
    /// Print the per-resource table under the summary
    pub show_breakdown: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Name or path of the terraform binary
    pub binary: String,
    /// File `terraform plan -out` writes to, relative to the working directory
    pub plan_file: String,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Extra or replacement rates: family -> class -> rate
    #[serde(default)]
    pub overrides: PriceOverrides,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_string(),
            plan_file: "tfplan".to_string(),
            working_dir: None,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            expand_path(p)
        } else {
            // Try .costguard.toml in current dir, then ~/.config/costguard/config.toml
            let local = PathBuf::from(LOCAL_CONFIG_FILE);
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("costguard").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
            }
        };

        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                ConfigError::ParseError(format!(
                    "{}: {}\n  Tip: Run 'costguard init' to create a new config file",
                    config_path.display(),
                    e
                ))
            })?;
            config.validate()?;
            Ok(config)
        } else if path.is_some() {
            // An explicit --config must exist; only the search locations are optional
            Err(ConfigError::NotFound(format!(
                "{}\n  Tip: Run 'costguard init --path {}' to create it",
                config_path.display(),
                config_path.display()
            ))
            .into())
        } else {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.estimate.threshold {
            crate::validation::validate_threshold(threshold).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "estimate.threshold".to_string(),
                    reason: e.to_string(),
                }
            })?;
        }
        if self.terraform.binary.trim().is_empty() {
            return Err(ConfigError::MissingField("terraform.binary".to_string()).into());
        }
        if self.terraform.plan_file.trim().is_empty() {
            return Err(ConfigError::MissingField("terraform.plan_file".to_string()).into());
        }
        // Builds and drops a catalog so bad overrides surface at load time
        self.price_catalog()?;
        Ok(())
    }

    /// Price catalog with this config's overrides applied
    pub fn price_catalog(&self) -> Result<PriceCatalog> {
        if self.pricing.overrides.is_empty() {
            return Ok(PriceCatalog::new());
        }
        PriceCatalog::with_overrides(&self.pricing.overrides).map_err(|e| {
            ConfigError::InvalidValue {
                field: "pricing.overrides".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            reason: format!("failed to serialize: {}", e),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Expand a leading `~` in a user supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let mut config = Config::default();
    config.estimate.threshold = Some(0.0);
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
