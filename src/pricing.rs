//! Built-in price catalog
//!
//! Approximate us-east-1 (and equivalent GCP/Azure region) on-demand prices in
//! USD. Compute-like families are priced per hour, block storage per GB-month.
//! These tables are maintained by hand and are only meant to give an order of
//! magnitude for a plan, not a bill.
//!
//! Every family carries a fallback class that is guaranteed to be present in
//! its table. A lookup for a class the table doesn't know resolves to the
//! fallback rate, never to zero.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Average number of hours in a month (8760 / 12)
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Lambda duration price per GB-second
pub const LAMBDA_GB_SECOND_RATE: f64 = 0.0000166667;
/// Assumed invocations per month for a Lambda function
pub const LAMBDA_MONTHLY_INVOCATIONS: f64 = 1_000_000.0;
/// Assumed duration of one invocation, in milliseconds
pub const LAMBDA_INVOCATION_MS: f64 = 100.0;

/// Fargate price per vCPU-hour
pub const FARGATE_VCPU_HOUR_RATE: f64 = 0.04048;
/// Fargate price per GB-hour of memory
pub const FARGATE_GB_HOUR_RATE: f64 = 0.004445;
/// Default Fargate task shape (vCPU, memory GB)
pub const FARGATE_TASK_VCPU: f64 = 0.25;
pub const FARGATE_TASK_MEMORY_GB: f64 = 0.5;

/// Placeholder monthly cost for an S3 bucket with no known contents
pub const S3_BUCKET_MINIMUM: f64 = 0.023;

/// A priced resource family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFamily {
    Ec2,
    Rds,
    Ebs,
    LoadBalancer,
    NatGateway,
    Elasticache,
    Eks,
    GcpCompute,
    AzureVm,
}

/// Unit a family's rates are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    Hour,
    GbMonth,
}

impl PriceFamily {
    pub const ALL: [PriceFamily; 9] = [
        PriceFamily::Ec2,
        PriceFamily::Rds,
        PriceFamily::Ebs,
        PriceFamily::LoadBalancer,
        PriceFamily::NatGateway,
        PriceFamily::Elasticache,
        PriceFamily::Eks,
        PriceFamily::GcpCompute,
        PriceFamily::AzureVm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceFamily::Ec2 => "ec2",
            PriceFamily::Rds => "rds",
            PriceFamily::Ebs => "ebs",
            PriceFamily::LoadBalancer => "load_balancer",
            PriceFamily::NatGateway => "nat_gateway",
            PriceFamily::Elasticache => "elasticache",
            PriceFamily::Eks => "eks",
            PriceFamily::GcpCompute => "gcp_compute",
            PriceFamily::AzureVm => "azure_vm",
        }
    }

    pub fn unit(&self) -> RateUnit {
        match self {
            PriceFamily::Ebs => RateUnit::GbMonth,
            _ => RateUnit::Hour,
        }
    }

    /// Class used when a lookup misses, and as the default class of the family
    pub fn fallback_class(&self) -> &'static str {
        match self {
            PriceFamily::Ec2 => "t3.micro",
            PriceFamily::Rds => "db.t3.micro",
            PriceFamily::Ebs => "gp2",
            PriceFamily::LoadBalancer => "alb",
            PriceFamily::NatGateway => "standard",
            PriceFamily::Elasticache => "cache.t3.micro",
            PriceFamily::Eks => "standard",
            PriceFamily::GcpCompute => "e2-micro",
            PriceFamily::AzureVm => "Standard_B1s",
        }
    }
}

impl fmt::Display for PriceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PriceFamily::ALL
            .iter()
            .copied()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "pricing.overrides".to_string(),
                reason: format!(
                    "unknown price family '{}' (expected one of: {})",
                    s,
                    PriceFamily::ALL
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}

/// Rates for one family, keyed by size/class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    fallback: String,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    fn new(family: PriceFamily, entries: &[(&str, f64)]) -> Self {
        let rates: BTreeMap<String, f64> = entries
            .iter()
            .map(|(class, rate)| (class.to_string(), *rate))
            .collect();
        debug_assert!(rates.contains_key(family.fallback_class()));
        Self {
            fallback: family.fallback_class().to_string(),
            rates,
        }
    }

    pub fn get(&self, class: &str) -> Option<f64> {
        self.rates.get(class).copied()
    }

    pub fn fallback_rate(&self) -> f64 {
        self.rates.get(&self.fallback).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// User supplied rates merged over the built-in tables: family -> class -> rate
pub type PriceOverrides = BTreeMap<String, BTreeMap<String, f64>>;

/// Immutable price catalog shared by every estimate of one estimator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceCatalog {
    tables: BTreeMap<PriceFamily, RateTable>,
}

impl Default for PriceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceCatalog {
    /// Catalog with the built-in rates
    pub fn new() -> Self {
        let mut tables = BTreeMap::new();

        tables.insert(
            PriceFamily::Ec2,
            RateTable::new(
                PriceFamily::Ec2,
                &[
                    // General purpose
                    ("t3.nano", 0.0052),
                    ("t3.micro", 0.0104),
                    ("t3.small", 0.0208),
                    ("t3.medium", 0.0416),
                    ("t3.large", 0.0832),
                    ("t3.xlarge", 0.1664),
                    ("t3.2xlarge", 0.3328),
                    ("t3a.nano", 0.0047),
                    ("t3a.micro", 0.0094),
                    ("t3a.small", 0.0188),
                    ("t3a.medium", 0.0376),
                    ("t3a.large", 0.0752),
                    ("t3a.xlarge", 0.1504),
                    ("t3a.2xlarge", 0.3008),
                    ("m5.large", 0.096),
                    ("m5.xlarge", 0.192),
                    ("m5.2xlarge", 0.384),
                    ("m5.4xlarge", 0.768),
                    ("m5.8xlarge", 1.536),
                    ("m5.12xlarge", 2.304),
                    ("m5.16xlarge", 3.072),
                    ("m5.24xlarge", 4.608),
                    ("m6i.large", 0.096),
                    ("m6i.xlarge", 0.192),
                    ("m6i.2xlarge", 0.384),
                    ("m6i.4xlarge", 0.768),
                    // Compute optimized
                    ("c5.large", 0.085),
                    ("c5.xlarge", 0.17),
                    ("c5.2xlarge", 0.34),
                    ("c5.4xlarge", 0.68),
                    ("c5.9xlarge", 1.53),
                    ("c5.18xlarge", 3.06),
                    ("c6i.large", 0.085),
                    ("c6i.xlarge", 0.17),
                    ("c6i.2xlarge", 0.34),
                    // Memory optimized
                    ("r5.large", 0.126),
                    ("r5.xlarge", 0.252),
                    ("r5.2xlarge", 0.504),
                    ("r5.4xlarge", 1.008),
                    ("r5.8xlarge", 2.016),
                    ("r5.12xlarge", 3.024),
                    // GPU
                    ("p3.2xlarge", 3.06),
                    ("p3.8xlarge", 12.24),
                    ("p3.16xlarge", 24.48),
                    ("g4dn.xlarge", 0.526),
                    ("g4dn.2xlarge", 0.752),
                    ("g4dn.4xlarge", 1.204),
                ],
            ),
        );

        tables.insert(
            PriceFamily::Rds,
            RateTable::new(
                PriceFamily::Rds,
                &[
                    ("db.t3.micro", 0.017),
                    ("db.t3.small", 0.034),
                    ("db.t3.medium", 0.068),
                    ("db.t3.large", 0.136),
                    ("db.t3.xlarge", 0.272),
                    ("db.t3.2xlarge", 0.544),
                    ("db.m5.large", 0.171),
                    ("db.m5.xlarge", 0.342),
                    ("db.m5.2xlarge", 0.684),
                    ("db.m5.4xlarge", 1.368),
                    ("db.r5.large", 0.24),
                    ("db.r5.xlarge", 0.48),
                    ("db.r5.2xlarge", 0.96),
                    ("db.r5.4xlarge", 1.92),
                ],
            ),
        );

        // per GB-month
        tables.insert(
            PriceFamily::Ebs,
            RateTable::new(
                PriceFamily::Ebs,
                &[
                    ("gp2", 0.10),
                    ("gp3", 0.08),
                    ("io1", 0.125),
                    ("io2", 0.125),
                    ("st1", 0.045),
                    ("sc1", 0.015),
                    ("standard", 0.05),
                ],
            ),
        );

        // Base hourly charge only, LCU/NLCU usage is not estimated
        tables.insert(
            PriceFamily::LoadBalancer,
            RateTable::new(
                PriceFamily::LoadBalancer,
                &[("alb", 0.0225), ("nlb", 0.0225), ("classic", 0.025)],
            ),
        );

        tables.insert(
            PriceFamily::NatGateway,
            RateTable::new(PriceFamily::NatGateway, &[("standard", 0.045)]),
        );

        tables.insert(
            PriceFamily::Elasticache,
            RateTable::new(
                PriceFamily::Elasticache,
                &[
                    ("cache.t3.micro", 0.017),
                    ("cache.t3.small", 0.034),
                    ("cache.t3.medium", 0.068),
                    ("cache.m5.large", 0.156),
                    ("cache.m5.xlarge", 0.312),
                    ("cache.m5.2xlarge", 0.624),
                    ("cache.r5.large", 0.226),
                    ("cache.r5.xlarge", 0.452),
                ],
            ),
        );

        tables.insert(
            PriceFamily::Eks,
            RateTable::new(PriceFamily::Eks, &[("standard", 0.10)]),
        );

        tables.insert(
            PriceFamily::GcpCompute,
            RateTable::new(
                PriceFamily::GcpCompute,
                &[
                    ("e2-micro", 0.0084),
                    ("e2-small", 0.0168),
                    ("e2-medium", 0.0336),
                    ("e2-standard-2", 0.0672),
                    ("e2-standard-4", 0.1344),
                    ("e2-standard-8", 0.2688),
                    ("n1-standard-1", 0.0475),
                    ("n1-standard-2", 0.095),
                    ("n1-standard-4", 0.19),
                    ("n1-standard-8", 0.38),
                    ("n2-standard-2", 0.0971),
                    ("n2-standard-4", 0.1942),
                    ("n2-standard-8", 0.3884),
                ],
            ),
        );

        tables.insert(
            PriceFamily::AzureVm,
            RateTable::new(
                PriceFamily::AzureVm,
                &[
                    ("Standard_B1s", 0.0104),
                    ("Standard_B1ms", 0.0207),
                    ("Standard_B2s", 0.0416),
                    ("Standard_B2ms", 0.0832),
                    ("Standard_D2s_v3", 0.096),
                    ("Standard_D4s_v3", 0.192),
                    ("Standard_D8s_v3", 0.384),
                    ("Standard_E2s_v3", 0.126),
                    ("Standard_E4s_v3", 0.252),
                    ("Standard_E8s_v3", 0.504),
                    ("Standard_F2s_v2", 0.085),
                    ("Standard_F4s_v2", 0.169),
                    ("Standard_F8s_v2", 0.338),
                ],
            ),
        );

        Self { tables }
    }

    /// Built-in catalog with user overrides merged in
    ///
    /// Overrides may replace existing classes or add new ones. Unknown
    /// families and negative or non-finite rates are rejected.
    pub fn with_overrides(overrides: &PriceOverrides) -> Result<Self> {
        let mut catalog = Self::new();
        for (family_name, classes) in overrides {
            let family: PriceFamily = family_name.parse()?;
            let Some(table) = catalog.tables.get_mut(&family) else {
                continue;
            };
            for (class, rate) in classes {
                crate::validation::validate_rate(&format!("{}.{}", family, class), *rate)?;
                debug!("Price override: {} {} = {}", family, class, rate);
                table.rates.insert(class.clone(), *rate);
            }
        }
        Ok(catalog)
    }

    /// Exact rate for a class, if the family's table has it
    pub fn lookup(&self, family: PriceFamily, class: &str) -> Option<f64> {
        self.tables.get(&family).and_then(|t| t.get(class))
    }

    /// Rate for a class, or the family's fallback rate when the class is unknown
    pub fn rate(&self, family: PriceFamily, class: &str) -> f64 {
        match self.lookup(family, class) {
            Some(rate) => rate,
            None => {
                debug!(
                    "No {} price for '{}', using fallback '{}'",
                    family,
                    class,
                    family.fallback_class()
                );
                self.fallback_rate(family)
            }
        }
    }

    pub fn fallback_rate(&self, family: PriceFamily) -> f64 {
        self.tables
            .get(&family)
            .map(RateTable::fallback_rate)
            .unwrap_or_default()
    }

    pub fn table(&self, family: PriceFamily) -> Option<&RateTable> {
        self.tables.get(&family)
    }

    pub fn families(&self) -> impl Iterator<Item = (PriceFamily, &RateTable)> {
        self.tables.iter().map(|(f, t)| (*f, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_has_its_fallback() {
        let catalog = PriceCatalog::new();
        for family in PriceFamily::ALL {
            let table = catalog.table(family).expect("family missing from catalog");
            assert!(!table.is_empty());
            assert!(
                table.get(family.fallback_class()).is_some(),
                "{} has no fallback entry",
                family
            );
            assert!(catalog.fallback_rate(family) > 0.0);
        }
    }

    #[test]
    fn test_known_rates() {
        let catalog = PriceCatalog::new();
        assert_eq!(catalog.rate(PriceFamily::Ec2, "t3.micro"), 0.0104);
        assert_eq!(catalog.rate(PriceFamily::Ec2, "g4dn.xlarge"), 0.526);
        assert_eq!(catalog.rate(PriceFamily::Ebs, "gp3"), 0.08);
        assert_eq!(catalog.rate(PriceFamily::AzureVm, "Standard_D2s_v3"), 0.096);
    }

    #[test]
    fn test_unknown_class_uses_fallback() {
        let catalog = PriceCatalog::new();
        assert_eq!(catalog.lookup(PriceFamily::Ec2, "x9.mega"), None);
        assert_eq!(catalog.rate(PriceFamily::Ec2, "x9.mega"), 0.0104);
        assert_eq!(catalog.rate(PriceFamily::Rds, ""), 0.017);
        assert_eq!(catalog.rate(PriceFamily::GcpCompute, "e9-huge"), 0.0084);
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("ec2".parse::<PriceFamily>().unwrap(), PriceFamily::Ec2);
        assert_eq!(
            "load_balancer".parse::<PriceFamily>().unwrap(),
            PriceFamily::LoadBalancer
        );
        let err = "lambda".parse::<PriceFamily>().unwrap_err();
        assert!(err.to_string().contains("unknown price family"));
    }

    #[test]
    fn test_overrides_replace_and_add() {
        let mut overrides = PriceOverrides::new();
        overrides.insert(
            "ec2".to_string(),
            BTreeMap::from([
                ("t3.micro".to_string(), 0.02),
                ("t4g.micro".to_string(), 0.0084),
            ]),
        );
        let catalog = PriceCatalog::with_overrides(&overrides).unwrap();
        assert_eq!(catalog.rate(PriceFamily::Ec2, "t3.micro"), 0.02);
        assert_eq!(catalog.rate(PriceFamily::Ec2, "t4g.micro"), 0.0084);
        // Other families untouched
        assert_eq!(catalog.rate(PriceFamily::Rds, "db.t3.micro"), 0.017);
    }

    #[test]
    fn test_overrides_reject_negative_rate() {
        let mut overrides = PriceOverrides::new();
        overrides.insert(
            "ebs".to_string(),
            BTreeMap::from([("gp3".to_string(), -1.0)]),
        );
        assert!(PriceCatalog::with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_overrides_reject_unknown_family() {
        let mut overrides = PriceOverrides::new();
        overrides.insert("mainframe".to_string(), BTreeMap::new());
        assert!(PriceCatalog::with_overrides(&overrides).is_err());
    }
}
