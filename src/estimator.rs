//! Plan cost estimator
//!
//! Classifies every resource change of a plan (create, delete, replace,
//! update) and prices the before/after attributes with the rule for its
//! resource type. The result is a signed monthly delta: creations add cost,
//! deletions subtract it, replacements and updates contribute the difference.
//!
//! Estimation never fails. Unknown types price at zero and are reported in
//! `EstimationResult::unsupported_types`; unknown sizes fall back to the
//! smallest class of their family. Negative sizes and counts price as zero.

use crate::attributes::{AttributeExt, Attributes};
use crate::plan::{Plan, ResourceChange};
use crate::pricing::{
    PriceCatalog, PriceFamily, FARGATE_GB_HOUR_RATE, FARGATE_TASK_MEMORY_GB, FARGATE_TASK_VCPU,
    FARGATE_VCPU_HOUR_RATE, HOURS_PER_MONTH, LAMBDA_GB_SECOND_RATE, LAMBDA_INVOCATION_MS,
    LAMBDA_MONTHLY_INVOCATIONS, S3_BUCKET_MINIMUM,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Estimated monthly cost impact of one resource change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub resource_address: String,
    pub resource_type: String,
    pub action: String,
    /// Signed monthly delta in USD
    pub monthly_cost: f64,
    pub details: String,
}

/// Aggregate estimate for a whole plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub estimates: Vec<CostEstimate>,
    pub total_monthly_cost: f64,
    /// Positive is an increase, negative a saving
    pub total_monthly_change: f64,
    pub created_resources: usize,
    pub destroyed_resources: usize,
    pub updated_resources: usize,
    pub unsupported_types: Vec<String>,
}

impl EstimationResult {
    pub fn has_changes(&self) -> bool {
        !self.estimates.is_empty()
    }
}

/// Price of one attribute set under one pricing rule
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCost {
    pub monthly: f64,
    pub details: String,
    pub supported: bool,
}

impl ResourceCost {
    fn priced(monthly: f64, details: impl Into<String>) -> Self {
        Self {
            monthly,
            details: details.into(),
            supported: true,
        }
    }

    fn unsupported(details: &str) -> Self {
        Self {
            monthly: 0.0,
            details: details.to_string(),
            supported: false,
        }
    }
}

/// Pricing rule selected from a resource type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Ec2Instance,
    RdsInstance,
    EbsVolume,
    ApplicationLoadBalancer,
    ClassicLoadBalancer,
    NatGateway,
    ElasticacheCluster,
    LambdaFunction,
    S3Bucket,
    EksCluster,
    EcsService,
    GcpComputeInstance,
    AzureVm,
    Unsupported,
}

impl ResourceKind {
    pub fn from_type(resource_type: &str) -> Self {
        match resource_type {
            "aws_instance" => ResourceKind::Ec2Instance,
            "aws_db_instance" => ResourceKind::RdsInstance,
            "aws_ebs_volume" => ResourceKind::EbsVolume,
            "aws_lb" | "aws_alb" => ResourceKind::ApplicationLoadBalancer,
            "aws_elb" => ResourceKind::ClassicLoadBalancer,
            "aws_nat_gateway" => ResourceKind::NatGateway,
            "aws_elasticache_cluster" => ResourceKind::ElasticacheCluster,
            "aws_lambda_function" => ResourceKind::LambdaFunction,
            "aws_s3_bucket" => ResourceKind::S3Bucket,
            "aws_eks_cluster" => ResourceKind::EksCluster,
            "aws_ecs_service" => ResourceKind::EcsService,
            "google_compute_instance" => ResourceKind::GcpComputeInstance,
            "azurerm_virtual_machine"
            | "azurerm_linux_virtual_machine"
            | "azurerm_windows_virtual_machine" => ResourceKind::AzureVm,
            _ => ResourceKind::Unsupported,
        }
    }

    /// Type tags with a pricing rule
    pub const SUPPORTED_TYPES: [&'static str; 16] = [
        "aws_instance",
        "aws_db_instance",
        "aws_ebs_volume",
        "aws_lb",
        "aws_alb",
        "aws_elb",
        "aws_nat_gateway",
        "aws_elasticache_cluster",
        "aws_lambda_function",
        "aws_s3_bucket",
        "aws_eks_cluster",
        "aws_ecs_service",
        "google_compute_instance",
        "azurerm_virtual_machine",
        "azurerm_linux_virtual_machine",
        "azurerm_windows_virtual_machine",
    ];
}

/// How a change affects the bill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Create,
    Delete,
    Replace,
    Update,
}

impl ChangeKind {
    fn classify(rc: &ResourceChange) -> Option<Self> {
        let create = rc.change.has_action("create");
        let delete = rc.change.has_action("delete");
        match (create, delete) {
            (true, false) => Some(ChangeKind::Create),
            (false, true) => Some(ChangeKind::Delete),
            (true, true) => Some(ChangeKind::Replace),
            (false, false) if rc.change.has_action("update") => Some(ChangeKind::Update),
            _ => None,
        }
    }
}

/// Calculates cost estimates for terraform plans
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    pricing: PriceCatalog,
}

impl Estimator {
    /// Estimator using the built-in price catalog
    pub fn new() -> Self {
        Self::with_catalog(PriceCatalog::new())
    }

    pub fn with_catalog(pricing: PriceCatalog) -> Self {
        Self { pricing }
    }

    pub fn catalog(&self) -> &PriceCatalog {
        &self.pricing
    }

    pub fn estimate_plan(&self, plan: &Plan) -> EstimationResult {
        self.estimate(plan.resource_changes())
    }

    /// Estimate the monthly cost impact of a list of resource changes
    pub fn estimate(&self, changes: &[ResourceChange]) -> EstimationResult {
        let mut result = EstimationResult::default();
        let mut unsupported: HashSet<&str> = HashSet::new();

        for rc in changes {
            let action = rc.change.action_label();
            if action.is_empty() || action == "no-op" {
                continue;
            }

            let Some(kind) = ChangeKind::classify(rc) else {
                debug!("Skipping {} ({}): nothing to price", rc.address, action);
                continue;
            };

            let (monthly_cost, priced) = match kind {
                ChangeKind::Create => {
                    let cost = self.resource_cost(&rc.resource_type, rc.change.after.as_ref());
                    result.created_resources += 1;
                    (cost.monthly, cost)
                }
                ChangeKind::Delete => {
                    let mut cost = self.resource_cost(&rc.resource_type, rc.change.before.as_ref());
                    cost.details.push_str(" (removed)");
                    result.destroyed_resources += 1;
                    (-cost.monthly, cost)
                }
                ChangeKind::Replace | ChangeKind::Update => {
                    let old = self.resource_cost(&rc.resource_type, rc.change.before.as_ref());
                    let mut new = self.resource_cost(&rc.resource_type, rc.change.after.as_ref());
                    new.details.push_str(if kind == ChangeKind::Replace {
                        " (replaced)"
                    } else {
                        " (updated)"
                    });
                    result.updated_resources += 1;
                    (new.monthly - old.monthly, new)
                }
            };

            if !priced.supported && unsupported.insert(rc.resource_type.as_str()) {
                warn!("No pricing rule for resource type {}", rc.resource_type);
                result.unsupported_types.push(rc.resource_type.clone());
            }

            debug!(
                "{} [{}]: {:+.2}/month ({})",
                rc.address, action, monthly_cost, priced.details
            );
            result.total_monthly_change += monthly_cost;
            result.estimates.push(CostEstimate {
                resource_address: rc.address.clone(),
                resource_type: rc.resource_type.clone(),
                action,
                monthly_cost,
                details: priced.details,
            });
        }

        result.total_monthly_cost = result.total_monthly_change;
        result
    }

    /// Monthly cost of one resource type with the given attributes
    pub fn resource_cost(&self, resource_type: &str, attrs: Option<&Attributes>) -> ResourceCost {
        let Some(attrs) = attrs else {
            return ResourceCost::unsupported("no attributes");
        };

        match ResourceKind::from_type(resource_type) {
            ResourceKind::Ec2Instance => self.ec2_instance(attrs),
            ResourceKind::RdsInstance => self.rds_instance(attrs),
            ResourceKind::EbsVolume => self.ebs_volume(attrs),
            ResourceKind::ApplicationLoadBalancer => ResourceCost::priced(
                self.pricing.rate(PriceFamily::LoadBalancer, "alb") * HOURS_PER_MONTH,
                "Application Load Balancer",
            ),
            ResourceKind::ClassicLoadBalancer => ResourceCost::priced(
                self.pricing.rate(PriceFamily::LoadBalancer, "classic") * HOURS_PER_MONTH,
                "Classic Load Balancer",
            ),
            // Data processing charges are not included
            ResourceKind::NatGateway => ResourceCost::priced(
                self.pricing.rate(PriceFamily::NatGateway, "standard") * HOURS_PER_MONTH,
                "NAT Gateway",
            ),
            ResourceKind::ElasticacheCluster => self.elasticache_cluster(attrs),
            ResourceKind::LambdaFunction => lambda_function(attrs),
            ResourceKind::S3Bucket => {
                ResourceCost::priced(S3_BUCKET_MINIMUM, "S3 Bucket (minimal estimate)")
            }
            ResourceKind::EksCluster => ResourceCost::priced(
                self.pricing.rate(PriceFamily::Eks, "standard") * HOURS_PER_MONTH,
                "EKS Cluster",
            ),
            ResourceKind::EcsService => ecs_service(attrs),
            ResourceKind::GcpComputeInstance => self.gcp_instance(attrs),
            ResourceKind::AzureVm => self.azure_vm(attrs),
            ResourceKind::Unsupported => ResourceCost::unsupported("unsupported resource type"),
        }
    }

    fn ec2_instance(&self, attrs: &Attributes) -> ResourceCost {
        let family = PriceFamily::Ec2;
        let instance_type = attrs.get_str("instance_type", family.fallback_class());
        let hourly = self.pricing.rate(family, instance_type);
        ResourceCost::priced(hourly * HOURS_PER_MONTH, format!("EC2 {}", instance_type))
    }

    fn rds_instance(&self, attrs: &Attributes) -> ResourceCost {
        let family = PriceFamily::Rds;
        let instance_class = attrs.get_str("instance_class", family.fallback_class());
        let hourly = self.pricing.rate(family, instance_class);

        let storage_gb = attrs.get_f64("allocated_storage", 20.0).max(0.0);
        let storage = storage_gb * self.pricing.fallback_rate(PriceFamily::Ebs);

        ResourceCost::priced(
            hourly * HOURS_PER_MONTH + storage,
            format!("RDS {} + {:.0}GB storage", instance_class, storage_gb),
        )
    }

    fn ebs_volume(&self, attrs: &Attributes) -> ResourceCost {
        let family = PriceFamily::Ebs;
        let volume_type = attrs.get_str("type", family.fallback_class());
        let size_gb = attrs.get_f64("size", 8.0).max(0.0);
        let rate = self.pricing.rate(family, volume_type);
        ResourceCost::priced(
            size_gb * rate,
            format!("EBS {} {:.0}GB", volume_type, size_gb),
        )
    }

    fn elasticache_cluster(&self, attrs: &Attributes) -> ResourceCost {
        let family = PriceFamily::Elasticache;
        let node_type = attrs.get_str("node_type", family.fallback_class());
        let nodes = attrs.get_f64("num_cache_nodes", 1.0).max(0.0);
        let hourly = self.pricing.rate(family, node_type);
        ResourceCost::priced(
            hourly * HOURS_PER_MONTH * nodes,
            format!("Elasticache {} x{:.0}", node_type, nodes),
        )
    }

    fn gcp_instance(&self, attrs: &Attributes) -> ResourceCost {
        let family = PriceFamily::GcpCompute;
        let machine_type = attrs.get_str("machine_type", family.fallback_class());
        let hourly = self.pricing.rate(family, machine_type);
        ResourceCost::priced(hourly * HOURS_PER_MONTH, format!("GCP {}", machine_type))
    }

    fn azure_vm(&self, attrs: &Attributes) -> ResourceCost {
        let family = PriceFamily::AzureVm;
        // azurerm_linux/windows_virtual_machine use `size`, the legacy resource `vm_size`
        let size = [attrs.get_str("size", ""), attrs.get_str("vm_size", "")]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or(family.fallback_class());
        let hourly = self.pricing.rate(family, size);
        ResourceCost::priced(hourly * HOURS_PER_MONTH, format!("Azure {}", size))
    }
}

/// Assumes a fixed 1M invocations/month at 100ms each
fn lambda_function(attrs: &Attributes) -> ResourceCost {
    let memory_mb = attrs.get_f64("memory_size", 128.0).max(0.0);
    let gb_seconds =
        (memory_mb / 1024.0) * LAMBDA_MONTHLY_INVOCATIONS * (LAMBDA_INVOCATION_MS / 1000.0);
    ResourceCost::priced(
        gb_seconds * LAMBDA_GB_SECOND_RATE,
        format!("Lambda {:.0}MB (estimated)", memory_mb),
    )
}

/// ECS has no charge of its own; prices `desired_count` default-sized Fargate tasks
fn ecs_service(attrs: &Attributes) -> ResourceCost {
    let desired = attrs.get_f64("desired_count", 1.0).max(0.0);
    let per_task_hour =
        FARGATE_TASK_VCPU * FARGATE_VCPU_HOUR_RATE + FARGATE_TASK_MEMORY_GB * FARGATE_GB_HOUR_RATE;
    ResourceCost::priced(
        desired * per_task_hour * HOURS_PER_MONTH,
        format!("ECS Service ({:.0} tasks, Fargate estimate)", desired),
    )
}
