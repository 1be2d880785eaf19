//! Subcommand implementations
//!
//! Each command takes its input and output streams explicitly so the CLI
//! can pass stdin/stdout/stderr and tests can pass buffers. Report output
//! goes to `out`; prompts and progress notes go to `prompt` so JSON output on
//! stdout stays machine readable.

use crate::config::{expand_path, Config};
use crate::error::Result;
use crate::estimator::{EstimationResult, Estimator};
use crate::plan::{parse_plan_json, Plan};
use crate::pricing::PriceFamily;
use crate::report::{
    confirm_apply, confirm_with_threshold, render_breakdown, render_prices, render_summary,
    Decision, JsonReport,
};
use crate::terraform::{load_plan, Terraform};
use crate::validation::{validate_plan_path, validate_threshold};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub breakdown: bool,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmOptions {
    /// Overrides `estimate.threshold` from the config
    pub threshold: Option<f64>,
    pub assume_yes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub dir: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

/// Load a plan and estimate it with the config's price catalog
pub fn estimate_file(plan_path: &Path, config: &Config) -> Result<(Plan, EstimationResult)> {
    let plan_path = expand_path(plan_path);
    validate_plan_path(&plan_path)?;
    let plan = load_plan(&plan_path, &config.terraform.binary)?;
    let estimator = Estimator::with_catalog(config.price_catalog()?);
    let result = estimator.estimate_plan(&plan);
    info!(
        "Estimated {} changes: {:+.2}/month",
        result.estimates.len(),
        result.total_monthly_change
    );
    Ok((plan, result))
}

/// `costguard estimate`
pub fn run_estimate<W: Write>(
    plan_path: &Path,
    opts: &ReportOptions,
    config: &Config,
    out: &mut W,
) -> Result<EstimationResult> {
    let (plan, result) = estimate_file(plan_path, config)?;
    write_report(&plan, &result, None, opts, config, out)?;
    Ok(result)
}

/// `costguard check`: report, then approve or decline
pub fn run_check<R: BufRead, W: Write, P: Write>(
    plan_path: &Path,
    report: &ReportOptions,
    confirm: &ConfirmOptions,
    config: &Config,
    input: &mut R,
    out: &mut W,
    prompt: &mut P,
) -> Result<Decision> {
    let (plan, result) = estimate_file(plan_path, config)?;
    report_and_decide(&plan, &result, report, confirm, config, input, out, prompt)
}

/// `costguard apply`: plan, estimate, confirm, apply
pub fn run_apply<R: BufRead, W: Write, P: Write>(
    apply: &ApplyOptions,
    report: &ReportOptions,
    confirm: &ConfirmOptions,
    config: &Config,
    input: &mut R,
    out: &mut W,
    prompt: &mut P,
) -> Result<Decision> {
    let dir = apply
        .dir
        .as_deref()
        .or(config.terraform.working_dir.as_deref())
        .map(expand_path);
    let terraform = Terraform::locate(&config.terraform.binary, dir.as_deref())?;

    let plan_file = &config.terraform.plan_file;
    terraform.plan(plan_file, &apply.extra_args)?;
    let json = terraform.show_json(Path::new(plan_file))?;
    let plan = parse_plan_json(&json)?;

    let estimator = Estimator::with_catalog(config.price_catalog()?);
    let result = estimator.estimate_plan(&plan);

    let decision = report_and_decide(&plan, &result, report, confirm, config, input, out, prompt)?;
    if decision.proceed() {
        terraform.apply(Path::new(plan_file))?;
    } else {
        writeln!(prompt, "Apply cancelled.")?;
        info!(
            "Apply declined, plan left at {}",
            terraform.working_dir().join(plan_file).display()
        );
    }
    Ok(decision)
}

/// `costguard prices`
pub fn run_prices<W: Write>(
    family: Option<PriceFamily>,
    format: OutputFormat,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    let catalog = config.price_catalog()?;
    match format {
        OutputFormat::Text => writeln!(out, "{}", render_prices(&catalog, family))?,
        OutputFormat::Json => {
            let json = match family {
                Some(f) => serde_json::to_string_pretty(&catalog.table(f))?,
                None => serde_json::to_string_pretty(&catalog)?,
            };
            writeln!(out, "{}", json)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn report_and_decide<R: BufRead, W: Write, P: Write>(
    plan: &Plan,
    result: &EstimationResult,
    report: &ReportOptions,
    confirm: &ConfirmOptions,
    config: &Config,
    input: &mut R,
    out: &mut W,
    prompt: &mut P,
) -> Result<Decision> {
    if report.format == OutputFormat::Text {
        write_report(plan, result, None, report, config, out)?;
        out.flush()?;
    }

    let change = result.total_monthly_change;
    let threshold = confirm.threshold.or(config.estimate.threshold);
    let decision = if confirm.assume_yes {
        writeln!(prompt, "Approved with --yes.")?;
        Decision::Approved
    } else if let Some(threshold) = threshold {
        validate_threshold(threshold)?;
        confirm_with_threshold(change, threshold, input, prompt)?
    } else {
        confirm_apply(change, input, prompt)?
    };
    info!("Decision: {:?}", decision);

    if report.format == OutputFormat::Json {
        write_report(plan, result, Some(decision), report, config, out)?;
    }
    Ok(decision)
}

fn write_report<W: Write>(
    plan: &Plan,
    result: &EstimationResult,
    decision: Option<Decision>,
    opts: &ReportOptions,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    match opts.format {
        OutputFormat::Text => {
            if (opts.breakdown || config.estimate.show_breakdown) && result.has_changes() {
                writeln!(out, "{}", render_breakdown(result))?;
            }
            write!(out, "{}", render_summary(result))?;
        }
        OutputFormat::Json => {
            let mut json = JsonReport::new(plan, result);
            if let Some(decision) = decision {
                json = json.with_decision(decision);
            }
            writeln!(out, "{}", json.to_json()?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const PLAN: &str = r#"{
        "format_version": "1.2",
        "terraform_version": "1.6.0",
        "resource_changes": [
            {"address": "aws_instance.web", "type": "aws_instance",
             "change": {"actions": ["create"], "before": null, "after": {"instance_type": "t3.micro"}}}
        ]
    }"#;

    fn write_plan(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("plan.json");
        std::fs::write(&path, PLAN).unwrap();
        path
    }

    #[test]
    fn test_run_estimate_text() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir);
        let mut out = Vec::new();
        let opts = ReportOptions {
            breakdown: true,
            format: OutputFormat::Text,
        };
        let result = run_estimate(&path, &opts, &Config::default(), &mut out).unwrap();
        assert_eq!(result.created_resources, 1);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("aws_instance.web"));
        assert!(text.contains("+$7.59"));
    }

    #[test]
    fn test_run_estimate_json() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir);
        let mut out = Vec::new();
        let opts = ReportOptions {
            breakdown: false,
            format: OutputFormat::Json,
        };
        run_estimate(&path, &opts, &Config::default(), &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["created_resources"], 1);
        assert!(value.get("decision").is_none());
    }

    #[test]
    fn test_run_estimate_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        let err = run_estimate(
            &dir.path().join("missing.json"),
            &ReportOptions::default(),
            &Config::default(),
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::CostGuardError::Validation { .. }));
    }

    #[test]
    fn test_run_check_threshold_from_config() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir);
        let mut config = Config::default();
        config.estimate.threshold = Some(100.0);

        let (mut out, mut prompt) = (Vec::new(), Vec::new());
        let decision = run_check(
            &path,
            &ReportOptions::default(),
            &ConfirmOptions::default(),
            &config,
            &mut Cursor::new(Vec::new()),
            &mut out,
            &mut prompt,
        )
        .unwrap();
        assert_eq!(decision, Decision::WithinThreshold);
    }

    #[test]
    fn test_run_check_flag_overrides_config_threshold() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir);
        let mut config = Config::default();
        config.estimate.threshold = Some(100.0);
        let confirm = ConfirmOptions {
            threshold: Some(1.0),
            assume_yes: false,
        };

        let (mut out, mut prompt) = (Vec::new(), Vec::new());
        let decision = run_check(
            &path,
            &ReportOptions::default(),
            &confirm,
            &config,
            &mut Cursor::new(b"n\n".to_vec()),
            &mut out,
            &mut prompt,
        )
        .unwrap();
        assert_eq!(decision, Decision::Declined);
        assert!(String::from_utf8(prompt).unwrap().contains("Proceed?"));
    }

    #[test]
    fn test_run_check_assume_yes_json() {
        let dir = TempDir::new().unwrap();
        let path = write_plan(&dir);
        let confirm = ConfirmOptions {
            threshold: None,
            assume_yes: true,
        };
        let report = ReportOptions {
            breakdown: false,
            format: OutputFormat::Json,
        };

        let (mut out, mut prompt) = (Vec::new(), Vec::new());
        let decision = run_check(
            &path,
            &report,
            &confirm,
            &Config::default(),
            &mut Cursor::new(Vec::new()),
            &mut out,
            &mut prompt,
        )
        .unwrap();
        assert_eq!(decision, Decision::Approved);

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["decision"], "approved");
    }

    #[test]
    fn test_run_prices_json_family() {
        let mut out = Vec::new();
        run_prices(
            Some(PriceFamily::NatGateway),
            OutputFormat::Json,
            &Config::default(),
            &mut out,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["fallback"], "standard");
        assert_eq!(value["rates"]["standard"], 0.045);
    }
}
