use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use costguard::commands::{
    self, ApplyOptions, ConfirmOptions, OutputFormat, ReportOptions,
};
use costguard::config::{self, Config, LOCAL_CONFIG_FILE};
use costguard::exit_codes::{codes, exit_code_for_anyhow};
use costguard::pricing::PriceFamily;
use costguard::report::Decision;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "costguard")]
#[command(
    about = "Estimate the monthly cost impact of a Terraform plan",
    long_about = "costguard reads a Terraform plan, prices every resource it creates, destroys,\nupdates or replaces, and reports the signed monthly cost change.\n\nPrices are approximate on-demand rates (AWS, GCP, Azure). Usage-based charges\n(data transfer, requests, LCUs) are not included."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the cost of a plan file (JSON or binary)
    Estimate {
        /// Plan file: `terraform show -json` output, or a binary plan from `terraform plan -out`
        plan: PathBuf,
        /// Show the per-resource breakdown
        #[arg(short, long)]
        breakdown: bool,
    },
    /// Estimate a plan and ask for confirmation
    ///
    /// Exits 0 when approved and 4 when declined, so it can gate a CI step.
    Check {
        /// Plan file: `terraform show -json` output, or a binary plan
        plan: PathBuf,
        /// Approve without asking when the monthly increase is at most this (USD)
        #[arg(short, long, env = "COSTGUARD_THRESHOLD")]
        threshold: Option<f64>,
        /// Approve without asking
        #[arg(short, long)]
        yes: bool,
        /// Show the per-resource breakdown
        #[arg(short, long)]
        breakdown: bool,
    },
    /// Run terraform plan, estimate, confirm, then terraform apply
    Apply {
        /// Terraform working directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Approve without asking when the monthly increase is at most this (USD)
        #[arg(short, long, env = "COSTGUARD_THRESHOLD")]
        threshold: Option<f64>,
        /// Approve without asking
        #[arg(short, long)]
        yes: bool,
        /// Show the per-resource breakdown
        #[arg(short, long)]
        breakdown: bool,
        /// Extra arguments passed to `terraform plan`
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Show the price catalog
    Prices {
        /// Only show one family (ec2, rds, ebs, load_balancer, nat_gateway, elasticache, eks, gcp_compute, azure_vm)
        #[arg(short, long)]
        family: Option<PriceFamily>,
    },
    /// Initialize configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = LOCAL_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so `--output json` stays parseable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code_for_anyhow(&e));
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let mut prompt = io::stderr();

    let decision = match cli.command {
        Commands::Estimate { plan, breakdown } => {
            let report = ReportOptions {
                breakdown,
                format: cli.output,
            };
            commands::run_estimate(&plan, &report, &config, &mut out)
                .with_context(|| format!("Failed to estimate {}", plan.display()))?;
            None
        }
        Commands::Check {
            plan,
            threshold,
            yes,
            breakdown,
        } => {
            let report = ReportOptions {
                breakdown,
                format: cli.output,
            };
            let confirm = ConfirmOptions {
                threshold,
                assume_yes: yes,
            };
            let decision = commands::run_check(
                &plan,
                &report,
                &confirm,
                &config,
                &mut input,
                &mut out,
                &mut prompt,
            )
            .with_context(|| format!("Failed to check {}", plan.display()))?;
            Some(decision)
        }
        Commands::Apply {
            dir,
            threshold,
            yes,
            breakdown,
            args,
        } => {
            let apply = ApplyOptions {
                dir,
                extra_args: args,
            };
            let report = ReportOptions {
                breakdown,
                format: cli.output,
            };
            let confirm = ConfirmOptions {
                threshold,
                assume_yes: yes,
            };
            let decision = commands::run_apply(
                &apply,
                &report,
                &confirm,
                &config,
                &mut input,
                &mut out,
                &mut prompt,
            )
            .context("Apply failed")?;
            Some(decision)
        }
        Commands::Prices { family } => {
            commands::run_prices(family, cli.output, &config, &mut out)?;
            None
        }
        Commands::Init { path } => {
            config::init_config(&path)?;
            None
        }
    };

    out.flush()?;

    Ok(match decision {
        Some(Decision::Declined) => codes::DECLINED,
        _ => codes::SUCCESS,
    })
}
