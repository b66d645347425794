//! StripeIO CLI - Translation plan inspector
//!
//! Prints how a byte-range request maps onto objects and storage targets
//! for a configured set of striping policies.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use stripeio_common::{Config, ReconciliationMode, StripingPolicy};
use stripeio_striping::{OperationDescriptor, StripeLayout, StripeTranslator};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stripeio-cli")]
#[command(about = "StripeIO translation plan inspector")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/stripeio/stripeio.toml")]
    config: String,

    /// Striping policy as STRIPE_KIB:WIDTH (repeatable, overrides the config file)
    #[arg(short, long = "policy", value_parser = parse_policy)]
    policies: Vec<StripingPolicy>,

    /// Log level (defaults to the config file's `logging.level`)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the write plan for a request
    Write {
        /// Absolute file offset in bytes
        #[arg(short, long, default_value = "0")]
        offset: i64,
        /// Request size in bytes
        #[arg(short, long)]
        size: usize,
    },
    /// Show the read plan for a request
    Read {
        /// Absolute file offset in bytes
        #[arg(short, long, default_value = "0")]
        offset: i64,
        /// Request size in bytes
        #[arg(short, long)]
        size: usize,
    },
    /// Show where a single file byte lives
    Locate {
        /// Absolute file offset in bytes
        offset: u64,
    },
    /// Show the effective policy set
    Policies,
}

#[derive(Serialize)]
struct Placement {
    policy: usize,
    target: u32,
    row: u64,
}

fn parse_policy(s: &str) -> Result<StripingPolicy> {
    let (kib, width) = s
        .split_once(':')
        .context("expected STRIPE_KIB:WIDTH, e.g. 128:4")?;
    let policy = StripingPolicy::raid0(
        kib.trim().parse().context("invalid stripe size")?,
        width.trim().parse().context("invalid width")?,
    );
    policy.validate()?;
    Ok(policy)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config =
        Config::load(&args.config).with_context(|| format!("loading {}", args.config))?;
    if !args.policies.is_empty() {
        config.policies.clone_from(&args.policies);
    }
    config.validate()?;
    Ok(config)
}

fn resolve_log_level(args: &Args, config: &Config) -> String {
    args.log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone())
}

/// Translator for the configured reconciliation mode
///
/// Redundant mode is refused: the CLI registers no fragment recovery backend.
fn build_translator(config: &Config) -> Result<StripeTranslator> {
    match config.reconciliation.mode {
        ReconciliationMode::Basic => Ok(StripeTranslator::raid0()),
        ReconciliationMode::Redundant => bail!(
            "reconciliation mode \"redundant\" needs a fragment recovery backend, \
             and none is registered in stripeio-cli; use mode = \"basic\""
        ),
    }
}

/// Describe the operations for a request without materialising its buffer
///
/// Produces the same descriptors as translating a real buffer of `size`
/// bytes, so arbitrarily large requests can be inspected.
fn describe_plan(
    offset: i64,
    size: usize,
    policies: &[StripingPolicy],
) -> Result<Vec<OperationDescriptor>> {
    let layout = StripeLayout::new(policies)?;
    let plan = layout
        .extents(offset, size)?
        .map(|extent| OperationDescriptor {
            object_number: extent.object_number,
            target_indices: layout.target_indices(extent.object_number),
            intra_object_offset: extent.intra_object_offset,
            buffer_offset: extent.buffer_offset,
            length: extent.length,
        })
        .collect();
    Ok(plan)
}

fn print_plan(kind: &str, offset: i64, size: usize, plan: &[OperationDescriptor]) -> Result<()> {
    let out = json!({
        "kind": kind,
        "offset": offset,
        "size": size,
        "operation_count": plan.len(),
        "operations": plan,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    let config = load_config(&args)?;

    // CLI log level wins over the config file when given
    let log_level = resolve_log_level(&args, &config);

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Config file: {}", args.config);
    info!("Using {} striping policies", config.policies.len());

    let translator = build_translator(&config)?;
    debug!("Reconciliation variant: {:?}", translator.variant());
    let policies = &config.policies;

    match args.command {
        Commands::Write { offset, size } => {
            let plan = describe_plan(offset, size, policies)?;
            print_plan("write", offset, size, &plan)?;
        }
        Commands::Read { offset, size } => {
            let plan = describe_plan(offset, size, policies)?;
            debug!("Read plan has {} operations", plan.len());
            print_plan("read", offset, size, &plan)?;
        }
        Commands::Locate { offset } => {
            let layout = StripeLayout::new(policies)?;
            let first = policies[0];
            let Some(object_number) = first.object_for_offset(offset) else {
                bail!("policy 0 has a zero stripe size");
            };

            let placements: Vec<Placement> = policies
                .iter()
                .enumerate()
                .filter_map(|(index, policy)| {
                    Some(Placement {
                        policy: index,
                        target: policy.target_for_object(object_number)?,
                        row: policy.row_for_object(object_number)?,
                    })
                })
                .collect();

            let out = json!({
                "offset": offset,
                "object_size": layout.object_size(),
                "object_number": object_number,
                "intra_object_offset": offset - first.object_start_offset(object_number),
                "aligned": first.is_aligned(offset),
                "placements": placements,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Policies => {
            let out = json!({
                "policies": policies,
                "reconciliation": {
                    "mode": config.reconciliation.mode,
                    "reconstruction": config.reconciliation.reconstruction,
                },
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}
