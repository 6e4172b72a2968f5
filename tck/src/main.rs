//! ledger-bdd - feature runner
//!
//! Runs feature files against a simulated ledger built from the suite
//! configuration.
//!
//! # Usage
//!
//! ```bash
//! # Run every scenario of two features
//! ledger-bdd run features/consensus-service.feature features/token-service.feature
//!
//! # Only scenarios tagged @transfer, with an explicit config
//! ledger-bdd run --config config.yaml --tags transfer features/token-service.feature
//!
//! # Report undefined or ambiguous steps without running anything
//! ledger-bdd check features/*.feature
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_tck::config::SuiteConfig;
use ledger_tck::network::SimulatedNetworkBuilder;
use ledger_tck::scenarios::{parse_feature_file, FeatureRunner};
use ledger_tck::steps;

/// Ledger BDD - consensus and token service features
#[derive(Parser)]
#[command(name = "ledger-bdd")]
#[command(about = "Run ledger consensus and token service features")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run features and print a report
    Run {
        /// Suite config file (defaults to $LEDGER_BDD_CONFIG or generated accounts)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only run scenarios with one of these tags
        #[arg(short, long)]
        tags: Vec<String>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Feature files
        #[arg(required = true)]
        features: Vec<PathBuf>,
    },
    /// Check that every step resolves to exactly one definition
    Check {
        /// Feature files
        #[arg(required = true)]
        features: Vec<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<SuiteConfig> {
    let mut config = match path {
        Some(path) => SuiteConfig::from_file(path)?,
        None => return SuiteConfig::from_env(),
    };
    config.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

async fn run(
    config: Option<&Path>,
    tags: &[String],
    json: bool,
    features: &[PathBuf],
) -> Result<bool> {
    let config = Arc::new(load_config(config)?);
    let network = Arc::new(SimulatedNetworkBuilder::from_config(&config).build());
    let runner = FeatureRunner::new(network, config)?.with_tags(tags);

    let report = runner.run_files(features).await?;
    if json {
        println!("{}", report.to_json());
    } else {
        report.print_summary();
    }
    Ok(report.all_passed())
}

fn check(features: &[PathBuf]) -> Result<bool> {
    let registry = steps::registry().context("Failed to build step registry")?;
    let mut clean = true;
    for path in features {
        let feature = parse_feature_file(path)?;
        let unresolved = registry.check(&feature);
        if unresolved.is_empty() {
            println!(
                "{}: {} scenario(s) OK",
                path.display(),
                feature.scenarios.len()
            );
            continue;
        }
        clean = false;
        for step in unresolved {
            println!(
                "{}:{} [{}] {}",
                path.display(),
                step.line,
                step.scenario,
                step.error
            );
        }
    }
    Ok(clean)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            tags,
            json,
            features,
        } => run(config.as_deref(), &tags, json, &features).await,
        Commands::Check { features } => check(&features),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
