//! Cloud Delegator - command line entry point
//!
//! Loads a delegation config, registers the configured agents and routes a
//! single task, printing the outcome as JSON on stdout.

use clap::{Parser, Subcommand};
use cloud_delegator::config::DelegationFileConfig;
use cloud_delegator::observability::{init_default_logging, metrics};
use cloud_delegator::{Delegator, Task};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, info};

/// Route tasks to local and remote agents
#[derive(Parser)]
#[command(name = "cloud-delegator")]
#[command(about = "Delegate typed tasks to registered agents")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "DELEGATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delegate one task and print its outcome
    Delegate {
        /// Task type, matched against agent capabilities
        #[arg(short, long)]
        task: String,

        /// Task payload as JSON
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    debug!("Starting cloud-delegator v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Delegate { task, data } => run_delegation(config, task, &data).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<DelegationFileConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(DelegationFileConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = ["delegator.toml", "config/delegator.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(DelegationFileConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using defaults with no agents");
            Ok(DelegationFileConfig::default())
        }
    }
}

async fn run_delegation(
    config: DelegationFileConfig,
    task_type: String,
    data: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let data: Value = serde_json::from_str(data)?;

    let delegator = Delegator::from_file_config(&config)?;

    let outcome = delegator.delegate(Task::new(task_type, data)).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    debug!(metrics = ?metrics().snapshot(), "Delegation metrics");
    Ok(())
}

fn handle_config_command(
    config: &DelegationFileConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", serde_json::to_string_pretty(config)?);
    }

    info!(
        agents = config.agents.len(),
        "Configuration validation complete"
    );
    Ok(())
}
