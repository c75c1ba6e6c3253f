//! distcalc - distributed arithmetic calculator
//!
//! `distcalc orchestrator` serves the public API and the task queue,
//! `distcalc agent` runs polling workers against it.

use clap::{Parser, Subcommand};
use distcalc::agent::AgentLifecycle;
use distcalc::config::AppConfig;
use distcalc::observability::{init_default_logging, init_logging, LogFormat};
use distcalc::orchestrator::Orchestrator;
use distcalc::transport::OrchestratorServer;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, Level};

/// Distributed arithmetic calculator
#[derive(Parser)]
#[command(name = "distcalc")]
#[command(about = "Orchestrator and computing agents for distributed expression evaluation")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator HTTP server
    Orchestrator,
    /// Run a computing agent
    Agent,
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

const DEFAULT_CONFIG_PATHS: &[&str] = &["distcalc.toml", "config/distcalc.toml"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.verbose {
        0 => init_default_logging(),
        n => {
            let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
            let level = if n == 1 { Level::DEBUG } else { Level::TRACE };
            init_logging(level, LogFormat::parse(&format), false);
        }
    }

    info!("Starting distcalc v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Orchestrator => run_orchestrator(config).await,
        Commands::Agent => run_agent(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(AppConfig::load_from_file(path)?);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(AppConfig::load_from_file(&path)?);
        }
    }

    info!("No configuration file found, using defaults and environment");
    Ok(AppConfig::from_env()?)
}

async fn run_orchestrator(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = Arc::new(Orchestrator::from_config(&config.orchestrator));
    info!(
        queue_capacity = config.orchestrator.queue_capacity,
        "Orchestrator initialized"
    );

    let server = OrchestratorServer::from_config(&config.orchestrator, orchestrator)?;
    server.run(shutdown_signal()).await?;
    Ok(())
}

async fn run_agent(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let agent = AgentLifecycle::from_config(&config)?;
    info!(
        workers = agent.worker_count(),
        computing_power = config.agent.computing_power,
        "Agent is running and polling for tasks"
    );

    shutdown_signal().await;
    agent.shutdown().await;
    Ok(())
}

fn handle_config_command(config: AppConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                if signal::ctrl_c().await.is_ok() {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT, shutting down gracefully...");
        }
    }
}
