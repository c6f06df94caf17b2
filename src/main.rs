//! ASAL-Guardian - Drought Early Warning System
//!
//! ## Usage
//!
//! ```bash
//! # One pipeline run, printed to the console (default)
//! asal-guardian run
//!
//! # HTTP server: GET|POST /api/run, GET /health
//! asal-guardian serve --addr 0.0.0.0:8080
//! ```
//!
//! ## Environment variables
//!
//! | Variable             | Required | Description                                  |
//! |----------------------|----------|----------------------------------------------|
//! | `GOOGLE_API_KEY`     | Yes      | Generative Language API credential           |
//! | `ASAL_CONFIG`        | No       | Path to a TOML config file                   |
//! | `ASAL_SERVER_ADDR`   | No       | Server bind address (overridden by `--addr`) |
//! | `ASAL_CORS_ORIGINS`  | No       | Comma-separated allowed CORS origins         |
//! | `RUST_LOG`           | No       | Log filter (default: `info`)                 |

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use asal_guardian::api::{create_app, ApiState};
use asal_guardian::config::GuardianConfig;
use asal_guardian::llm::{ApiKey, GeminiBackend, API_KEY_ENV_VAR};
use asal_guardian::{console, Orchestrator, SimulatedFieldReport};

/// Environment override for the server bind address
const SERVER_ADDR_ENV_VAR: &str = "ASAL_SERVER_ADDR";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "asal-guardian")]
#[command(about = "ASAL-Guardian multi-agent drought early warning system")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides ASAL_CONFIG and ./asal_guardian.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Execute one pipeline run and print each stage's output
    Run,

    /// Serve the pipeline over HTTP
    Serve {
        /// Override the server address (default: "0.0.0.0:8080")
        #[arg(short, long)]
        addr: Option<String>,
    },
}

// ============================================================================
// Commands
// ============================================================================

async fn run_once(orchestrator: &Orchestrator) -> Result<()> {
    println!("\n{}", "=".repeat(60));
    println!("INITIATING ASAL-GUARDIAN MULTI-AGENT WORKFLOW...");
    println!("{}", "=".repeat(60));

    let result = orchestrator.run().await;
    print!("{}", console::render_run_report(&result));
    Ok(())
}

async fn serve(orchestrator: Arc<Orchestrator>, addr: String) -> Result<()> {
    let app = create_app(ApiState::new(orchestrator));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, initiating shutdown...");
        })
        .await;

    match result {
        Ok(()) => {
            info!("Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Credential and configuration are fatal before any agent exists
    let api_key = ApiKey::from_env().with_context(|| {
        format!("{API_KEY_ENV_VAR} environment variable not found. Set it with: export {API_KEY_ENV_VAR}='your_key_here'")
    })?;
    info!(key = %api_key.masked(), "Found API key");

    let config = match &args.config {
        Some(path) => GuardianConfig::load_from_file(path),
        None => GuardianConfig::load(),
    }
    .context("Invalid configuration")?;
    let config = Arc::new(config);

    let backend = GeminiBackend::new(&config.backend, api_key)
        .context("Failed to build generation backend client")?;
    let orchestrator = Orchestrator::new(
        Arc::clone(&config),
        Arc::new(backend),
        Arc::new(SimulatedFieldReport),
    )
    .context("Invalid model preferences")?;

    match args.command.unwrap_or(SubCommand::Run) {
        SubCommand::Run => run_once(&orchestrator).await,
        SubCommand::Serve { addr } => {
            let addr = addr
                .or_else(|| std::env::var(SERVER_ADDR_ENV_VAR).ok())
                .unwrap_or_else(|| config.server.addr.clone());
            serve(Arc::new(orchestrator), addr).await
        }
    }
}
