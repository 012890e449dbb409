//! placectl: run placement decisions against the external engine.
//!
//! # Usage
//!
//! ```text
//! placectl place --config delegate.toml --request request.json --inventory hosts.json --origin 10.1.1.4
//! placectl login --config delegate.toml
//! placectl resolve --config delegate.toml --zone nova --template m1.small
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use placement_delegate::{
    DelegateConfig, EngineTransport, PlacementRequest, RequestContext, ResourceResolver,
    SchedulerOrchestrator, SessionManager, StaticInventory, TracingNotifier,
};

#[derive(Parser)]
#[command(name = "placectl", about = "Placement delegate CLI")]
struct Cli {
    /// Path to the delegate configuration file.
    #[arg(long, global = true, default_value = "delegate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one placement decision and print the destinations as JSON.
    Place {
        /// JSON file holding the placement request.
        #[arg(long)]
        request: PathBuf,

        /// JSON file holding the host inventory.
        #[arg(long)]
        inventory: PathBuf,

        /// Address the request originates from.
        #[arg(long)]
        origin: Option<String>,
    },
    /// Check the configured credentials by logging in once.
    Login,
    /// Resolve a zone and template to engine identifiers.
    Resolve {
        #[arg(long)]
        zone: String,

        #[arg(long)]
        template: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,placement_delegate=debug,placectl=debug")
                }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DelegateConfig::from_file(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;

    match cli.command {
        Command::Place {
            request,
            inventory,
            origin,
        } => run_place(&config, &request, &inventory, origin).await,
        Command::Login => run_login(&config).await,
        Command::Resolve { zone, template } => run_resolve(&config, &zone, &template).await,
    }
}

async fn run_place(
    config: &DelegateConfig,
    request_path: &Path,
    inventory_path: &Path,
    origin: Option<String>,
) -> anyhow::Result<()> {
    let request = load_request(request_path)?;
    let inventory = StaticInventory::from_file(inventory_path)?;

    let orchestrator = SchedulerOrchestrator::new(
        &config.engine,
        Arc::new(inventory),
        Arc::new(TracingNotifier),
    )?;

    let context = RequestContext {
        origin_address: origin,
    };
    let destinations = orchestrator.select_destinations(&request, &context).await?;

    println!("{}", serde_json::to_string_pretty(&destinations)?);
    Ok(())
}

async fn run_login(config: &DelegateConfig) -> anyhow::Result<()> {
    let transport = EngineTransport::new(&config.engine)?;
    let sessions = SessionManager::new(transport, &config.engine);

    let session = sessions.acquire().await?;
    info!(acquired_at = session.acquired_at(), "login succeeded");
    println!("login succeeded as {}", config.engine.username);
    Ok(())
}

async fn run_resolve(config: &DelegateConfig, zone: &str, template: &str) -> anyhow::Result<()> {
    let transport = EngineTransport::new(&config.engine)?;
    let sessions = SessionManager::new(transport.clone(), &config.engine);
    let resolver = ResourceResolver::new(transport, config.engine.target_address.clone());

    let session = sessions.acquire().await?;
    let resolved = resolver.resolve(&session, zone, template).await?;

    println!("datacenter: {}", resolved.datacenter_id);
    println!("region:     {}", resolved.region_id);
    println!("template:   {}", resolved.template_id);
    Ok(())
}

fn load_request(path: &Path) -> anyhow::Result<PlacementRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read request {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse request {}", path.display()))
}
