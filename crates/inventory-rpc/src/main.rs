//! Inventory RPC Server - JSON-RPC backend for out-of-process inventory UIs.
//!
//! Serves the scene inventory and subsets browser of `inventory-core` over
//! JSON-RPC 2.0, reading published documents from a SQLite store and loaded
//! containers from a scene dump written by the host application.

mod handler;
mod host;
mod server;

use anyhow::Result;
use clap::Parser;
use inventory_core::{
    InventorySession, SiteSyncConfig, SqliteStore, SubsetGroupsConfig, SyncSites,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::host::JsonFileHost;

#[derive(Parser, Debug)]
#[command(name = "inventory-rpc")]
#[command(about = "JSON-RPC server for the scene inventory")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// SQLite document store
    #[arg(long, default_value = "documents.db")]
    database: PathBuf,

    /// JSON dump of the containers loaded in the scene
    #[arg(long)]
    containers: Option<PathBuf>,

    /// Subset group ordering for the loader
    #[arg(long)]
    subset_groups: Option<PathBuf>,

    /// Active site; enables site sync together with --remote-site
    #[arg(long)]
    active_site: Option<String>,

    /// Remote site
    #[arg(long)]
    remote_site: Option<String>,

    /// Provider of the active site (defaults to the site name)
    #[arg(long)]
    active_provider: Option<String>,

    /// Provider of the remote site (defaults to the site name)
    #[arg(long)]
    remote_provider: Option<String>,
}

impl Args {
    /// Site sync is enabled only when both sites are given.
    fn site_sync(&self) -> SiteSyncConfig {
        let (Some(active), Some(remote)) = (&self.active_site, &self.remote_site) else {
            return SiteSyncConfig::Disabled;
        };
        let sites = SyncSites::new(active.as_str(), remote.as_str());
        let active_provider = self
            .active_provider
            .clone()
            .unwrap_or_else(|| sites.active_provider.clone());
        let remote_provider = self
            .remote_provider
            .clone()
            .unwrap_or_else(|| sites.remote_provider.clone());
        SiteSyncConfig::Enabled(sites.with_providers(active_provider, remote_provider))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Inventory RPC Server");
    info!("Document store: {}", args.database.display());

    let store = SqliteStore::open(&args.database)?;
    let host = JsonFileHost::new(args.containers.clone());

    let sync = args.site_sync();
    let groups = match &args.subset_groups {
        Some(path) => SubsetGroupsConfig::from_json_file(path)?,
        None => SubsetGroupsConfig::default(),
    };

    let session = InventorySession::builder(Arc::new(store), Arc::new(host))
        .with_site_sync(sync)
        .with_subset_groups(groups)
        .build();

    // Start the server
    let addr = server::start_server(session, &args.host, args.port).await?;

    // Print port for the client process to read
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
