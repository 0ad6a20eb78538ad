//! Inventory Core - Headless scene inventory and loader aggregation.
//!
//! Resolves loaded containers against published asset documents, aggregates
//! version and site availability per representation group, and builds the
//! filterable trees shown by the scene inventory and the subsets browser.
//! No UI or RPC layer is required; see the `inventory-rpc` crate for a
//! JSON-RPC adapter.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inventory_core::{BuildRequest, InventorySession, SqliteStore, StaticHost};
//!
//! let store = Arc::new(SqliteStore::open("documents.db")?);
//! let host = Arc::new(StaticHost::new(containers));
//! let mut session = InventorySession::builder(store, host).build();
//!
//! session.refresh(&BuildRequest::flat())?;
//! for container in session.outdated_containers() {
//!     println!("{} is outdated", container.namespace);
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod inventory;
pub mod loader;
pub mod models;
pub mod refresh;
pub mod session;
pub mod store;
pub mod sync;
pub mod tree;

// Re-export commonly used types
pub use config::{InventoryConfig, LoaderConfig, SiteSyncConfig, SubsetGroupsConfig, SyncSites};
pub use error::{InventoryError, Result};
pub use host::{ContainerHost, StaticHost};
pub use inventory::{
    build_inventory, Aggregation, Column, InventoryModel, InventoryRow, RowKind, RowSnapshot,
    StoreAggregation, VersionStatus,
};
pub use loader::{fetch_subsets, LoaderColumn, SubsetRow, SubsetsModel};
pub use models::{AssetDoc, Container, DocId, RepresentationDoc, SubsetDoc, VersionDoc, VersionName};
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshTicket};
pub use session::{BuiltInventory, InventorySession, InventorySessionBuilder};
pub use store::{DocumentStore, MemoryStore, SqliteStore};
pub use tree::{BuildRequest, ItemId, NodeId, TreeFilter};
