//! Inventory session: the entry point tying stores, hosts and models together.
//!
//! A session owns the current inventory model and its view filter. Refreshes
//! run either inline or on a blocking task; each one takes a fresh ticket so
//! that results of a superseded refresh are dropped instead of applied.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{SiteSyncConfig, SubsetGroupsConfig};
use crate::error::{InventoryError, Result};
use crate::host::ContainerHost;
use crate::inventory::{build_inventory, Aggregation, InventoryModel, RowSnapshot, StoreAggregation};
use crate::loader::{fetch_subsets, SubsetsModel};
use crate::models::{Container, DocId, VersionDoc};
use crate::refresh::{RefreshCoordinator, RefreshOutcome, RefreshTicket};
use crate::store::DocumentStore;
use crate::tree::{BuildRequest, NodeId, TreeFilter};

/// An inventory model built by a background refresh.
#[derive(Debug)]
pub struct BuiltInventory {
    pub ticket: RefreshTicket,
    pub model: InventoryModel,
}

/// Builder for [`InventorySession`].
///
/// # Example
///
/// ```rust,ignore
/// let session = InventorySession::builder(store, host)
///     .with_site_sync(SiteSyncConfig::enabled("studio", "gdrive"))
///     .build();
/// ```
pub struct InventorySessionBuilder {
    store: Arc<dyn DocumentStore>,
    host: Arc<dyn ContainerHost>,
    sync: SiteSyncConfig,
    groups: SubsetGroupsConfig,
}

impl InventorySessionBuilder {
    pub fn new(store: Arc<dyn DocumentStore>, host: Arc<dyn ContainerHost>) -> Self {
        Self {
            store,
            host,
            sync: SiteSyncConfig::Disabled,
            groups: SubsetGroupsConfig::default(),
        }
    }

    /// Site sync configuration. Default: disabled.
    pub fn with_site_sync(mut self, sync: SiteSyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Subset group ordering for the loader.
    pub fn with_subset_groups(mut self, groups: SubsetGroupsConfig) -> Self {
        self.groups = groups;
        self
    }

    pub fn build(self) -> InventorySession {
        let aggregation: Arc<dyn Aggregation> =
            Arc::new(StoreAggregation::new(self.store.clone(), self.sync.clone()));
        InventorySession {
            store: self.store,
            host: self.host,
            aggregation,
            sync: self.sync,
            groups: self.groups,
            inventory_refresh: RefreshCoordinator::new(),
            subsets_refresh: RefreshCoordinator::new(),
            model: InventoryModel::default(),
            filter: TreeFilter::new(),
        }
    }
}

/// Scene inventory and loader state for one host session.
pub struct InventorySession {
    store: Arc<dyn DocumentStore>,
    host: Arc<dyn ContainerHost>,
    aggregation: Arc<dyn Aggregation>,
    sync: SiteSyncConfig,
    groups: SubsetGroupsConfig,
    inventory_refresh: RefreshCoordinator,
    subsets_refresh: RefreshCoordinator,
    model: InventoryModel,
    filter: TreeFilter,
}

impl InventorySession {
    pub fn builder(
        store: Arc<dyn DocumentStore>,
        host: Arc<dyn ContainerHost>,
    ) -> InventorySessionBuilder {
        InventorySessionBuilder::new(store, host)
    }

    pub fn model(&self) -> &InventoryModel {
        &self.model
    }

    pub fn filter(&self) -> &TreeFilter {
        &self.filter
    }

    pub fn site_sync(&self) -> &SiteSyncConfig {
        &self.sync
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Rebuild the inventory inline.
    ///
    /// Returns `Stale` when another refresh or a teardown superseded this one
    /// while it ran; the current model is then left untouched.
    pub fn refresh(&mut self, request: &BuildRequest) -> Result<RefreshOutcome<()>> {
        let ticket = self.inventory_refresh.issue();
        match build_inventory(self.aggregation.as_ref(), self.host.as_ref(), request, &ticket) {
            Ok(model) => Ok(self.install(BuiltInventory { ticket, model })),
            Err(e) if e.is_cancellation() => Ok(RefreshOutcome::Stale),
            Err(e) => Err(e),
        }
    }

    /// Rebuild the inventory on a blocking task.
    ///
    /// The result must be handed back through [`finish_refresh`](Self::finish_refresh).
    pub fn spawn_refresh(
        &self,
        request: BuildRequest,
    ) -> JoinHandle<Result<RefreshOutcome<BuiltInventory>>> {
        let ticket = self.inventory_refresh.issue();
        let aggregation = self.aggregation.clone();
        let host = self.host.clone();
        debug!("Spawning inventory refresh {}", ticket.generation());

        tokio::task::spawn_blocking(move || {
            match build_inventory(aggregation.as_ref(), host.as_ref(), &request, &ticket) {
                Ok(model) => Ok(RefreshOutcome::Fetched(BuiltInventory { ticket, model })),
                Err(e) if e.is_cancellation() => Ok(RefreshOutcome::Stale),
                Err(e) => Err(e),
            }
        })
    }

    /// Apply a background refresh result unless it has gone stale.
    pub fn finish_refresh(&mut self, outcome: RefreshOutcome<BuiltInventory>) -> RefreshOutcome<()> {
        match outcome {
            RefreshOutcome::Fetched(built) => self.install(built),
            RefreshOutcome::Stale => RefreshOutcome::Stale,
        }
    }

    fn install(&mut self, built: BuiltInventory) -> RefreshOutcome<()> {
        if built.ticket.is_stale() {
            debug!("Discarding stale inventory refresh {}", built.ticket.generation());
            return RefreshOutcome::Stale;
        }
        self.filter.set_hierarchy_view(built.model.hierarchy_view());
        self.model = built.model;
        info!(
            "Inventory refreshed with {} top-level rows",
            self.model.row_count(self.model.root())
        );
        RefreshOutcome::Fetched(())
    }

    /// Invalidate every in-flight refresh.
    pub fn teardown(&self) {
        self.inventory_refresh.cancel_all();
        self.subsets_refresh.cancel_all();
    }

    pub fn set_text_filter(&mut self, pattern: &str) -> Result<()> {
        self.filter.set_text(pattern)
    }

    /// Filter rows by a regular expression instead of literal text.
    pub fn set_pattern_filter(&mut self, pattern: &str) -> Result<()> {
        self.filter.set_pattern(pattern)
    }

    pub fn set_outdated_only(&mut self, outdated_only: bool) {
        self.filter.set_outdated_only(outdated_only);
    }

    /// Whether a text or outdated-only filter is narrowing the view.
    pub fn is_filtered(&self) -> bool {
        self.filter.is_active()
    }

    /// Rows visible through the current filter.
    pub fn snapshot(&self) -> Vec<RowSnapshot> {
        self.model.snapshot(&self.filter, self.sync.is_enabled())
    }

    pub fn outdated_containers(&self) -> Vec<Container> {
        self.model.outdated_containers()
    }

    /// Show another version on the group row with the given item id.
    pub fn set_version(&mut self, item_id: &str, version_id: &str) -> Result<()> {
        let node = self.model.node_for(item_id)?;
        let version = self.load_version(version_id)?;
        self.model.set_version(node, &version)
    }

    /// Subsets model for the given assets.
    pub fn subsets(&self, asset_ids: &[DocId], grouping: bool) -> Result<RefreshOutcome<SubsetsModel>> {
        let ticket = self.subsets_refresh.issue();
        let payload = match fetch_subsets(self.store.as_ref(), asset_ids, &self.sync, &ticket) {
            Ok(payload) => payload,
            Err(e) if e.is_cancellation() => return Ok(RefreshOutcome::Stale),
            Err(e) => return Err(e),
        };
        if ticket.is_stale() {
            return Ok(RefreshOutcome::Stale);
        }
        Ok(RefreshOutcome::Fetched(SubsetsModel::build(
            &payload,
            &self.groups,
            grouping,
        )))
    }

    /// Show another version on a subset row of `subsets`.
    pub fn set_subset_version(
        &self,
        subsets: &mut SubsetsModel,
        node: NodeId,
        version_id: &str,
    ) -> Result<()> {
        let version = self.load_version(version_id)?;
        let availability = match self.sync.sites() {
            Some(sites) => self
                .store
                .version_availability(&[version.id.clone()], sites)?
                .remove(&version.id),
            None => None,
        };
        subsets.set_version(node, &version, availability)
    }

    /// Load a version, overlaying hero versions with their numbered version.
    fn load_version(&self, version_id: &str) -> Result<VersionDoc> {
        let mut version = self
            .store
            .versions(&[version_id.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| InventoryError::not_found("Version", version_id))?;

        if let Some(pointed) = version.version_id.clone().filter(|_| version.is_hero()) {
            match self.store.versions(&[pointed.clone()])?.into_iter().next() {
                Some(numbered) => version.overlay_from(&numbered),
                None => {
                    warn!("Hero version {} points at missing {}", version.id, pointed);
                    return Err(InventoryError::not_found("Version", pointed));
                }
            }
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use crate::models::{AssetDoc, RepresentationDoc, SubsetData, SubsetDoc, VersionData, VersionType};
    use crate::store::MemoryStore;
    use crate::tree::ItemId;

    fn version(id: &str, subset: &str, name: i64) -> VersionDoc {
        VersionDoc {
            id: id.into(),
            parent: subset.into(),
            version_type: VersionType::Version,
            name: Some(name),
            version_id: None,
            data: VersionData::default(),
        }
    }

    fn session() -> InventorySession {
        let store = MemoryStore::new();
        store
            .insert_asset(AssetDoc {
                id: "A1".into(),
                name: "chair".into(),
                label: None,
            })
            .unwrap();
        store
            .insert_subset(SubsetDoc {
                id: "S1".into(),
                parent: "A1".into(),
                name: "modelMain".into(),
                schema: "openpype:subset-3.0".into(),
                data: SubsetData {
                    families: vec!["model".into()],
                    ..SubsetData::default()
                },
            })
            .unwrap();
        for v in [version("V1", "S1", 1), version("V2", "S1", 2)] {
            store.insert_version(v).unwrap();
        }
        store
            .insert_version(VersionDoc {
                id: "H1".into(),
                parent: "S1".into(),
                version_type: VersionType::HeroVersion,
                name: None,
                version_id: Some("V2".into()),
                data: VersionData::default(),
            })
            .unwrap();
        store
            .insert_representation(RepresentationDoc {
                id: "R1".into(),
                parent: "V1".into(),
                name: "abc".into(),
                files: Vec::new(),
            })
            .unwrap();

        let host = StaticHost::new(vec![Container::new("chair_01:CON", "chair_01", "R1")]);
        InventorySession::builder(Arc::new(store), Arc::new(host)).build()
    }

    #[test]
    fn test_refresh_and_set_version() {
        let mut session = session();
        assert!(matches!(
            session.refresh(&BuildRequest::flat()).unwrap(),
            RefreshOutcome::Fetched(())
        ));
        assert_eq!(session.outdated_containers().len(), 1);

        let rows = session.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns["Version"], "v001");

        session.set_version(&rows[0].item_id, "H1").unwrap();
        let rows = session.snapshot();
        assert_eq!(rows[0].columns["Version"], "[v002]");
        assert!(session.outdated_containers().is_empty());

        assert!(matches!(
            session.set_version(&ItemId::new().to_string(), "V2"),
            Err(InventoryError::NodeNotFound { .. })
        ));
        assert!(matches!(
            session.set_version(&rows[0].item_id, "V404"),
            Err(InventoryError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn test_outdated_filter() {
        let mut session = session();
        session.refresh(&BuildRequest::flat()).unwrap();
        session.set_outdated_only(true);
        assert_eq!(session.snapshot().len(), 1);

        let item_id = session.snapshot()[0].item_id.clone();
        session.set_version(&item_id, "V2").unwrap();
        assert!(session.snapshot().is_empty());
    }

    #[test]
    fn test_pattern_filter() {
        let mut session = session();
        session.refresh(&BuildRequest::flat()).unwrap();
        assert!(!session.is_filtered());

        session.set_pattern_filter("^chair_m.*\\(abc\\)$").unwrap();
        assert!(session.is_filtered());
        assert_eq!(session.snapshot().len(), 1);

        session.set_pattern_filter("^table").unwrap();
        assert!(session.snapshot().is_empty());

        assert!(matches!(
            session.set_pattern_filter("("),
            Err(InventoryError::InvalidPattern { .. })
        ));

        session.set_pattern_filter("").unwrap();
        assert!(!session.is_filtered());
        assert_eq!(session.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_superseded_background_refresh_is_discarded() {
        let mut session = session();
        let first = session.spawn_refresh(BuildRequest::flat());
        let second = session.spawn_refresh(BuildRequest::flat());

        let second = second.await.unwrap().unwrap();
        let first = first.await.unwrap().unwrap();

        assert!(session.finish_refresh(first).is_stale());
        assert!(!session.finish_refresh(second).is_stale());
        assert_eq!(session.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_discards_in_flight_refresh() {
        let mut session = session();
        let handle = session.spawn_refresh(BuildRequest::flat());
        session.teardown();

        let outcome = handle.await.unwrap().unwrap();
        assert!(session.finish_refresh(outcome).is_stale());
        assert!(session.snapshot().is_empty());
    }

    #[test]
    fn test_subsets() {
        let session = session();
        let mut subsets = session
            .subsets(&["A1".to_string()], false)
            .unwrap()
            .fetched()
            .unwrap();
        let node = subsets.tree().child(subsets.root(), 0).unwrap();
        assert_eq!(
            subsets.data(node, crate::loader::LoaderColumn::Version).unwrap(),
            "[v002]"
        );

        session.set_subset_version(&mut subsets, node, "V1").unwrap();
        assert_eq!(
            subsets.data(node, crate::loader::LoaderColumn::Version).unwrap(),
            "v001"
        );
    }
}
