//! Aggregation capabilities consumed by the tree builders.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::group::{GroupInfo, GroupState, GroupStates};
use super::resolver::{unique_ids, DocumentResolver, Resolution, ResolvedChain};
use super::versions::VersionAggregator;
use crate::config::SiteSyncConfig;
use crate::error::Result;
use crate::models::DocId;
use crate::refresh::RefreshTicket;
use crate::store::DocumentStore;
use crate::sync::{group_availability, GroupAvailability};

/// The three enrichment steps of a refresh.
pub trait Aggregation: Send + Sync {
    /// Resolve each representation id to its document chain.
    fn resolve(
        &self,
        repre_ids: &[DocId],
        ticket: &RefreshTicket,
    ) -> Result<BTreeMap<DocId, Resolution>>;

    /// Highest numbered version per subset id of the given chains.
    fn aggregate_versions(
        &self,
        chains: &[&ResolvedChain],
        ticket: &RefreshTicket,
    ) -> Result<HashMap<DocId, i64>>;

    /// Per-site availability, or `None` when site sync is disabled.
    fn aggregate_availability(&self, chain: &ResolvedChain) -> Option<GroupAvailability>;

    /// Run all three steps and produce a state per representation id.
    fn aggregate(&self, repre_ids: &[DocId], ticket: &RefreshTicket) -> Result<GroupStates> {
        let resolved = self.resolve(repre_ids, ticket)?;
        let chains: Vec<&ResolvedChain> = resolved.values().filter_map(Resolution::chain).collect();
        let highest = self.aggregate_versions(&chains, ticket)?;

        let states = resolved
            .iter()
            .map(|(repre_id, resolution)| {
                let state = match resolution {
                    Resolution::Resolved(chain) => {
                        GroupState::Resolved(Box::new(GroupInfo::from_chain(
                            chain,
                            highest.get(&chain.subset.id).copied(),
                            self.aggregate_availability(chain),
                        )))
                    }
                    Resolution::NotFound(missing) => GroupState::NotFound { missing: *missing },
                };
                (repre_id.clone(), state)
            })
            .collect();
        Ok(states)
    }
}

/// Aggregation over a document store.
#[derive(Clone)]
pub struct StoreAggregation {
    store: Arc<dyn DocumentStore>,
    sync: SiteSyncConfig,
}

impl StoreAggregation {
    pub fn new(store: Arc<dyn DocumentStore>, sync: SiteSyncConfig) -> Self {
        Self { store, sync }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn sync(&self) -> &SiteSyncConfig {
        &self.sync
    }
}

impl Aggregation for StoreAggregation {
    fn resolve(
        &self,
        repre_ids: &[DocId],
        ticket: &RefreshTicket,
    ) -> Result<BTreeMap<DocId, Resolution>> {
        DocumentResolver::new(self.store.as_ref()).resolve(repre_ids, ticket)
    }

    fn aggregate_versions(
        &self,
        chains: &[&ResolvedChain],
        ticket: &RefreshTicket,
    ) -> Result<HashMap<DocId, i64>> {
        let subset_ids = unique_ids(chains.iter().map(|chain| &chain.subset.id));
        VersionAggregator::new(self.store.as_ref()).highest_versions(&subset_ids, ticket)
    }

    fn aggregate_availability(&self, chain: &ResolvedChain) -> Option<GroupAvailability> {
        let sites = self.sync.sites()?;
        let availability = group_availability(&[&chain.representation], sites);
        debug!(
            "Availability of {}: {} / {}",
            chain.representation.id, availability.active, availability.remote
        );
        Some(availability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AssetDoc, RepresentationDoc, SubsetData, SubsetDoc, VersionData, VersionDoc, VersionType,
    };
    use crate::store::MemoryStore;
    use crate::sync::SiteAvailability;
    use serde_json::json;

    fn store() -> Arc<MemoryStore> {
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
                    family: Some("model".into()),
                    ..SubsetData::default()
                },
            })
            .unwrap();
        for n in 1..=3 {
            store
                .insert_version(VersionDoc {
                    id: format!("V{}", n),
                    parent: "S1".into(),
                    version_type: VersionType::Version,
                    name: Some(n),
                    version_id: None,
                    data: VersionData::default(),
                })
                .unwrap();
        }
        store
            .insert_representation(
                serde_json::from_value::<RepresentationDoc>(json!({
                    "_id": "R1", "parent": "V1", "name": "abc",
                    "files": [{"sites": [{"name": "studio", "progress": 0.5}]}]
                }))
                .unwrap(),
            )
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_aggregate_states() {
        let aggregation = StoreAggregation::new(store(), SiteSyncConfig::Disabled);
        let states = aggregation
            .aggregate(
                &["R1".to_string(), "R9".to_string()],
                &RefreshTicket::detached(),
            )
            .unwrap();

        let info = states["R1"].info().unwrap();
        assert_eq!(info.label, "chair_modelMain: (abc)");
        assert_eq!(info.family, "model");
        assert_eq!(info.version.highest, Some(3));
        assert!(info.version.is_outdated());
        assert!(info.availability.is_none());
        assert!(states["R9"].info().is_none());
    }

    #[test]
    fn test_availability_when_sync_enabled() {
        let aggregation =
            StoreAggregation::new(store(), SiteSyncConfig::enabled("studio", "gdrive"));
        let states = aggregation
            .aggregate(&["R1".to_string()], &RefreshTicket::detached())
            .unwrap();

        let availability = states["R1"].info().unwrap().availability.unwrap();
        assert_eq!(availability.active, SiteAvailability::Ratio(0.5));
        assert_eq!(availability.remote, SiteAvailability::Unavailable);
    }
}
