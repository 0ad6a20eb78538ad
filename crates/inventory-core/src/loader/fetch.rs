//! Document fetch for the subsets browser.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::config::SiteSyncConfig;
use crate::error::Result;
use crate::models::{AssetDoc, DocId, SubsetDoc, VersionDoc};
use crate::refresh::RefreshTicket;
use crate::store::DocumentStore;
use crate::sync::VersionAvailability;

/// Version shown for a subset.
#[derive(Debug, Clone, PartialEq)]
pub struct LastVersion {
    /// Highest numbered version, or the subset's hero version overlaid with
    /// the version it points at.
    pub version: VersionDoc,
    /// False for a hero pointing at an older version than the highest.
    pub is_from_latest: bool,
    /// Id of the subset's highest numbered version.
    pub latest_id: DocId,
}

impl LastVersion {
    pub fn latest(version: VersionDoc) -> Self {
        Self {
            latest_id: version.id.clone(),
            version,
            is_from_latest: true,
        }
    }
}

/// Everything the subsets model is built from.
#[derive(Debug, Clone, Default)]
pub struct SubsetsPayload {
    pub assets_by_id: HashMap<DocId, AssetDoc>,
    pub subsets: Vec<SubsetDoc>,
    pub last_versions: HashMap<DocId, LastVersion>,
    /// Keyed by version id; empty when site sync is disabled.
    pub availability: HashMap<DocId, VersionAvailability>,
}

impl SubsetsPayload {
    /// First family of every subset.
    pub fn families(&self) -> BTreeSet<String> {
        self.subsets
            .iter()
            .filter_map(|subset| subset.data.families.first().cloned())
            .collect()
    }
}

/// Fetch subsets of the given assets with their last versions.
pub fn fetch_subsets(
    store: &dyn DocumentStore,
    asset_ids: &[DocId],
    sync: &SiteSyncConfig,
    ticket: &RefreshTicket,
) -> Result<SubsetsPayload> {
    if asset_ids.is_empty() {
        return Ok(SubsetsPayload::default());
    }

    let assets_by_id: HashMap<DocId, AssetDoc> = store
        .assets(asset_ids)?
        .into_iter()
        .map(|asset| (asset.id.clone(), asset))
        .collect();
    let subsets = store.subsets_by_asset(asset_ids)?;
    ticket.check()?;

    let subset_ids: Vec<DocId> = subsets.iter().map(|s| s.id.clone()).collect();
    let mut last_versions: HashMap<DocId, LastVersion> = store
        .last_versions(&subset_ids)?
        .into_iter()
        .map(|(subset_id, version)| (subset_id, LastVersion::latest(version)))
        .collect();
    ticket.check()?;

    let heroes = store.hero_versions_by_subset(&subset_ids)?;
    ticket.check()?;
    overlay_heroes(store, heroes, &mut last_versions)?;

    let availability = match sync.sites() {
        Some(sites) => {
            let version_ids: Vec<DocId> =
                last_versions.values().map(|v| v.version.id.clone()).collect();
            store.version_availability(&version_ids, sites)?
        }
        None => HashMap::new(),
    };
    ticket.check()?;

    debug!(
        "Fetched {} subsets with {} versions for {} assets",
        subsets.len(),
        last_versions.len(),
        assets_by_id.len()
    );
    Ok(SubsetsPayload {
        assets_by_id,
        subsets,
        last_versions,
        availability,
    })
}

/// Replace last versions with hero versions where a subset has one.
fn overlay_heroes(
    store: &dyn DocumentStore,
    heroes: Vec<VersionDoc>,
    last_versions: &mut HashMap<DocId, LastVersion>,
) -> Result<()> {
    let missing: Vec<DocId> = heroes
        .iter()
        .filter_map(|hero| hero.version_id.clone())
        .filter(|pointed| {
            !last_versions
                .values()
                .any(|last| &last.version.id == pointed)
        })
        .collect();
    let fetched: HashMap<DocId, VersionDoc> = if missing.is_empty() {
        HashMap::new()
    } else {
        store
            .versions(&missing)?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect()
    };

    for mut hero in heroes {
        let Some(pointed) = hero.version_id.clone() else {
            continue;
        };
        let latest_id = last_versions
            .get(&hero.parent)
            .map_or_else(|| pointed.clone(), |last| last.latest_id.clone());
        let latest = last_versions
            .get(&hero.parent)
            .filter(|last| last.version.id == pointed)
            .map(|last| last.version.clone());
        let is_from_latest = latest.is_some();
        let Some(source) = latest.or_else(|| fetched.get(&pointed).cloned()) else {
            debug!("Hero version {} points at a missing version", hero.id);
            continue;
        };
        hero.overlay_from(&source);
        last_versions.insert(
            hero.parent.clone(),
            LastVersion {
                version: hero,
                is_from_latest,
                latest_id,
            },
        );
    }
    Ok(())
}
