//! Representation → version → subset → asset resolution.
//!
//! Resolution is batched one store call per hierarchy level. A missing
//! document only marks the representations depending on it as not found;
//! the rest of the batch resolves normally.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use crate::config::InventoryConfig;
use crate::error::Result;
use crate::models::{AssetDoc, DocId, RepresentationDoc, SubsetDoc, VersionDoc, VersionName};
use crate::refresh::RefreshTicket;
use crate::store::DocumentStore;

/// First document missing from a representation's parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingLink {
    Representation,
    Version,
    Subset,
    Asset,
}

impl MissingLink {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingLink::Representation => "representation",
            MissingLink::Version => "version",
            MissingLink::Subset => "subset",
            MissingLink::Asset => "asset",
        }
    }

    /// Header shown for the group of containers missing this link.
    pub fn group_label(&self) -> String {
        format!(
            "{}{}{}",
            InventoryConfig::NOT_FOUND_LABEL_PREFIX,
            self.as_str(),
            InventoryConfig::NOT_FOUND_LABEL_SUFFIX
        )
    }
}

impl fmt::Display for MissingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully joined documents of one representation.
///
/// For hero versions, `version` already carries the number and data of the
/// numbered version it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChain {
    pub representation: RepresentationDoc,
    pub version: VersionDoc,
    pub subset: SubsetDoc,
    pub asset: AssetDoc,
}

impl ResolvedChain {
    pub fn version_name(&self) -> Option<VersionName> {
        self.version.version_name()
    }

    /// "{asset}_{subset}: ({representation})"
    pub fn group_label(&self) -> String {
        format!(
            "{}_{}: ({})",
            self.asset.name, self.subset.name, self.representation.name
        )
    }
}

/// Outcome of resolving one representation id.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Box<ResolvedChain>),
    NotFound(MissingLink),
}

impl Resolution {
    pub fn chain(&self) -> Option<&ResolvedChain> {
        match self {
            Resolution::Resolved(chain) => Some(chain),
            Resolution::NotFound(_) => None,
        }
    }
}

/// Resolves representation ids against a document store.
pub struct DocumentResolver<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> DocumentResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Resolve each unique representation id.
    ///
    /// Every input id gets an entry in the result. Store errors and a stale
    /// ticket abort the batch; missing documents never do.
    pub fn resolve(
        &self,
        repre_ids: &[DocId],
        ticket: &RefreshTicket,
    ) -> Result<BTreeMap<DocId, Resolution>> {
        let unique: Vec<DocId> = repre_ids
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(BTreeMap::new());
        }

        let repres_by_id = index_by_id(self.store.representations(&unique)?, |r| &r.id);
        ticket.check()?;

        let version_ids = unique_ids(repres_by_id.values().map(|r| &r.parent));
        let mut versions_by_id = index_by_id(self.store.versions(&version_ids)?, |v| &v.id);
        ticket.check()?;

        self.overlay_hero_versions(&mut versions_by_id)?;
        ticket.check()?;

        let subset_ids = unique_ids(versions_by_id.values().map(|v| &v.parent));
        let subsets_by_id = index_by_id(self.store.subsets(&subset_ids)?, |s| &s.id);
        ticket.check()?;

        let asset_ids = unique_ids(subsets_by_id.values().map(|s| &s.parent));
        let assets_by_id = index_by_id(self.store.assets(&asset_ids)?, |a| &a.id);
        ticket.check()?;

        debug!(
            "Resolved {} representations: {} versions, {} subsets, {} assets",
            repres_by_id.len(),
            versions_by_id.len(),
            subsets_by_id.len(),
            assets_by_id.len()
        );

        let output = unique
            .into_iter()
            .map(|repre_id| {
                let resolution =
                    join_chain(&repre_id, &repres_by_id, &versions_by_id, &subsets_by_id, &assets_by_id);
                (repre_id, resolution)
            })
            .collect();
        Ok(output)
    }

    /// Overlay hero versions from their numbered versions.
    ///
    /// Heroes whose numbered version is missing are removed, so their
    /// representations resolve as missing a version.
    fn overlay_hero_versions(&self, versions_by_id: &mut HashMap<DocId, VersionDoc>) -> Result<()> {
        let pointed_ids = unique_ids(
            versions_by_id
                .values()
                .filter(|v| v.is_hero())
                .filter_map(|v| v.version_id.as_ref()),
        );
        if pointed_ids.is_empty() {
            return Ok(());
        }

        let numbered = index_by_id(self.store.versions(&pointed_ids)?, |v| &v.id);
        versions_by_id.retain(|_, version| {
            if !version.is_hero() {
                return true;
            }
            match version.version_id.as_ref().and_then(|id| numbered.get(id)) {
                Some(source) => {
                    version.overlay_from(source);
                    true
                }
                None => {
                    debug!("Hero version {} points at a missing version", version.id);
                    false
                }
            }
        });
        Ok(())
    }
}

fn join_chain(
    repre_id: &str,
    repres: &HashMap<DocId, RepresentationDoc>,
    versions: &HashMap<DocId, VersionDoc>,
    subsets: &HashMap<DocId, SubsetDoc>,
    assets: &HashMap<DocId, AssetDoc>,
) -> Resolution {
    let Some(representation) = repres.get(repre_id) else {
        return Resolution::NotFound(MissingLink::Representation);
    };
    let Some(version) = versions.get(&representation.parent) else {
        return Resolution::NotFound(MissingLink::Version);
    };
    let Some(subset) = subsets.get(&version.parent) else {
        return Resolution::NotFound(MissingLink::Subset);
    };
    let Some(asset) = assets.get(&subset.parent) else {
        return Resolution::NotFound(MissingLink::Asset);
    };
    Resolution::Resolved(Box::new(ResolvedChain {
        representation: representation.clone(),
        version: version.clone(),
        subset: subset.clone(),
        asset: asset.clone(),
    }))
}

pub(crate) fn index_by_id<T>(docs: Vec<T>, id: impl Fn(&T) -> &DocId) -> HashMap<DocId, T> {
    docs.into_iter().map(|doc| (id(&doc).clone(), doc)).collect()
}

pub(crate) fn unique_ids<'a>(ids: impl Iterator<Item = &'a DocId>) -> Vec<DocId> {
    ids.cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
