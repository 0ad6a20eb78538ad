//! In-process document store.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::DocumentStore;
use crate::error::{InventoryError, Result};
use crate::models::{AssetDoc, DocId, RepresentationDoc, SubsetDoc, VersionDoc};

#[derive(Debug, Default)]
struct Documents {
    assets: HashMap<DocId, AssetDoc>,
    subsets: HashMap<DocId, SubsetDoc>,
    versions: HashMap<DocId, VersionDoc>,
    representations: HashMap<DocId, RepresentationDoc>,
}

/// Document store held in memory.
///
/// Used by hosts that already hold their documents and by tests. Inserts
/// replace documents with the same id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_asset(&self, asset: AssetDoc) -> Result<()> {
        self.write()?.assets.insert(asset.id.clone(), asset);
        Ok(())
    }

    pub fn insert_subset(&self, subset: SubsetDoc) -> Result<()> {
        self.write()?.subsets.insert(subset.id.clone(), subset);
        Ok(())
    }

    pub fn insert_version(&self, version: VersionDoc) -> Result<()> {
        self.write()?.versions.insert(version.id.clone(), version);
        Ok(())
    }

    pub fn insert_representation(&self, repre: RepresentationDoc) -> Result<()> {
        self.write()?.representations.insert(repre.id.clone(), repre);
        Ok(())
    }

    /// Remove any document with the given id.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut docs = self.write()?;
        let removed = docs.assets.remove(id).is_some()
            | docs.subsets.remove(id).is_some()
            | docs.versions.remove(id).is_some()
            | docs.representations.remove(id).is_some();
        Ok(removed)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Documents>> {
        self.docs
            .read()
            .map_err(|_| InventoryError::Other("Document store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Documents>> {
        self.docs
            .write()
            .map_err(|_| InventoryError::Other("Document store lock poisoned".to_string()))
    }
}

fn by_ids<T: Clone>(map: &HashMap<DocId, T>, ids: &[DocId]) -> Vec<T> {
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

impl DocumentStore for MemoryStore {
    fn assets(&self, ids: &[DocId]) -> Result<Vec<AssetDoc>> {
        Ok(by_ids(&self.read()?.assets, ids))
    }

    fn subsets(&self, ids: &[DocId]) -> Result<Vec<SubsetDoc>> {
        Ok(by_ids(&self.read()?.subsets, ids))
    }

    fn subsets_by_asset(&self, asset_ids: &[DocId]) -> Result<Vec<SubsetDoc>> {
        let docs = self.read()?;
        let mut subsets: Vec<SubsetDoc> = docs
            .subsets
            .values()
            .filter(|subset| asset_ids.contains(&subset.parent))
            .cloned()
            .collect();
        subsets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(subsets)
    }

    fn versions(&self, ids: &[DocId]) -> Result<Vec<VersionDoc>> {
        Ok(by_ids(&self.read()?.versions, ids))
    }

    fn versions_by_subset(&self, subset_id: &str) -> Result<Vec<VersionDoc>> {
        let docs = self.read()?;
        let mut versions: Vec<VersionDoc> = docs
            .versions
            .values()
            .filter(|version| version.parent == subset_id && !version.is_hero())
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(versions)
    }

    fn hero_versions_by_subset(&self, subset_ids: &[DocId]) -> Result<Vec<VersionDoc>> {
        let docs = self.read()?;
        Ok(docs
            .versions
            .values()
            .filter(|version| version.is_hero() && subset_ids.contains(&version.parent))
            .cloned()
            .collect())
    }

    fn representations(&self, ids: &[DocId]) -> Result<Vec<RepresentationDoc>> {
        Ok(by_ids(&self.read()?.representations, ids))
    }

    fn representations_by_version(&self, version_ids: &[DocId]) -> Result<Vec<RepresentationDoc>> {
        let docs = self.read()?;
        let mut repres: Vec<RepresentationDoc> = docs
            .representations
            .values()
            .filter(|repre| version_ids.contains(&repre.parent))
            .cloned()
            .collect();
        repres.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(repres)
    }
}
