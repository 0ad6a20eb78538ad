//! Document store trait.

use std::collections::HashMap;

use crate::config::SyncSites;
use crate::error::Result;
use crate::models::{AssetDoc, DocId, RepresentationDoc, SubsetDoc, VersionDoc};
use crate::sync::{version_availability, VersionAvailability};

/// Read-only access to published documents.
///
/// Lookups by id return only the documents that exist; missing ids are
/// silently absent from the result. All operations are synchronous to match
/// rusqlite's API and are called from a blocking context when offloaded.
pub trait DocumentStore: Send + Sync {
    /// Assets with the given ids.
    fn assets(&self, ids: &[DocId]) -> Result<Vec<AssetDoc>>;

    /// Subsets with the given ids.
    fn subsets(&self, ids: &[DocId]) -> Result<Vec<SubsetDoc>>;

    /// All subsets published under the given assets.
    fn subsets_by_asset(&self, asset_ids: &[DocId]) -> Result<Vec<SubsetDoc>>;

    /// Versions (numbered and hero) with the given ids.
    fn versions(&self, ids: &[DocId]) -> Result<Vec<VersionDoc>>;

    /// Numbered versions of a subset, highest version number first.
    fn versions_by_subset(&self, subset_id: &str) -> Result<Vec<VersionDoc>>;

    /// Hero versions of the given subsets.
    fn hero_versions_by_subset(&self, subset_ids: &[DocId]) -> Result<Vec<VersionDoc>>;

    /// Representations with the given ids.
    fn representations(&self, ids: &[DocId]) -> Result<Vec<RepresentationDoc>>;

    /// All representations of the given versions.
    fn representations_by_version(&self, version_ids: &[DocId]) -> Result<Vec<RepresentationDoc>>;

    /// Highest numbered version of a subset.
    fn last_version(&self, subset_id: &str) -> Result<Option<VersionDoc>> {
        Ok(self.versions_by_subset(subset_id)?.into_iter().next())
    }

    /// Highest numbered version per subset.
    fn last_versions(&self, subset_ids: &[DocId]) -> Result<HashMap<DocId, VersionDoc>> {
        let mut output = HashMap::with_capacity(subset_ids.len());
        for subset_id in subset_ids {
            if let Some(version) = self.last_version(subset_id)? {
                output.insert(subset_id.clone(), version);
            }
        }
        Ok(output)
    }

    /// Per-site availability counts of the given versions' representations.
    fn version_availability(
        &self,
        version_ids: &[DocId],
        sites: &SyncSites,
    ) -> Result<HashMap<DocId, VersionAvailability>> {
        let repres = self.representations_by_version(version_ids)?;
        Ok(version_availability(&repres, sites))
    }
}
