//! Loaded version versus highest published version.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::Result;
use crate::models::{DocId, VersionName};
use crate::refresh::RefreshTicket;
use crate::store::DocumentStore;

/// Loaded and highest version of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStatus {
    pub current: Option<VersionName>,
    /// Highest numbered version of the same subset.
    pub highest: Option<i64>,
}

impl VersionStatus {
    pub fn new(current: Option<VersionName>, highest: Option<i64>) -> Self {
        Self { current, highest }
    }

    /// Whether a newer (or different) numbered version is published.
    ///
    /// Hero versions are never outdated. When either side is unknown the
    /// status is not outdated.
    pub fn is_outdated(&self) -> bool {
        match (self.current, self.highest) {
            (Some(VersionName::Numbered(current)), Some(highest)) => current != highest,
            _ => false,
        }
    }

    /// Whether neither the loaded nor the highest version is known.
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.highest.is_none()
    }
}

/// Looks up the highest numbered version of subsets.
pub struct VersionAggregator<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> VersionAggregator<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Highest version number per subset id.
    ///
    /// Subsets without any numbered version are absent from the result.
    pub fn highest_versions(
        &self,
        subset_ids: &[DocId],
        ticket: &RefreshTicket,
    ) -> Result<HashMap<DocId, i64>> {
        let mut output = HashMap::with_capacity(subset_ids.len());
        for subset_id in subset_ids {
            ticket.check()?;
            if output.contains_key(subset_id) {
                continue;
            }
            if let Some(number) = self
                .store
                .last_version(subset_id)?
                .and_then(|version| version.name)
            {
                output.insert(subset_id.clone(), number);
            }
        }
        debug!("Found highest versions for {} subsets", output.len());
        Ok(output)
    }
}
