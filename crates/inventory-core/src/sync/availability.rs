//! File availability roll-up across the active and remote sites.
//!
//! A file's progress on a site is its explicit `progress` value, or 1.0 when
//! the site only records `created_dt`, or 0.0 when the site entry exists
//! with neither. Ratios are always kept within [0.0, 1.0].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::SyncSites;
use crate::models::{DocId, RepresentationDoc, RepresentationFile};

/// Availability of a group's files on one site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "ratio", rename_all = "snake_case")]
pub enum SiteAvailability {
    /// No file of the group is known to the site.
    Unavailable,
    Ratio(f64),
}

impl SiteAvailability {
    pub fn ratio(&self) -> Option<f64> {
        match self {
            SiteAvailability::Ratio(ratio) => Some(*ratio),
            SiteAvailability::Unavailable => None,
        }
    }

    /// Ratio as a whole percentage, rounded down.
    pub fn percent(&self) -> Option<u32> {
        self.ratio().map(|ratio| (ratio * 100.0).floor() as u32)
    }
}

impl fmt::Display for SiteAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(percent) => write!(f, "{}%", percent),
            None => write!(f, "N/A"),
        }
    }
}

/// Per-site availability of a container group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupAvailability {
    pub active: SiteAvailability,
    pub remote: SiteAvailability,
}

/// Progress of one file on `site`, or `None` when the site has no entry.
pub fn file_progress(file: &RepresentationFile, site: &str) -> Option<f64> {
    let entry = file.site(site)?;
    let progress = match (entry.progress, entry.created_dt) {
        (Some(progress), _) => progress,
        (None, Some(_)) => 1.0,
        (None, None) => 0.0,
    };
    Some(progress.clamp(0.0, 1.0))
}

/// Mean progress of the representation's files known to `site`.
pub fn representation_availability(repre: &RepresentationDoc, site: &str) -> SiteAvailability {
    mean(repre.files.iter().filter_map(|file| file_progress(file, site)))
}

/// Mean of the per-representation ratios, independently for each site.
///
/// Representations the site knows nothing about do not contribute; when no
/// representation contributes the site is reported unavailable.
pub fn group_availability(repres: &[&RepresentationDoc], sites: &SyncSites) -> GroupAvailability {
    let per_site = |site: &str| {
        mean(
            repres
                .iter()
                .filter_map(|repre| representation_availability(repre, site).ratio()),
        )
    };
    GroupAvailability {
        active: per_site(&sites.active_site),
        remote: per_site(&sites.remote_site),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> SiteAvailability {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return SiteAvailability::Unavailable;
    }
    SiteAvailability::Ratio((sum / count as f64).clamp(0.0, 1.0))
}

/// Representation availability summed per version, as shown by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VersionAvailability {
    pub repre_count: usize,
    /// Sum of per-representation availability ratios on the active site.
    pub avail_local: f64,
    pub avail_remote: f64,
}

impl VersionAvailability {
    /// "available/total" on the active site.
    pub fn local_display(&self) -> String {
        format!("{}/{}", self.avail_local.floor() as u64, self.repre_count)
    }

    /// "available/total" on the remote site.
    pub fn remote_display(&self) -> String {
        format!("{}/{}", self.avail_remote.floor() as u64, self.repre_count)
    }
}

/// Availability counts keyed by version id.
///
/// Only representations carrying sync records are counted. Within one
/// representation, files missing an entry for a site count as 0.0.
pub fn version_availability<'a>(
    repres: impl IntoIterator<Item = &'a RepresentationDoc>,
    sites: &SyncSites,
) -> HashMap<DocId, VersionAvailability> {
    let mut by_version: HashMap<DocId, VersionAvailability> = HashMap::new();
    for repre in repres.into_iter().filter(|r| r.has_site_records()) {
        let entry = by_version.entry(repre.parent.clone()).or_default();
        entry.repre_count += 1;
        entry.avail_local += file_mean(repre, &sites.active_site);
        entry.avail_remote += file_mean(repre, &sites.remote_site);
    }
    by_version
}

fn file_mean(repre: &RepresentationDoc, site: &str) -> f64 {
    if repre.files.is_empty() {
        return 0.0;
    }
    let sum: f64 = repre
        .files
        .iter()
        .map(|file| file_progress(file, site).unwrap_or(0.0))
        .sum();
    sum / repre.files.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repre(id: &str, parent: &str, files: serde_json::Value) -> RepresentationDoc {
        serde_json::from_value(json!({
            "_id": id, "parent": parent, "name": "abc", "files": files
        }))
        .unwrap()
    }

    fn sites() -> SyncSites {
        SyncSites::new("studio", "gdrive")
    }

    #[test]
    fn test_file_progress_rules() {
        let r = repre(
            "R1",
            "V1",
            json!([{"sites": [
                {"name": "studio", "created_dt": "2021-01-01T00:00:00Z"},
                {"name": "gdrive", "progress": 0.25},
                {"name": "sftp"}
            ]}]),
        );
        let file = &r.files[0];
        assert_eq!(file_progress(file, "studio"), Some(1.0));
        assert_eq!(file_progress(file, "gdrive"), Some(0.25));
        assert_eq!(file_progress(file, "sftp"), Some(0.0));
        assert_eq!(file_progress(file, "dropbox"), None);
    }

    #[test]
    fn test_progress_takes_precedence_and_is_clamped() {
        let r = repre(
            "R1",
            "V1",
            json!([{"sites": [
                {"name": "studio", "created_dt": "2021-01-01T00:00:00Z", "progress": 0.5},
                {"name": "gdrive", "progress": 3.0}
            ]}]),
        );
        assert_eq!(file_progress(&r.files[0], "studio"), Some(0.5));
        assert_eq!(file_progress(&r.files[0], "gdrive"), Some(1.0));
    }

    #[test]
    fn test_group_availability_mean() {
        let r1 = repre(
            "R1",
            "V1",
            json!([
                {"sites": [{"name": "studio", "created_dt": "2021-01-01T00:00:00Z"}]},
                {"sites": [{"name": "studio", "progress": 0.5}]}
            ]),
        );
        let r2 = repre(
            "R2",
            "V1",
            json!([{"sites": [{"name": "studio"}, {"name": "gdrive", "progress": 1.0}]}]),
        );

        let availability = group_availability(&[&r1, &r2], &sites());
        // R1 = (1.0 + 0.5) / 2 = 0.75, R2 = 0.0 -> 0.375
        assert_eq!(availability.active, SiteAvailability::Ratio(0.375));
        assert_eq!(availability.active.percent(), Some(37));
        // Only R2 knows gdrive
        assert_eq!(availability.remote, SiteAvailability::Ratio(1.0));
        assert_eq!(availability.remote.to_string(), "100%");
    }

    #[test]
    fn test_group_without_representations_is_unavailable() {
        let availability = group_availability(&[], &sites());
        assert_eq!(availability.active, SiteAvailability::Unavailable);
        assert_eq!(availability.remote, SiteAvailability::Unavailable);
        assert_eq!(availability.active.to_string(), "N/A");
    }

    #[test]
    fn test_site_without_records_is_unavailable() {
        let r = repre("R1", "V1", json!([{"path": "/a.abc"}]));
        let availability = group_availability(&[&r], &sites());
        assert_eq!(availability.active, SiteAvailability::Unavailable);
    }

    #[test]
    fn test_version_availability_counts() {
        let r1 = repre(
            "R1",
            "V1",
            json!([{"sites": [
                {"name": "studio", "created_dt": "2021-01-01T00:00:00Z"},
                {"name": "gdrive", "progress": 0.5}
            ]}]),
        );
        let r2 = repre(
            "R2",
            "V1",
            json!([
                {"sites": [{"name": "studio", "created_dt": "2021-01-01T00:00:00Z"}]},
                {"sites": [{"name": "gdrive", "created_dt": "2021-01-01T00:00:00Z"}]}
            ]),
        );
        let untracked = repre("R3", "V1", json!([{"path": "/b.abc"}]));

        let counts = version_availability([&r1, &r2, &untracked], &sites());
        let v1 = counts.get("V1").unwrap();
        assert_eq!(v1.repre_count, 2);
        assert_eq!(v1.avail_local, 1.5);
        assert_eq!(v1.avail_remote, 1.0);
        assert_eq!(v1.local_display(), "1/2");
        assert_eq!(v1.remote_display(), "1/2");
    }
}
