//! Centralized configuration for the inventory core.
//!
//! Constants for labels and palettes, plus the serde-loadable settings that
//! hosts pass in: site sync configuration and subset group ordering.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{InventoryError, Result};

/// Scene inventory labels and limits.
pub struct InventoryConfig;

impl InventoryConfig {
    pub const NOT_FOUND_LABEL_PREFIX: &'static str = "< NOT FOUND - ";
    pub const NOT_FOUND_LABEL_SUFFIX: &'static str = " >";
    pub const NO_NAME: &'static str = "NO NAME";
    pub const STUDIO_SITE: &'static str = "studio";
    pub const DEFAULT_SUBSET_SCHEMA: &'static str = "openpype:subset-3.0";
    /// Subset schema major version from which the family lives on the subset.
    pub const SUBSET_FAMILY_SCHEMA_MAJOR: u32 = 3;
}

/// Loader (subsets browser) presentation constants.
pub struct LoaderConfig;

impl LoaderConfig {
    /// Colours cycled across merged multi-asset subset rows.
    pub const MERGED_SUBSET_COLORS: [(u8, u8, u8); 10] = [
        (55, 161, 222),  // Light Blue
        (231, 176, 0),   // Yellow
        (154, 13, 255),  // Purple
        (130, 184, 30),  // Light Green
        (211, 79, 63),   // Light Red
        (179, 181, 182), // Grey
        (194, 57, 179),  // Pink
        (0, 120, 215),   // Dark Blue
        (0, 204, 106),   // Dark Green
        (247, 99, 12),   // Orange
    ];
    /// Order assigned to subset groups missing from the groups config.
    pub const DEFAULT_GROUP_ORDER: i32 = 0;
}

/// Names and providers of the two sites tracked for file availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncSites {
    pub active_site: String,
    pub remote_site: String,
    pub active_provider: String,
    pub remote_provider: String,
}

impl SyncSites {
    /// Sites whose provider is inferred from the site name.
    ///
    /// The studio site is always served by the "studio" provider; any other
    /// site is assumed to be named after its provider.
    pub fn new(active_site: impl Into<String>, remote_site: impl Into<String>) -> Self {
        let active_site = active_site.into();
        let remote_site = remote_site.into();
        Self {
            active_provider: Self::default_provider(&active_site),
            remote_provider: Self::default_provider(&remote_site),
            active_site,
            remote_site,
        }
    }

    /// Override the providers (e.g. "gdrive" for a site named "cloud").
    pub fn with_providers(
        mut self,
        active_provider: impl Into<String>,
        remote_provider: impl Into<String>,
    ) -> Self {
        self.active_provider = active_provider.into();
        self.remote_provider = remote_provider.into();
        self
    }

    fn default_provider(site: &str) -> String {
        if site == InventoryConfig::STUDIO_SITE {
            InventoryConfig::STUDIO_SITE.to_string()
        } else {
            site.to_string()
        }
    }
}

/// Site sync configuration for a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SiteSyncConfig {
    #[default]
    Disabled,
    Enabled(SyncSites),
}

impl SiteSyncConfig {
    pub fn enabled(active_site: impl Into<String>, remote_site: impl Into<String>) -> Self {
        SiteSyncConfig::Enabled(SyncSites::new(active_site, remote_site))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SiteSyncConfig::Enabled(_))
    }

    pub fn sites(&self) -> Option<&SyncSites> {
        match self {
            SiteSyncConfig::Enabled(sites) => Some(sites),
            SiteSyncConfig::Disabled => None,
        }
    }
}

/// A configured subset group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetGroupDef {
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A subset group placed in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedGroup {
    pub name: String,
    pub icon: Option<String>,
    pub order: String,
    pub inverse_order: String,
}

/// Ordering and icons for subset groups in the loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubsetGroupsConfig {
    #[serde(default)]
    pub groups: Vec<SubsetGroupDef>,
}

impl SubsetGroupsConfig {
    /// Load the groups config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| InventoryError::io_with_path(e, path))?;
        serde_json::from_str(&content).map_err(|e| InventoryError::Config {
            message: format!("Invalid subset groups config {}: {}", path.display(), e),
        })
    }

    /// Definition for a group name, falling back to the default order.
    pub fn group(&self, name: &str) -> SubsetGroupDef {
        self.by_name().remove(name).unwrap_or_else(|| SubsetGroupDef {
            name: name.to_string(),
            order: LoaderConfig::DEFAULT_GROUP_ORDER,
            icon: None,
        })
    }

    /// Order the given group names for display.
    ///
    /// Groups sort by configured order, then by name. Each gets fixed-width
    /// ascending and inverse order strings for use as sort keys.
    pub fn ordered_groups<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<OrderedGroup> {
        let mut defs: Vec<SubsetGroupDef> = names.into_iter().map(|name| self.group(name)).collect();
        defs.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        defs.dedup_by(|a, b| a.name == b.name);

        let total = defs.len();
        let width = total.to_string().len();
        defs.into_iter()
            .enumerate()
            .map(|(index, def)| OrderedGroup {
                name: def.name,
                icon: def.icon,
                order: format!("{:0width$}", index, width = width),
                inverse_order: format!("{:0width$}", total - index, width = width),
            })
            .collect()
    }

    fn by_name(&self) -> HashMap<&str, SubsetGroupDef> {
        self.groups
            .iter()
            .map(|group| (group.name.as_str(), group.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sync_sites_default_providers() {
        let sites = SyncSites::new("studio", "gdrive");
        assert_eq!(sites.active_provider, "studio");
        assert_eq!(sites.remote_provider, "gdrive");

        let sites = SyncSites::new("local", "cloud").with_providers("local_drive", "sftp");
        assert_eq!(sites.active_provider, "local_drive");
        assert_eq!(sites.remote_provider, "sftp");
    }

    #[test]
    fn test_site_sync_config_serde() {
        let config: SiteSyncConfig = serde_json::from_str(r#"{"mode": "disabled"}"#).unwrap();
        assert!(!config.is_enabled());

        let config = SiteSyncConfig::enabled("studio", "gdrive");
        let json = serde_json::to_string(&config).unwrap();
        let back: SiteSyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.sites().unwrap().remote_site, "gdrive");
    }

    #[test]
    fn test_groups_config_fallback() {
        let config = SubsetGroupsConfig {
            groups: vec![SubsetGroupDef {
                name: "lookdev".into(),
                order: 5,
                icon: Some("fa.paint-brush".into()),
            }],
        };
        assert_eq!(config.group("lookdev").order, 5);
        assert_eq!(config.group("fx").order, LoaderConfig::DEFAULT_GROUP_ORDER);
    }

    #[test]
    fn test_ordered_groups() {
        let config = SubsetGroupsConfig {
            groups: vec![
                SubsetGroupDef {
                    name: "layout".into(),
                    order: -10,
                    icon: None,
                },
                SubsetGroupDef {
                    name: "fx".into(),
                    order: 10,
                    icon: None,
                },
            ],
        };
        let ordered = config.ordered_groups(["fx", "anim", "layout", "cache", "anim"]);
        let names: Vec<_> = ordered.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["layout", "anim", "cache", "fx"]);
        assert_eq!(ordered[0].order, "0");
        assert_eq!(ordered[0].inverse_order, "4");
        assert_eq!(ordered[3].order, "3");
    }

    #[test]
    fn test_groups_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("groups.json");
        std::fs::write(&path, r#"{"groups": [{"name": "anim", "order": -1}]}"#).unwrap();

        let config = SubsetGroupsConfig::from_json_file(&path).unwrap();
        assert_eq!(config.group("anim").order, -1);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SubsetGroupsConfig::from_json_file(&path),
            Err(InventoryError::Config { .. })
        ));
    }
}
