//! Published document types: asset, subset, version, representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::InventoryConfig;

/// Opaque document identifier.
pub type DocId = String;

/// Root of one branch of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDoc {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetData {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub subset_group: Option<String>,
}

/// A named product published under an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetDoc {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub parent: DocId,
    pub name: String,
    #[serde(default = "default_subset_schema")]
    pub schema: String,
    #[serde(default)]
    pub data: SubsetData,
}

fn default_subset_schema() -> String {
    InventoryConfig::DEFAULT_SUBSET_SCHEMA.to_string()
}

impl SubsetDoc {
    /// Major version of the document schema ("openpype:subset-3.0" -> 3).
    pub fn schema_major_version(&self) -> u32 {
        schema_major_version(&self.schema)
    }

    /// Primary family, read from the subset or (old schemas) the version.
    pub fn primary_family(&self, version: &VersionDoc) -> String {
        let (family, families) = if self.schema_major_version()
            < InventoryConfig::SUBSET_FAMILY_SCHEMA_MAJOR
        {
            (&version.data.family, &version.data.families)
        } else {
            (&self.data.family, &self.data.families)
        };
        family
            .clone()
            .filter(|f| !f.is_empty())
            .or_else(|| families.first().cloned())
            .unwrap_or_default()
    }
}

/// Parse the major number out of a schema string like "openpype:subset-3.0".
pub fn schema_major_version(schema: &str) -> u32 {
    schema
        .rsplit('-')
        .next()
        .and_then(|version| version.split('.').next())
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}

/// Document type of a version record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Version,
    HeroVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionData {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, alias = "startFrame")]
    pub frame_start: Option<f64>,
    #[serde(default, alias = "endFrame")]
    pub frame_end: Option<f64>,
    #[serde(default)]
    pub handle_start: Option<f64>,
    #[serde(default)]
    pub handle_end: Option<f64>,
    #[serde(default)]
    pub handles: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
}

/// A published version, or a hero version aliasing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDoc {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub parent: DocId,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    /// Version number. Hero versions carry none until overlaid.
    #[serde(default)]
    pub name: Option<i64>,
    /// Underlying numbered version of a hero version.
    #[serde(default)]
    pub version_id: Option<DocId>,
    #[serde(default)]
    pub data: VersionData,
}

impl VersionDoc {
    pub fn is_hero(&self) -> bool {
        self.version_type == VersionType::HeroVersion
    }

    /// Copy number and data from the numbered version a hero points at.
    pub fn overlay_from(&mut self, numbered: &VersionDoc) {
        self.name = numbered.name;
        self.data = numbered.data.clone();
    }

    /// Id of the numbered version this document shows: the hero's target,
    /// or the document itself.
    pub fn numbered_id(&self) -> &DocId {
        match &self.version_id {
            Some(pointed) if self.is_hero() => pointed,
            _ => &self.id,
        }
    }

    /// Display version, if the document carries a number.
    pub fn version_name(&self) -> Option<VersionName> {
        let number = self.name?;
        Some(if self.is_hero() {
            VersionName::Hero(number)
        } else {
            VersionName::Numbered(number)
        })
    }
}

/// Resolved version of a loaded item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum VersionName {
    Numbered(i64),
    /// Hero version tracking the given numbered version.
    Hero(i64),
}

impl VersionName {
    pub fn number(&self) -> i64 {
        match self {
            VersionName::Numbered(n) | VersionName::Hero(n) => *n,
        }
    }

    pub fn is_hero(&self) -> bool {
        matches!(self, VersionName::Hero(_))
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionName::Numbered(n) => write!(f, "v{:03}", n),
            VersionName::Hero(n) => write!(f, "[v{:03}]", n),
        }
    }
}

/// Sync record of one file on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSite {
    pub name: String,
    #[serde(default)]
    pub created_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepresentationFile {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sites: Vec<FileSite>,
}

impl RepresentationFile {
    pub fn site(&self, name: &str) -> Option<&FileSite> {
        self.sites.iter().find(|site| site.name == name)
    }
}

/// A file-format rendition of a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationDoc {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub parent: DocId,
    pub name: String,
    #[serde(default)]
    pub files: Vec<RepresentationFile>,
}

impl RepresentationDoc {
    /// Whether any file carries sync records.
    pub fn has_site_records(&self) -> bool {
        self.files.iter().any(|file| !file.sites.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_major_version() {
        assert_eq!(schema_major_version("openpype:subset-3.0"), 3);
        assert_eq!(schema_major_version("avalon-core:subset-2.0"), 2);
        assert_eq!(schema_major_version("garbage"), 0);
    }

    #[test]
    fn test_primary_family_by_schema() {
        let version: VersionDoc = serde_json::from_value(json!({
            "_id": "V1", "parent": "S1", "type": "version", "name": 1,
            "data": {"families": ["pointcache", "animation"]}
        }))
        .unwrap();

        let old: SubsetDoc = serde_json::from_value(json!({
            "_id": "S1", "parent": "A1", "name": "animMain",
            "schema": "avalon-core:subset-2.0",
            "data": {"families": ["review"]}
        }))
        .unwrap();
        assert_eq!(old.primary_family(&version), "pointcache");

        let new: SubsetDoc = serde_json::from_value(json!({
            "_id": "S1", "parent": "A1", "name": "animMain",
            "data": {"family": "animation", "families": ["review"]}
        }))
        .unwrap();
        assert_eq!(new.primary_family(&version), "animation");

        let bare: SubsetDoc = serde_json::from_value(json!({
            "_id": "S1", "parent": "A1", "name": "animMain"
        }))
        .unwrap();
        assert_eq!(bare.primary_family(&version), "");
    }

    #[test]
    fn test_hero_version_overlay() {
        let mut hero: VersionDoc = serde_json::from_value(json!({
            "_id": "H1", "parent": "S1", "type": "hero_version", "version_id": "V2"
        }))
        .unwrap();
        assert!(hero.is_hero());
        assert_eq!(hero.version_name(), None);

        let numbered: VersionDoc = serde_json::from_value(json!({
            "_id": "V2", "parent": "S1", "type": "version", "name": 2,
            "data": {"author": "jane", "startFrame": 1001.0}
        }))
        .unwrap();
        hero.overlay_from(&numbered);

        assert_eq!(hero.version_name(), Some(VersionName::Hero(2)));
        assert_eq!(hero.data.author.as_deref(), Some("jane"));
        assert_eq!(hero.data.frame_start, Some(1001.0));
    }

    #[test]
    fn test_version_name_display() {
        assert_eq!(VersionName::Numbered(3).to_string(), "v003");
        assert_eq!(VersionName::Hero(12).to_string(), "[v012]");
        assert_eq!(VersionName::Hero(12).number(), 12);
    }

    #[test]
    fn test_representation_sites() {
        let repre: RepresentationDoc = serde_json::from_value(json!({
            "_id": "R1", "parent": "V1", "name": "abc",
            "files": [{"path": "/a.abc", "sites": [
                {"name": "studio", "created_dt": "2021-03-01T10:00:00Z"},
                {"name": "gdrive", "progress": 0.5}
            ]}]
        }))
        .unwrap();
        assert!(repre.has_site_records());
        assert!(repre.files[0].site("studio").unwrap().created_dt.is_some());
        assert_eq!(repre.files[0].site("gdrive").unwrap().progress, Some(0.5));
        assert!(repre.files[0].site("sftp").is_none());
    }
}
