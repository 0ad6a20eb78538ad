//! Subsets browser model.
//!
//! Rows are optional subset-group headers, merged rows for subsets of the
//! same name published on several assets, and one row per subset showing its
//! last version.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::fetch::{LastVersion, SubsetsPayload};
use crate::config::{LoaderConfig, SubsetGroupsConfig};
use crate::error::{InventoryError, Result};
use crate::models::{DocId, SubsetDoc, VersionDoc, VersionName};
use crate::sync::VersionAvailability;
use crate::tree::{sort_key, FilterRow, NodeId, SortRank, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsetRowKind {
    Group,
    Merged,
    Subset,
}

/// Loader display columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderColumn {
    Subset,
    Asset,
    Family,
    Version,
    Time,
    Author,
    Frames,
    Duration,
    Handles,
    Step,
    LocalAvailability,
    RemoteAvailability,
}

impl LoaderColumn {
    pub const ALL: [LoaderColumn; 12] = [
        LoaderColumn::Subset,
        LoaderColumn::Asset,
        LoaderColumn::Family,
        LoaderColumn::Version,
        LoaderColumn::Time,
        LoaderColumn::Author,
        LoaderColumn::Frames,
        LoaderColumn::Duration,
        LoaderColumn::Handles,
        LoaderColumn::Step,
        LoaderColumn::LocalAvailability,
        LoaderColumn::RemoteAvailability,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            LoaderColumn::Subset => "Subset",
            LoaderColumn::Asset => "Asset",
            LoaderColumn::Family => "Family",
            LoaderColumn::Version => "Version",
            LoaderColumn::Time => "Time",
            LoaderColumn::Author => "Author",
            LoaderColumn::Frames => "Frames",
            LoaderColumn::Duration => "Duration",
            LoaderColumn::Handles => "Handles",
            LoaderColumn::Step => "Step",
            LoaderColumn::LocalAvailability => "Local",
            LoaderColumn::RemoteAvailability => "Remote",
        }
    }
}

/// Version-dependent fields of a subset row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionFields {
    pub version_id: Option<DocId>,
    pub version: Option<VersionName>,
    pub is_from_latest: bool,
    pub family: Option<String>,
    pub families: BTreeSet<String>,
    pub author: Option<String>,
    pub time: Option<String>,
    pub frames: Option<String>,
    pub duration: Option<f64>,
    pub handles: Option<String>,
    pub step: Option<f64>,
    pub availability: Option<VersionAvailability>,
}

impl VersionFields {
    /// Display fields of `version` for a row of `subset`.
    pub fn from_version(subset: &SubsetDoc, version: &VersionDoc) -> Self {
        let data = &version.data;

        let handles = match (data.handle_start, data.handle_end) {
            (Some(start), Some(end)) => {
                Some(format!("{}-{}", format_number(start), format_number(end)))
            }
            _ => data.handles.map(format_number),
        };
        let (frames, duration) = match (data.frame_start, data.frame_end) {
            (Some(start), Some(end)) => (
                Some(format!("{}-{}", format_number(start), format_number(end))),
                Some(end - start + 1.0),
            ),
            _ => (None, None),
        };

        let families: Vec<String> = if subset.schema_major_version() < 3 {
            data.families.clone()
        } else {
            subset.data.families.clone()
        };
        let family = Some(subset.primary_family(version)).filter(|f| !f.is_empty());

        Self {
            version_id: Some(version.id.clone()),
            version: version.version_name(),
            is_from_latest: true,
            family,
            families: families.into_iter().collect(),
            author: data.author.clone(),
            time: data.time.clone(),
            frames,
            duration,
            handles,
            step: data.step,
            availability: None,
        }
    }
}

/// Format a frame number without superfluous zeros (1001.0 -> "1001").
pub fn format_number(value: f64) -> String {
    let text = format!("{:.6}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// One row of the subsets tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetRow {
    pub kind: SubsetRowKind,
    /// Subset column text.
    pub name: String,
    pub asset: Option<String>,
    pub subset: Option<SubsetDoc>,
    pub fields: VersionFields,
    /// Group rows: fixed-width order strings.
    pub order: Option<String>,
    pub inverse_order: Option<String>,
    pub icon: Option<String>,
    /// Merged rows: colour and the assets the subset is published on.
    pub color: Option<(u8, u8, u8)>,
    pub asset_ids: Vec<DocId>,
}

impl SubsetRow {
    fn header(kind: SubsetRowKind, name: String) -> Self {
        Self {
            kind,
            name,
            asset: None,
            subset: None,
            fields: VersionFields::default(),
            order: None,
            inverse_order: None,
            icon: None,
            color: None,
            asset_ids: Vec::new(),
        }
    }

    pub fn subset_id(&self) -> Option<&DocId> {
        self.subset.as_ref().map(|s| &s.id)
    }

    /// Whether the row shows a hero version pointing at an older version.
    pub fn is_stale_hero(&self) -> bool {
        self.fields.version.map_or(false, |v| v.is_hero()) && !self.fields.is_from_latest
    }

    pub fn display(&self, column: LoaderColumn) -> Option<String> {
        let fields = &self.fields;
        match column {
            LoaderColumn::Subset => Some(self.name.clone()),
            LoaderColumn::Asset => self.asset.clone(),
            LoaderColumn::Family => fields.family.clone(),
            LoaderColumn::Version => fields.version.map(|v| v.to_string()),
            LoaderColumn::Time => fields.time.clone(),
            LoaderColumn::Author => fields.author.clone(),
            LoaderColumn::Frames => fields.frames.clone(),
            LoaderColumn::Duration => fields.duration.map(format_number),
            LoaderColumn::Handles => fields.handles.clone(),
            LoaderColumn::Step => fields.step.map(format_number),
            LoaderColumn::LocalAvailability => fields.availability.map(|a| a.local_display()),
            LoaderColumn::RemoteAvailability => fields.availability.map(|a| a.remote_display()),
        }
    }
}

impl FilterRow for SubsetRow {
    fn label(&self) -> &str {
        &self.name
    }

    fn is_group_header(&self) -> bool {
        self.kind == SubsetRowKind::Group
    }
}

/// Tree of subsets for a set of assets.
#[derive(Debug, Clone, Default)]
pub struct SubsetsModel {
    tree: Tree<SubsetRow>,
    /// Highest numbered version id per subset id.
    latest: HashMap<DocId, DocId>,
}

impl SubsetsModel {
    /// Build the tree from fetched documents.
    ///
    /// With `grouping` enabled, subsets carrying a subset group are placed
    /// under that group's header row.
    pub fn build(payload: &SubsetsPayload, groups: &SubsetGroupsConfig, grouping: bool) -> Self {
        let mut by_group: BTreeMap<String, BTreeMap<String, Vec<&SubsetDoc>>> = BTreeMap::new();
        let mut ungrouped: BTreeMap<String, Vec<&SubsetDoc>> = BTreeMap::new();
        for subset in &payload.subsets {
            let group_name = subset
                .data
                .subset_group
                .as_ref()
                .filter(|name| grouping && !name.is_empty());
            let target = match group_name {
                Some(name) => by_group.entry(name.clone()).or_default(),
                None => &mut ungrouped,
            };
            target.entry(subset.name.clone()).or_default().push(subset);
        }

        let mut builder = Builder {
            tree: Tree::new(),
            payload,
            merged_count: 0,
        };
        let root = builder.tree.root();

        let ordered = groups.ordered_groups(by_group.keys().map(String::as_str));
        for group in ordered {
            let mut row = SubsetRow::header(SubsetRowKind::Group, group.name.clone());
            row.order = Some(group.order);
            row.inverse_order = Some(group.inverse_order);
            row.icon = group.icon;
            let node = builder.tree.add_child(root, row);
            if let Some(subsets) = by_group.get(&group.name) {
                builder.add_subsets(node, subsets);
            }
        }
        builder.add_subsets(root, &ungrouped);

        let latest = payload
            .last_versions
            .iter()
            .map(|(subset_id, last)| (subset_id.clone(), last.latest_id.clone()))
            .collect();
        Self {
            tree: builder.tree,
            latest,
        }
    }

    pub fn tree(&self) -> &Tree<SubsetRow> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn item(&self, node: NodeId) -> Option<&SubsetRow> {
        self.tree.get(node)
    }

    pub fn data(&self, node: NodeId, column: LoaderColumn) -> Option<String> {
        self.tree.get(node).and_then(|row| row.display(column))
    }

    /// Families of all subset rows.
    pub fn families(&self) -> BTreeSet<String> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .filter_map(|node| self.tree.get(node))
            .flat_map(|row| row.fields.families.iter().cloned())
            .collect()
    }

    /// Show another version of the row's subset.
    pub fn set_version(
        &mut self,
        node: NodeId,
        version: &VersionDoc,
        availability: Option<VersionAvailability>,
    ) -> Result<()> {
        let row = self
            .tree
            .get_mut(node)
            .ok_or_else(|| InventoryError::NodeNotFound {
                item_id: node.index().to_string(),
            })?;
        let Some(subset) = &row.subset else {
            return Err(InventoryError::InvalidParams {
                message: format!("Row '{}' is not a subset", row.name),
            });
        };
        if version.parent != subset.id {
            return Err(InventoryError::VersionMismatch {
                version_id: version.id.clone(),
                subset_id: subset.id.clone(),
            });
        }

        let mut fields = VersionFields::from_version(subset, version);
        fields.is_from_latest = self
            .latest
            .get(&subset.id)
            .map_or(true, |latest| version.numbered_id() == latest);
        fields.availability = availability;
        row.fields = fields;
        Ok(())
    }

    /// Sort key of a row for the given column and direction.
    pub fn sort_key(&self, node: NodeId, column: LoaderColumn, descending: bool) -> String {
        let Some(row) = self.tree.get(node) else {
            return String::new();
        };
        match row.kind {
            SubsetRowKind::Group => {
                let order = if descending {
                    &row.inverse_order
                } else {
                    &row.order
                };
                sort_key(SortRank::Group, order.as_deref().unwrap_or_default(), descending)
            }
            SubsetRowKind::Merged => sort_key(
                SortRank::Merged,
                &row.display(column).unwrap_or_default(),
                descending,
            ),
            SubsetRowKind::Subset => sort_key(
                SortRank::Item,
                &row.display(column).unwrap_or_default(),
                descending,
            ),
        }
    }
}

struct Builder<'a> {
    tree: Tree<SubsetRow>,
    payload: &'a SubsetsPayload,
    merged_count: usize,
}

impl Builder<'_> {
    fn add_subsets(&mut self, parent: NodeId, by_name: &BTreeMap<String, Vec<&SubsetDoc>>) {
        let payload = self.payload;
        for (name, subsets) in by_name {
            let parent = if subsets.len() > 1 {
                self.add_merged(parent, name, subsets)
            } else {
                parent
            };
            for subset in subsets {
                if let Some(last) = payload.last_versions.get(&subset.id) {
                    self.add_subset(parent, subset, last);
                }
            }
        }
    }

    fn add_merged(&mut self, parent: NodeId, name: &str, subsets: &[&SubsetDoc]) -> NodeId {
        let colors = &LoaderConfig::MERGED_SUBSET_COLORS;
        let mut row = SubsetRow::header(
            SubsetRowKind::Merged,
            format!("{} ({})", name, subsets.len()),
        );
        row.color = Some(colors[self.merged_count % colors.len()]);
        row.asset_ids = subsets.iter().map(|s| s.parent.clone()).collect();
        self.merged_count += 1;
        self.tree.add_child(parent, row)
    }

    fn add_subset(&mut self, parent: NodeId, subset: &SubsetDoc, last: &LastVersion) {
        let mut fields = VersionFields::from_version(subset, &last.version);
        fields.is_from_latest = last.is_from_latest;
        fields.availability = self.payload.availability.get(&last.version.id).copied();

        let row = SubsetRow {
            kind: SubsetRowKind::Subset,
            name: subset.name.clone(),
            asset: Some(
                self.payload
                    .assets_by_id
                    .get(&subset.parent)
                    .map(|asset| asset.name.clone())
                    .unwrap_or_else(|| subset.parent.clone()),
            ),
            subset: Some(subset.clone()),
            fields,
            order: None,
            inverse_order: None,
            icon: None,
            color: None,
            asset_ids: vec![subset.parent.clone()],
        };
        self.tree.add_child(parent, row);
    }
}
