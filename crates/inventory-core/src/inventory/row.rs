//! Typed rows of the scene inventory tree.

use serde::{Deserialize, Serialize};

use super::group::{ContainerGroup, GroupInfo, GroupState};
use super::resolver::MissingLink;
use super::versions::VersionStatus;
use crate::config::InventoryConfig;
use crate::models::{Container, DocId};
use crate::sync::GroupAvailability;

/// Kind of an inventory row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Header of the containers loaded from one representation.
    Group,
    /// Header of the containers sharing one missing link.
    NotFoundGroup,
    Container,
    /// Container whose representation could not be resolved.
    NotFoundContainer,
}

/// Display columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Version,
    Count,
    Family,
    Group,
    Loader,
    ObjectName,
    ActiveSite,
    RemoteSite,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Name,
        Column::Version,
        Column::Count,
        Column::Family,
        Column::Group,
        Column::Loader,
        Column::ObjectName,
        Column::ActiveSite,
        Column::RemoteSite,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::Version => "Version",
            Column::Count => "Count",
            Column::Family => "Family",
            Column::Group => "Group",
            Column::Loader => "Loader",
            Column::ObjectName => "Object name",
            Column::ActiveSite => "Active site",
            Column::RemoteSite => "Remote site",
        }
    }

    /// Columns shown for the given sync state.
    pub fn visible(sync_enabled: bool) -> &'static [Column] {
        if sync_enabled {
            &Self::ALL
        } else {
            &Self::ALL[..7]
        }
    }
}

/// One row of the inventory tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub kind: RowKind,
    pub name: String,
    pub representation_id: Option<DocId>,
    pub version_id: Option<DocId>,
    pub subset_id: Option<DocId>,
    pub version: VersionStatus,
    pub family: String,
    pub subset_group: Option<String>,
    /// Number of containers under a group row.
    pub count: usize,
    pub availability: Option<GroupAvailability>,
    /// Source container of container rows.
    pub container: Option<Container>,
}

impl InventoryRow {
    pub fn group(repre_id: &str, info: &GroupInfo, count: usize) -> Self {
        Self {
            kind: RowKind::Group,
            name: info.label.clone(),
            representation_id: Some(repre_id.to_string()),
            version_id: Some(info.version_id.clone()),
            subset_id: Some(info.subset_id.clone()),
            version: info.version,
            family: info.family.clone(),
            subset_group: info.subset_group.clone(),
            count,
            availability: info.availability,
            container: None,
        }
    }

    /// Container row under a resolved group, named by namespace.
    pub fn container(container: Container, info: &GroupInfo) -> Self {
        Self {
            kind: RowKind::Container,
            name: container.namespace.clone(),
            representation_id: Some(container.representation.clone()),
            version_id: Some(info.version_id.clone()),
            subset_id: Some(info.subset_id.clone()),
            version: info.version,
            family: info.family.clone(),
            subset_group: info.subset_group.clone(),
            count: 0,
            availability: None,
            container: Some(container),
        }
    }

    pub fn not_found_group(missing: MissingLink, count: usize) -> Self {
        Self {
            kind: RowKind::NotFoundGroup,
            name: missing.group_label(),
            representation_id: None,
            version_id: None,
            subset_id: None,
            version: VersionStatus::default(),
            family: String::new(),
            subset_group: None,
            count,
            availability: None,
            container: None,
        }
    }

    /// Container row under a not-found group, named by object name.
    pub fn not_found_container(container: Container) -> Self {
        let name = if container.object_name.is_empty() {
            InventoryConfig::NO_NAME.to_string()
        } else {
            container.object_name.clone()
        };
        Self {
            kind: RowKind::NotFoundContainer,
            name,
            representation_id: Some(container.representation.clone()),
            version_id: None,
            subset_id: None,
            version: VersionStatus::default(),
            family: String::new(),
            subset_group: None,
            count: 0,
            availability: None,
            container: Some(container),
        }
    }

    /// Rows for a group: the header first, then one row per container.
    pub fn from_group(group: ContainerGroup) -> (Self, Vec<Self>) {
        let count = group.containers.len();
        match group.state {
            GroupState::Resolved(info) => (
                Self::group(&group.representation_id, &info, count),
                group
                    .containers
                    .into_iter()
                    .map(|c| Self::container(c, &info))
                    .collect(),
            ),
            GroupState::NotFound { missing } => (
                Self::not_found_group(missing, count),
                group
                    .containers
                    .into_iter()
                    .map(Self::not_found_container)
                    .collect(),
            ),
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == RowKind::Group
    }

    pub fn is_outdated(&self) -> bool {
        self.version.is_outdated()
    }

    pub fn object_name(&self) -> Option<&str> {
        self.container.as_ref().map(|c| c.object_name.as_str())
    }

    /// Display text of a column, `None` when the row has no value for it.
    pub fn display(&self, column: Column) -> Option<String> {
        match column {
            Column::Name => Some(self.name.clone()),
            Column::Version => self.version.current.map(|v| v.to_string()),
            Column::Count => match self.kind {
                RowKind::Group | RowKind::NotFoundGroup => Some(self.count.to_string()),
                _ => None,
            },
            Column::Family => (!self.family.is_empty()).then(|| self.family.clone()),
            Column::Group => self.subset_group.clone(),
            Column::Loader => self.container.as_ref().and_then(|c| c.loader.clone()),
            Column::ObjectName => self.object_name().map(str::to_string),
            Column::ActiveSite => self.availability.map(|a| a.active.to_string()),
            Column::RemoteSite => self.availability.map(|a| a.remote.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionName;
    use crate::sync::SiteAvailability;

    fn info() -> GroupInfo {
        GroupInfo {
            label: "chair_modelMain: (abc)".into(),
            asset_name: "chair".into(),
            subset_name: "modelMain".into(),
            subset_id: "S1".into(),
            representation_name: "abc".into(),
            version_id: "V3".into(),
            family: "model".into(),
            subset_group: None,
            version: VersionStatus::new(Some(VersionName::Numbered(3)), Some(5)),
            availability: Some(GroupAvailability {
                active: SiteAvailability::Ratio(0.5),
                remote: SiteAvailability::Unavailable,
            }),
        }
    }

    #[test]
    fn test_group_rows() {
        let group = ContainerGroup {
            representation_id: "R1".into(),
            containers: vec![
                Container::new("l1:CON", "load1", "R1").with_loader("ReferenceLoader"),
                Container::new("l2:CON", "load2", "R1"),
            ],
            state: GroupState::Resolved(Box::new(info())),
        };
        let (header, children) = InventoryRow::from_group(group);

        assert_eq!(header.display(Column::Name).unwrap(), "chair_modelMain: (abc)");
        assert_eq!(header.display(Column::Version).unwrap(), "v003");
        assert_eq!(header.display(Column::Count).unwrap(), "2");
        assert_eq!(header.display(Column::ActiveSite).unwrap(), "50%");
        assert_eq!(header.display(Column::RemoteSite).unwrap(), "N/A");
        assert!(header.is_outdated());

        assert_eq!(children[0].name, "load1");
        assert_eq!(children[0].display(Column::Loader).unwrap(), "ReferenceLoader");
        assert_eq!(children[1].display(Column::ObjectName).unwrap(), "l2:CON");
        assert_eq!(children[1].display(Column::Count), None);
    }

    #[test]
    fn test_not_found_rows() {
        let group = ContainerGroup {
            representation_id: "R9".into(),
            containers: vec![Container::new("", "lost", "R9")],
            state: GroupState::NotFound {
                missing: MissingLink::Subset,
            },
        };
        let (header, children) = InventoryRow::from_group(group);

        assert_eq!(header.name, "< NOT FOUND - subset >");
        assert_eq!(header.kind, RowKind::NotFoundGroup);
        assert!(header.version.is_empty());
        assert_eq!(children[0].name, "NO NAME");
        assert!(!children[0].is_outdated());
    }

    #[test]
    fn test_visible_columns() {
        assert_eq!(Column::visible(false).len(), 7);
        assert_eq!(Column::visible(true).last(), Some(&Column::RemoteSite));
    }
}
