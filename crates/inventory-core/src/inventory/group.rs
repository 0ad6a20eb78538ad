//! Containers grouped by representation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::resolver::{MissingLink, ResolvedChain};
use super::versions::VersionStatus;
use crate::models::{Container, DocId};
use crate::sync::GroupAvailability;

/// Display data of a resolved group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub label: String,
    pub asset_name: String,
    pub subset_name: String,
    pub subset_id: DocId,
    pub representation_name: String,
    pub version_id: DocId,
    pub family: String,
    pub subset_group: Option<String>,
    pub version: VersionStatus,
    pub availability: Option<GroupAvailability>,
}

impl GroupInfo {
    pub fn from_chain(
        chain: &ResolvedChain,
        highest: Option<i64>,
        availability: Option<GroupAvailability>,
    ) -> Self {
        Self {
            label: chain.group_label(),
            asset_name: chain.asset.name.clone(),
            subset_name: chain.subset.name.clone(),
            subset_id: chain.subset.id.clone(),
            representation_name: chain.representation.name.clone(),
            version_id: chain.version.id.clone(),
            family: chain.subset.primary_family(&chain.version),
            subset_group: chain.subset.data.subset_group.clone(),
            version: VersionStatus::new(chain.version_name(), highest),
            availability,
        }
    }
}

/// Aggregated state of one representation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GroupState {
    Resolved(Box<GroupInfo>),
    NotFound { missing: MissingLink },
}

impl GroupState {
    pub fn info(&self) -> Option<&GroupInfo> {
        match self {
            GroupState::Resolved(info) => Some(info),
            GroupState::NotFound { .. } => None,
        }
    }
}

/// Aggregated states keyed by representation id.
pub type GroupStates = HashMap<DocId, GroupState>;

/// All containers loaded from one representation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerGroup {
    pub representation_id: DocId,
    pub containers: Vec<Container>,
    pub state: GroupState,
}

impl ContainerGroup {
    pub fn is_valid(&self) -> bool {
        matches!(self.state, GroupState::Resolved(_))
    }

    pub fn is_outdated(&self) -> bool {
        self.state
            .info()
            .map(|info| info.version.is_outdated())
            .unwrap_or(false)
    }
}

/// Group containers by representation id, in ascending id order.
///
/// Representation ids absent from `states` are treated as missing.
pub fn group_containers(
    containers: impl IntoIterator<Item = Container>,
    states: &GroupStates,
) -> Vec<ContainerGroup> {
    let mut grouped: BTreeMap<DocId, Vec<Container>> = BTreeMap::new();
    for container in containers {
        grouped
            .entry(container.representation.clone())
            .or_default()
            .push(container);
    }

    grouped
        .into_iter()
        .map(|(representation_id, containers)| {
            let state = states
                .get(&representation_id)
                .cloned()
                .unwrap_or(GroupState::NotFound {
                    missing: MissingLink::Representation,
                });
            ContainerGroup {
                representation_id,
                containers,
                state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_representation() {
        let containers = vec![
            Container::new("b:CON", "b", "R2"),
            Container::new("a1:CON", "a1", "R1"),
            Container::new("a2:CON", "a2", "R1"),
        ];
        let groups = group_containers(containers, &GroupStates::new());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].representation_id, "R1");
        assert_eq!(groups[0].containers.len(), 2);
        assert_eq!(groups[0].containers[1].namespace, "a2");
        assert!(!groups[1].is_valid());
        assert!(!groups[1].is_outdated());
    }
}
