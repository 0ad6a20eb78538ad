//! Scene inventory model: the tree read interface plus version updates.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::aggregate::Aggregation;
use super::row::{Column, InventoryRow, RowKind};
use super::versions::VersionStatus;
use crate::error::{InventoryError, Result};
use crate::host::ContainerHost;
use crate::models::{Container, DocId, VersionDoc};
use crate::refresh::RefreshTicket;
use crate::tree::{BuildRequest, FilterRow, ItemId, NodeId, Tree, TreeBuilder, TreeFilter};

impl FilterRow for InventoryRow {
    fn label(&self) -> &str {
        &self.name
    }

    fn version_status(&self) -> VersionStatus {
        self.version
    }

    fn is_group_header(&self) -> bool {
        self.is_group()
    }
}

/// Resolve, aggregate and build a fresh inventory tree.
pub fn build_inventory(
    aggregation: &dyn Aggregation,
    host: &dyn ContainerHost,
    request: &BuildRequest,
    ticket: &RefreshTicket,
) -> Result<InventoryModel> {
    let containers = host.containers()?;
    ticket.check()?;

    let repre_ids: Vec<DocId> = containers.iter().map(|c| c.representation.clone()).collect();
    let states = aggregation.aggregate(&repre_ids, ticket)?;
    ticket.check()?;

    let tree = TreeBuilder::new(&states).build(containers, request, host);
    debug!(
        "Built inventory tree with {} rows (generation {})",
        tree.len(),
        ticket.generation()
    );
    Ok(InventoryModel::new(tree, request.uses_hierarchy()))
}

/// Owner of the inventory tree.
#[derive(Debug, Clone, Default)]
pub struct InventoryModel {
    tree: Tree<InventoryRow>,
    hierarchy_view: bool,
}

impl InventoryModel {
    pub fn new(tree: Tree<InventoryRow>, hierarchy_view: bool) -> Self {
        Self {
            tree,
            hierarchy_view,
        }
    }

    pub fn tree(&self) -> &Tree<InventoryRow> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn hierarchy_view(&self) -> bool {
        self.hierarchy_view
    }

    pub fn row_count(&self, parent: NodeId) -> usize {
        self.tree.row_count(parent)
    }

    pub fn child(&self, parent: NodeId, row: usize) -> Option<NodeId> {
        self.tree.child(parent, row)
    }

    /// Parent of `node`; `None` for top-level rows and the root.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree
            .parent(node)
            .filter(|parent| *parent != self.tree.root())
    }

    pub fn row(&self, node: NodeId) -> usize {
        self.tree.row(node)
    }

    pub fn item(&self, node: NodeId) -> Option<&InventoryRow> {
        self.tree.get(node)
    }

    /// Display text at (node, column).
    pub fn data(&self, node: NodeId, column: Column) -> Option<String> {
        self.tree.get(node).and_then(|row| row.display(column))
    }

    pub fn find(&self, item_id: ItemId) -> Option<NodeId> {
        self.tree.find(item_id)
    }

    /// Node for an item id, or `NodeNotFound`.
    pub fn node_for(&self, item_id: &str) -> Result<NodeId> {
        ItemId::parse(item_id)
            .and_then(|id| self.find(id))
            .ok_or_else(|| InventoryError::NodeNotFound {
                item_id: item_id.to_string(),
            })
    }

    /// Whether the row's loaded version differs from the highest one.
    pub fn outdated(&self, node: NodeId) -> bool {
        self.tree.get(node).map_or(false, InventoryRow::is_outdated)
    }

    /// Whether a group nested below `node` is outdated (hierarchy view only).
    pub fn child_outdated(&self, node: NodeId) -> bool {
        self.hierarchy_view
            && self.tree.descendants(node).into_iter().any(|n| {
                self.tree
                    .get(n)
                    .map_or(false, |row| row.is_group() && row.is_outdated())
            })
    }

    /// Containers of every outdated group, for "update all outdated".
    pub fn outdated_containers(&self) -> Vec<Container> {
        let mut output = Vec::new();
        for node in self.tree.descendants(self.tree.root()) {
            let Some(row) = self.tree.get(node) else {
                continue;
            };
            if row.kind != RowKind::Container || !row.is_outdated() {
                continue;
            }
            if let Some(container) = &row.container {
                output.push(container.clone());
            }
        }
        output
    }

    /// Nodes visible through `filter`, depth first.
    pub fn visible(&self, filter: &TreeFilter) -> Vec<NodeId> {
        filter.visible(&self.tree)
    }

    /// Show another version on a group row and its container rows.
    ///
    /// Hero versions must already carry their numbered version's data.
    pub fn set_version(&mut self, node: NodeId, version: &VersionDoc) -> Result<()> {
        let row = self.tree.get(node).ok_or_else(|| InventoryError::NodeNotFound {
            item_id: node.index().to_string(),
        })?;
        if row.kind != RowKind::Group {
            return Err(InventoryError::InvalidParams {
                message: format!("Row '{}' is not a representation group", row.name),
            });
        }
        let subset_id = row.subset_id.clone().unwrap_or_default();
        if version.parent != subset_id {
            return Err(InventoryError::VersionMismatch {
                version_id: version.id.clone(),
                subset_id,
            });
        }
        let name = version
            .version_name()
            .ok_or_else(|| InventoryError::InvalidParams {
                message: format!("Version {} has no version number", version.id),
            })?;

        let highest = match (row.version.highest, name.is_hero()) {
            (Some(highest), false) => Some(highest.max(name.number())),
            (None, false) => Some(name.number()),
            (highest, true) => highest,
        };
        let status = VersionStatus::new(Some(name), highest);

        let children = self.tree.children(node).to_vec();
        for target in std::iter::once(node).chain(children) {
            if let Some(row) = self.tree.get_mut(target) {
                row.version = status;
                row.version_id = Some(version.id.clone());
            }
        }
        info!("Set {} to {}", subset_id, name);
        Ok(())
    }

    /// Nested snapshot of the rows visible through `filter`.
    ///
    /// Site columns are only included when site sync is enabled.
    pub fn snapshot(&self, filter: &TreeFilter, sync_enabled: bool) -> Vec<RowSnapshot> {
        self.snapshot_children(self.tree.root(), filter, Column::visible(sync_enabled))
    }

    fn snapshot_children(
        &self,
        parent: NodeId,
        filter: &TreeFilter,
        columns: &[Column],
    ) -> Vec<RowSnapshot> {
        self.tree
            .children(parent)
            .iter()
            .filter(|node| filter.accepts(&self.tree, **node))
            .filter_map(|node| {
                let row = self.tree.get(*node)?;
                Some(RowSnapshot {
                    item_id: self.tree.item_id(*node)?.to_string(),
                    kind: row.kind,
                    columns: columns
                        .iter()
                        .filter_map(|column| Some((column.header(), row.display(*column)?)))
                        .collect(),
                    outdated: self.outdated(*node),
                    child_outdated: self.child_outdated(*node),
                    children: self.snapshot_children(*node, filter, columns),
                })
            })
            .collect()
    }
}

/// Serializable view of one row and its visible descendants.
#[derive(Debug, Clone, Serialize)]
pub struct RowSnapshot {
    pub item_id: String,
    pub kind: RowKind,
    pub columns: BTreeMap<&'static str, String>,
    pub outdated: bool,
    pub child_outdated: bool,
    pub children: Vec<RowSnapshot>,
}
