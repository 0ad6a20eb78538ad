//! Builds the inventory tree from containers and their aggregated states.
//!
//! Flat mode puts one group row per representation at the top level. In
//! hierarchy mode the selected containers are nested under the container
//! rows of their host-declared parents.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::node::{NodeId, Tree};
use crate::host::ContainerHost;
use crate::inventory::{group_containers, GroupState, GroupStates, InventoryRow, MissingLink};
use crate::models::Container;

/// What a refresh should show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Object names of selected containers.
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub hierarchy_view: bool,
}

impl BuildRequest {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn hierarchy<I, S>(selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: selected.into_iter().map(Into::into).collect(),
            hierarchy_view: true,
        }
    }

    /// Hierarchy mode needs both the flag and a selection.
    pub fn uses_hierarchy(&self) -> bool {
        self.hierarchy_view && !self.selected.is_empty()
    }
}

/// Builds inventory trees for one set of aggregated states.
pub struct TreeBuilder<'a> {
    states: &'a GroupStates,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(states: &'a GroupStates) -> Self {
        Self { states }
    }

    pub fn build(
        &self,
        containers: Vec<Container>,
        request: &BuildRequest,
        host: &dyn ContainerHost,
    ) -> Tree<InventoryRow> {
        let mut tree = Tree::new();
        let root = tree.root();

        if !request.uses_hierarchy() {
            self.add_containers(&mut tree, root, containers);
            return tree;
        }

        match host.update_hierarchy(containers.clone()) {
            Some(linked) => self.add_hierarchy(&mut tree, linked, &request.selected),
            None => {
                debug!("Host has no container hierarchy, listing selection only");
                let selected: HashSet<&String> = request.selected.iter().collect();
                let picked = containers
                    .into_iter()
                    .filter(|c| selected.contains(&c.object_name))
                    .collect();
                self.add_containers(&mut tree, root, picked);
            }
        }
        tree
    }

    /// Add group rows for `containers` under `parent`.
    ///
    /// Not-found groups come first, one per missing link in order of first
    /// appearance, followed by resolved groups in representation id order.
    /// Returns the container rows with their object names.
    pub fn add_containers(
        &self,
        tree: &mut Tree<InventoryRow>,
        parent: NodeId,
        containers: Vec<Container>,
    ) -> Vec<(NodeId, String)> {
        let groups = group_containers(containers, self.states);

        let mut not_found: Vec<(MissingLink, Vec<Container>)> = Vec::new();
        let mut resolved = Vec::new();
        for group in groups {
            match group.state {
                GroupState::NotFound { missing } => {
                    match not_found.iter_mut().find(|(link, _)| *link == missing) {
                        Some((_, containers)) => containers.extend(group.containers),
                        None => not_found.push((missing, group.containers)),
                    }
                }
                GroupState::Resolved(_) => resolved.push(group),
            }
        }

        let mut container_rows = Vec::new();
        for (missing, containers) in not_found {
            let header = tree.add_child(
                parent,
                InventoryRow::not_found_group(missing, containers.len()),
            );
            for container in containers {
                let object_name = container.object_name.clone();
                let node = tree.add_child(header, InventoryRow::not_found_container(container));
                container_rows.push((node, object_name));
            }
        }

        for group in resolved {
            let (header_row, rows) = InventoryRow::from_group(group);
            let header = tree.add_child(parent, header_row);
            for row in rows {
                let object_name = row.object_name().unwrap_or_default().to_string();
                let node = tree.add_child(header, row);
                container_rows.push((node, object_name));
            }
        }
        container_rows
    }

    fn add_hierarchy(
        &self,
        tree: &mut Tree<InventoryRow>,
        linked: Vec<Container>,
        selected: &[String],
    ) {
        let by_name: HashMap<String, Container> = linked
            .into_iter()
            .map(|c| (c.object_name.clone(), c))
            .collect();

        let mut items = collect_selection(&by_name, selected);
        let picked: HashSet<String> = items.iter().map(|c| c.object_name.clone()).collect();
        for item in &mut items {
            if item.parent.as_ref().map_or(false, |p| !picked.contains(p)) {
                item.parent = None;
            }
        }

        let mut parents: Vec<(Option<String>, NodeId)> = vec![(None, tree.root())];
        let maximum_loop = items.len();
        let mut count = 0;
        while !items.is_empty() {
            if count > maximum_loop {
                warn!(
                    "Maximum loop count reached, dropping {} containers with unreachable parents",
                    items.len()
                );
                break;
            }

            let mut next_parents = Vec::new();
            for (parent_name, parent_node) in &parents {
                let (children, rest): (Vec<_>, Vec<_>) = items
                    .into_iter()
                    .partition(|item| item.parent == *parent_name);
                items = rest;
                for (node, object_name) in self.add_containers(tree, *parent_node, children) {
                    next_parents.push((Some(object_name), node));
                }
            }
            parents = next_parents;
            count += 1;
        }
    }
}

/// Selected containers extended with their transitive children, depth first.
fn collect_selection(by_name: &HashMap<String, Container>, selected: &[String]) -> Vec<Container> {
    let mut visited = HashSet::new();
    let mut output = Vec::new();
    let mut stack: Vec<&String> = selected.iter().rev().collect();

    while let Some(name) = stack.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(container) = by_name.get(name) else {
            warn!("Selected container not found in scene: {}", name);
            continue;
        };
        output.push(container.clone());
        stack.extend(container.children.iter().rev());
    }
    output
}
