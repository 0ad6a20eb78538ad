//! Host application interface.

use std::sync::RwLock;

use crate::error::{InventoryError, Result};
use crate::models::Container;

/// Source of loaded containers.
///
/// Implemented by host integrations (or an adapter that talks to one).
pub trait ContainerHost: Send + Sync {
    /// All containers currently loaded in the scene.
    fn containers(&self) -> Result<Vec<Container>>;

    /// Fill in `parent`/`children` containment links.
    ///
    /// Returns `None` when the host has no notion of nested containers, in
    /// which case hierarchy view falls back to a flat list of the selection.
    fn update_hierarchy(&self, containers: Vec<Container>) -> Option<Vec<Container>> {
        let _ = containers;
        None
    }
}

/// Host backed by an injected list of containers.
#[derive(Debug, Default)]
pub struct StaticHost {
    containers: RwLock<Vec<Container>>,
    hierarchical: bool,
}

impl StaticHost {
    pub fn new(containers: Vec<Container>) -> Self {
        Self {
            containers: RwLock::new(containers),
            hierarchical: false,
        }
    }

    /// Report containment links as given on the containers.
    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    /// Replace the loaded containers.
    pub fn set_containers(&self, containers: Vec<Container>) -> Result<()> {
        let mut guard = self
            .containers
            .write()
            .map_err(|_| InventoryError::Other("Container list lock poisoned".to_string()))?;
        *guard = containers;
        Ok(())
    }
}

impl ContainerHost for StaticHost {
    fn containers(&self) -> Result<Vec<Container>> {
        self.containers
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| InventoryError::Other("Container list lock poisoned".to_string()))
    }

    fn update_hierarchy(&self, containers: Vec<Container>) -> Option<Vec<Container>> {
        self.hierarchical.then_some(containers)
    }
}
