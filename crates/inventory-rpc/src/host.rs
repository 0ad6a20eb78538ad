//! Container host backed by a JSON dump of the scene.

use inventory_core::{Container, ContainerHost, InventoryError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scene dump written by a DCC integration.
///
/// Accepts either a bare list of containers or an object carrying the list
/// and whether parent/child links are populated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SceneDump {
    List(Vec<Container>),
    Scene {
        containers: Vec<Container>,
        #[serde(default)]
        hierarchical: bool,
    },
}

impl SceneDump {
    fn into_parts(self) -> (Vec<Container>, bool) {
        match self {
            SceneDump::List(containers) => (containers, false),
            SceneDump::Scene {
                containers,
                hierarchical,
            } => (containers, hierarchical),
        }
    }
}

/// Reads containers from a JSON file on every refresh.
///
/// A missing path yields an empty scene.
pub struct JsonFileHost {
    path: Option<PathBuf>,
}

impl JsonFileHost {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<(Vec<Container>, bool)> {
        let Some(path) = &self.path else {
            return Ok((Vec::new(), false));
        };
        load_dump(path)
    }
}

fn load_dump(path: &Path) -> Result<(Vec<Container>, bool)> {
    let content =
        std::fs::read_to_string(path).map_err(|e| InventoryError::io_with_path(e, path))?;
    let dump: SceneDump = serde_json::from_str(&content)?;
    let (containers, hierarchical) = dump.into_parts();
    debug!(
        "Loaded {} containers from {}",
        containers.len(),
        path.display()
    );
    Ok((containers, hierarchical))
}

impl ContainerHost for JsonFileHost {
    fn containers(&self) -> Result<Vec<Container>> {
        Ok(self.read()?.0)
    }

    fn update_hierarchy(&self, containers: Vec<Container>) -> Option<Vec<Container>> {
        match self.read() {
            Ok((_, true)) => Some(containers),
            Ok((_, false)) => None,
            Err(e) => {
                warn!("Failed to read container hierarchy, using flat view: {}", e);
                None
            }
        }
    }
}
