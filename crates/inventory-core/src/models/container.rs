//! Loaded-item descriptors supplied by host applications.

use serde::{Deserialize, Serialize};

use super::documents::DocId;

/// A container loaded into a host scene.
///
/// `parent` and `children` are containment links by `object_name`. They are
/// only populated by hosts that support hierarchical containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub object_name: String,
    #[serde(default)]
    pub namespace: String,
    pub representation: DocId,
    #[serde(default)]
    pub loader: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl Container {
    pub fn new(
        object_name: impl Into<String>,
        namespace: impl Into<String>,
        representation: impl Into<DocId>,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            namespace: namespace.into(),
            representation: representation.into(),
            loader: None,
            name: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = Some(loader.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }
}
