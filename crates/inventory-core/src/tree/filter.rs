//! Read-time row filtering and sort keys.
//!
//! Filters never change the tree; they decide which rows a view shows.
//! A group row stays visible when any of its descendants matches.

use regex::{Regex, RegexBuilder};

use super::node::{NodeId, Tree};
use crate::error::{InventoryError, Result};
use crate::inventory::VersionStatus;

/// What the filter needs to know about a row.
pub trait FilterRow {
    /// Text matched by the text filter.
    fn label(&self) -> &str;

    /// Loaded and highest version, empty when the row has none.
    fn version_status(&self) -> VersionStatus {
        VersionStatus::default()
    }

    /// Whether the row heads a group of loaded items.
    fn is_group_header(&self) -> bool {
        false
    }
}

/// Case-insensitive text filter.
#[derive(Debug, Clone)]
pub struct TextFilter {
    pattern: String,
    regex: Regex,
}

impl TextFilter {
    /// Match user text literally.
    pub fn literal(text: &str) -> Result<Self> {
        Self::build(text, &regex::escape(text))
    }

    /// Match a raw regular expression.
    pub fn regex(pattern: &str) -> Result<Self> {
        Self::build(pattern, pattern)
    }

    fn build(pattern: &str, source: &str) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| InventoryError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Combined text and outdated-only filter.
#[derive(Debug, Clone, Default)]
pub struct TreeFilter {
    text: Option<TextFilter>,
    outdated_only: bool,
    hierarchy_view: bool,
}

impl TreeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: Option<TextFilter>) -> Self {
        self.text = text;
        self
    }

    pub fn with_outdated_only(mut self, outdated_only: bool) -> Self {
        self.outdated_only = outdated_only;
        self
    }

    pub fn with_hierarchy_view(mut self, hierarchy_view: bool) -> Self {
        self.hierarchy_view = hierarchy_view;
        self
    }

    /// Set the text filter from user input; empty text clears it.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.text = if text.is_empty() {
            None
        } else {
            Some(TextFilter::literal(text)?)
        };
        Ok(())
    }

    /// Set the text filter from a regular expression; empty clears it.
    ///
    /// An invalid pattern leaves the current filter untouched.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<()> {
        self.text = if pattern.is_empty() {
            None
        } else {
            Some(TextFilter::regex(pattern)?)
        };
        Ok(())
    }

    pub fn set_outdated_only(&mut self, outdated_only: bool) {
        self.outdated_only = outdated_only;
    }

    pub fn set_hierarchy_view(&mut self, hierarchy_view: bool) {
        self.hierarchy_view = hierarchy_view;
    }

    pub fn text(&self) -> Option<&TextFilter> {
        self.text.as_ref()
    }

    pub fn outdated_only(&self) -> bool {
        self.outdated_only
    }

    pub fn hierarchy_view(&self) -> bool {
        self.hierarchy_view
    }

    pub fn is_active(&self) -> bool {
        self.text.is_some() || self.outdated_only
    }

    /// Whether the view shows `node` (given its parent is shown).
    ///
    /// Rows without children are always accepted; their visibility follows
    /// from their parent's acceptance.
    pub fn accepts<T: FilterRow>(&self, tree: &Tree<T>, node: NodeId) -> bool {
        if tree.row_count(node) == 0 {
            return true;
        }
        if !self.matches(tree, node) {
            return false;
        }
        if self.outdated_only && !self.accepts_outdated(tree, node) {
            return false;
        }
        true
    }

    /// Whether `node` or any of its descendants matches the text filter.
    pub fn matches<T: FilterRow>(&self, tree: &Tree<T>, node: NodeId) -> bool {
        let Some(text) = &self.text else {
            return true;
        };
        let label_matches = |n: NodeId| tree.get(n).map_or(false, |row| text.is_match(row.label()));
        label_matches(node) || tree.descendants(node).into_iter().any(label_matches)
    }

    fn accepts_outdated<T: FilterRow>(&self, tree: &Tree<T>, node: NodeId) -> bool {
        // Flat mode filters whole groups; their children follow the header.
        if !self.hierarchy_view && !tree.is_top_level(node) && node != tree.root() {
            return true;
        }

        let outdated = |n: NodeId| match tree.get(n) {
            Some(row) => {
                let status = row.version_status();
                status.is_empty() || status.is_outdated()
            }
            None => true,
        };
        if outdated(node) {
            return true;
        }

        self.hierarchy_view
            && tree.descendants(node).into_iter().any(|n| {
                tree.get(n).map_or(false, FilterRow::is_group_header) && outdated(n)
            })
    }

    /// Nodes a view would show, in depth-first order.
    pub fn visible<T: FilterRow>(&self, tree: &Tree<T>) -> Vec<NodeId> {
        let mut output = Vec::new();
        let mut stack: Vec<NodeId> = tree.children(tree.root()).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if !self.accepts(tree, node) {
                continue;
            }
            output.push(node);
            stack.extend(tree.children(node).iter().rev().copied());
        }
        output
    }
}

/// Sort position of a loader row relative to rows of other kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortRank {
    Group,
    Merged,
    Item,
}

/// Sort key that keeps group rows on top in either direction.
///
/// Ascending order prefixes groups with "0", merged rows with "1" and
/// plain rows with "2"; descending order reverses the prefixes, so sorting
/// keys in descending order still lists groups first.
pub fn sort_key(rank: SortRank, value: &str, descending: bool) -> String {
    let prefix = match (rank, descending) {
        (SortRank::Group, false) | (SortRank::Item, true) => '0',
        (SortRank::Merged, _) => '1',
        (SortRank::Group, true) | (SortRank::Item, false) => '2',
    };
    format!("{}{}", prefix, value)
}
