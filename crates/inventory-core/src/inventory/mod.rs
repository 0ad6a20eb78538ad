//! Scene inventory aggregation.
//!
//! A refresh resolves each loaded container's representation to its
//! version, subset and asset, compares the loaded version with the highest
//! published one, optionally rolls up site availability, and groups the
//! containers by representation into an [`InventoryModel`].

mod aggregate;
mod group;
mod model;
mod resolver;
mod row;
mod versions;

pub use aggregate::{Aggregation, StoreAggregation};
pub use group::{group_containers, ContainerGroup, GroupInfo, GroupState, GroupStates};
pub use model::{build_inventory, InventoryModel, RowSnapshot};
pub use resolver::{DocumentResolver, MissingLink, Resolution, ResolvedChain};
pub use row::{Column, InventoryRow, RowKind};
pub use versions::{VersionAggregator, VersionStatus};
