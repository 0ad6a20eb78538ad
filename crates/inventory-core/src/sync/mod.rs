//! Site sync availability.
//!
//! Availability is only computed when the project has site sync enabled;
//! see [`SiteSyncConfig`](crate::config::SiteSyncConfig).

mod availability;

pub use availability::{
    file_progress, group_availability, representation_availability, version_availability,
    GroupAvailability, SiteAvailability, VersionAvailability,
};
pub use crate::config::{SiteSyncConfig, SyncSites};
