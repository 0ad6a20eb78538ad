//! Data models for published documents and host containers.
//!
//! Field names follow the document store's JSON shape so records can be
//! deserialized directly from store payloads and host dumps.

mod container;
mod documents;

pub use container::*;
pub use documents::*;
