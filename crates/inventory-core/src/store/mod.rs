//! Document store abstraction.
//!
//! Provides the read-side interface the aggregation engine queries:
//! - `MemoryStore` for documents already held by the host process
//! - `SqliteStore` for a local document database

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::DocumentStore;
