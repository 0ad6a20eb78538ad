//! Loader subsets browser: last versions of the subsets of selected assets.

mod fetch;
mod model;

pub use fetch::{fetch_subsets, LastVersion, SubsetsPayload};
pub use model::{
    format_number, LoaderColumn, SubsetRow, SubsetRowKind, SubsetsModel, VersionFields,
};
