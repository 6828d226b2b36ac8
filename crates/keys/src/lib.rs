//! Minimal identifying keys for attribute records
//!
//! Integer ids inside arrays are not stable across machines or projects.
//! To map them back to entities, each id is described by a handful of
//! attributes. This crate picks a small set of attributes that tells every
//! record apart:
//!
//! - `greedy_set_cover`: the selector (greedy heuristic, not guaranteed minimal)
//! - `as_unique_attributes`: selector plus projection of each record onto
//!   the chosen fields, `id`, and any caller-mandated fields

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod selector;
pub mod unique;

pub use error::{KeyError, KeyResult};
pub use selector::{greedy_set_cover, AttributeRecord, ID_FIELD};
pub use unique::{as_unique_attributes, UniqueAttributes};
